use lexgen::errors::CompileError;
use lexgen::{CompileOptions, Config, Rule, compile, compile_with};

#[test]
fn test_yaml_to_tables_end_to_end() {
    let yaml = r#"
tokens:
  - name: ID
    pattern: "[a-z]+"
    priority: 2
  - name: IF
    pattern: "if"
    priority: 1
"#;
    let rules = Config::from_yaml(yaml).unwrap();
    assert_eq!(rules[0].name, "IF", "config sorts by priority ascending");

    let tables = compile(&rules).unwrap();
    let json = tables.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    // 26 letters referenced, but only `i`, `f`, and the rest-of-alphabet
    // behave distinctly.
    assert_eq!(value["classifierTable"].as_object().unwrap().len(), 26);
    let classes: std::collections::BTreeSet<u64> = value["classifierTable"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(classes.len(), 3);

    let names: Vec<&str> = value["tokenTypeTable"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(names.contains(&"IF"));
    assert!(names.contains(&"ID"));
}

#[test]
fn test_priority_disambiguation_survives_the_whole_pipeline() {
    let rules = vec![Rule::new("IF", "if", 1), Rule::new("ID", "[a-z]+", 2)];
    let tables = compile(&rules).unwrap();

    // Drive the emitted tables directly, the way a scanner would.
    let classify = |ch: char| tables.classifier.get(&ch).copied();
    let run = |input: &str| -> Option<&str> {
        let mut row = 0i32;
        for ch in input.chars() {
            let class = classify(ch)?;
            row = tables.transitions[row as usize][class as usize];
            if row < 0 {
                return None;
            }
        }
        tables.token_types.get(&(row as u32)).map(String::as_str)
    };

    assert_eq!(run("if"), Some("IF"), "priority 1 beats priority 2");
    assert_eq!(run("i"), Some("ID"));
    assert_eq!(run("iffy"), Some("ID"));
    assert_eq!(run("zebra"), Some("ID"));
    assert_eq!(run("if2"), None, "digit is outside every rule's alphabet");
}

#[test]
fn test_duplicate_rule_names_are_rejected() {
    let rules = vec![Rule::new("TOK", "a", 1), Rule::new("TOK", "b", 2)];
    let err = compile(&rules).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateRuleName { name } if name == "TOK"));
}

#[test]
fn test_wildcard_pattern_is_unsupported() {
    let rules = vec![Rule::new("ANY", "a.c", 1)];
    let err = compile(&rules).unwrap_err();
    match err {
        CompileError::UnsupportedOp { rule, op } => {
            assert_eq!(rule, "ANY");
            assert_eq!(op, ".");
        }
        other => panic!("expected UnsupportedOp, got {other:?}"),
    }
}

#[test]
fn test_malformed_pattern_names_its_rule() {
    let rules = vec![Rule::new("OK", "ab", 1), Rule::new("BAD", "x|", 2)];
    let err = compile(&rules).unwrap_err();
    match err {
        CompileError::RegexParse { rule, .. } => assert_eq!(rule, "BAD"),
        other => panic!("expected RegexParse, got {other:?}"),
    }
}

#[test]
fn test_strict_mode_rejects_empty_alphabet() {
    let rules = vec![Rule::new("E", "", 1)];
    let options = CompileOptions {
        strict: true,
        ..CompileOptions::default()
    };
    assert!(matches!(
        compile_with(&rules, &options).unwrap_err(),
        CompileError::EmptyAlphabet
    ));
}

#[test]
fn test_lenient_mode_emits_degenerate_tables() {
    let rules = vec![Rule::new("E", "", 1)];
    let tables = compile(&rules).unwrap();
    assert!(tables.classifier.is_empty());
    assert_eq!(tables.transitions, vec![Vec::<i32>::new()]);
    assert_eq!(tables.token_types.get(&0).map(String::as_str), Some("E"));
}

#[test]
fn test_tight_state_budget_fails() {
    let rules = vec![Rule::new("ID", "[a-z]+", 1)];
    let options = CompileOptions {
        max_states: 1,
        ..CompileOptions::default()
    };
    assert!(matches!(
        compile_with(&rules, &options).unwrap_err(),
        CompileError::OutOfBudget { limit: 1 }
    ));
}
