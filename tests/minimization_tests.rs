use lexgen::core::automaton::TokenTag;
use lexgen::core::dfa::{self, Dfa};
use lexgen::core::min::minimize;
use lexgen::core::nfa::NfaBuilder;
use lexgen::core::{lexer, parser};

fn build_dfa(rules: &[(&str, &str, i32)]) -> Dfa {
    let mut builder = NfaBuilder::new();
    let mut tagged = Vec::new();
    for (order, (name, pattern, priority)) in rules.iter().enumerate() {
        let tokens = lexer::tokenize(pattern).unwrap();
        let ast = parser::parse(&tokens).unwrap();
        let fragment = builder.compile_rule(name, &ast).unwrap();
        tagged.push((fragment, TokenTag::new(*name, *priority, order)));
    }
    dfa::determinize(&builder.unify(tagged), 10_000).unwrap()
}

fn run_dfa<'a>(dfa: &'a Dfa, input: &str) -> Option<&'a str> {
    let mut state = dfa.start;
    for ch in input.chars() {
        let idx = dfa.alphabet.iter().position(|&c| c == ch)?;
        state = dfa.trans[state as usize][idx]?;
    }
    dfa.tag(state).map(|tag| tag.name.as_str())
}

/// Every string over `alphabet` (plus one symbol outside it) up to `max_len`
/// characters.
fn all_strings(alphabet: &[char], max_len: usize) -> Vec<String> {
    let mut symbols = alphabet.to_vec();
    symbols.push('\u{7f}');
    let mut out = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for &ch in &symbols {
                let mut s = prefix.clone();
                s.push(ch);
                next.push(s);
            }
        }
        out.extend(next.iter().cloned());
        frontier = next;
    }
    out
}

/// Checks that minimization preserves both the accepted language and the
/// reported token on every string up to length 6.
fn assert_language_preserved(rules: &[(&str, &str, i32)]) {
    let dfa = build_dfa(rules);
    let min = minimize(&dfa);
    assert!(
        min.states.len() <= dfa.states.len(),
        "minimization must not add states"
    );
    for input in all_strings(&dfa.alphabet, 6) {
        assert_eq!(
            run_dfa(&dfa, &input),
            run_dfa(&min, &input),
            "language differs on {input:?}"
        );
    }
}

#[test]
fn test_language_preserved_single_literal() {
    assert_language_preserved(&[("IF", "if", 1)]);
}

#[test]
fn test_language_preserved_alternation() {
    assert_language_preserved(&[("T", "fee|fie", 1)]);
}

#[test]
fn test_language_preserved_star_and_plus() {
    assert_language_preserved(&[("AB", "a*b+", 1)]);
}

#[test]
fn test_language_preserved_multi_rule() {
    assert_language_preserved(&[("IF", "if", 1), ("ID", "[a-d]+", 2), ("WS", " +", 3)]);
}

#[test]
fn test_language_preserved_optional() {
    assert_language_preserved(&[("SIGNED", "-?[0-3]+", 1)]);
}

#[test]
fn test_alternation_shares_prefix_and_tail() {
    let min = minimize(&build_dfa(&[("T", "fee|fie", 1)]));
    assert_eq!(
        min.states.len(),
        4,
        "fee|fie should share the f prefix and the e tail"
    );
}

#[test]
fn test_star_concat_minimizes_to_two_states() {
    let min = minimize(&build_dfa(&[("AB", "a*b", 1)]));
    assert_eq!(min.states.len(), 2);
    assert_eq!(min.start, 0);
    assert!(min.tag(0).is_none(), "start must not accept");
    assert_eq!(min.tag(1).map(|t| t.name.as_str()), Some("AB"));
}

#[test]
fn test_distinct_token_names_never_merge() {
    // Both accept states are terminal sinks with identical behavior; only
    // the name-aware initial partition keeps them apart.
    let min = minimize(&build_dfa(&[("A", "a", 1), ("B", "b", 2)]));
    assert_eq!(run_dfa(&min, "a"), Some("A"));
    assert_eq!(run_dfa(&min, "b"), Some("B"));
    assert_eq!(
        min.accepts.len(),
        2,
        "accepting states of different tokens must stay distinct"
    );
}

#[test]
fn test_same_token_sinks_do_merge() {
    // a|b under a single rule: the two accepting subsets collapse.
    let min = minimize(&build_dfa(&[("AB", "a|b", 1)]));
    assert_eq!(min.accepts.len(), 1, "same-token sinks should merge");
    assert_eq!(run_dfa(&min, "a"), Some("AB"));
    assert_eq!(run_dfa(&min, "b"), Some("AB"));
}

#[test]
fn test_minimization_is_idempotent() {
    let min = minimize(&build_dfa(&[("T", "(a|b)*abb", 1)]));
    let again = minimize(&min);
    assert_eq!(again.states.len(), min.states.len());
    assert_eq!(again.trans, min.trans);
    assert_eq!(again.accepts, min.accepts);
}

#[test]
fn test_no_accepting_states_is_legal() {
    use std::collections::BTreeMap;

    let dfa = Dfa {
        states: vec![0, 1],
        start: 0,
        accepts: BTreeMap::new(),
        trans: vec![vec![Some(1)], vec![None]],
        alphabet: vec!['a'],
    };
    let min = minimize(&dfa);
    assert!(min.accepts.is_empty(), "nothing to accept after minimizing");
    assert_eq!(run_dfa(&min, ""), None);
    assert_eq!(run_dfa(&min, "a"), None);
}
