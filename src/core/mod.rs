pub mod ast;
pub mod automaton;
pub mod dfa;
pub mod lexer;
pub mod min;
pub mod nfa;
pub mod parser;
pub mod tables;

use std::collections::HashSet;

use log::{debug, warn};

use self::automaton::TokenTag;
use self::dfa::Dfa;
use self::nfa::{Nfa, NfaBuilder};
use self::tables::Tables;
use crate::config::Rule;
use crate::errors::CompileError;

/// Tunables for one compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Fail instead of warning when no rule references any input symbol.
    pub strict: bool,
    /// Upper bound on DFA states during determinization.
    pub max_states: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_states: 10_000,
        }
    }
}

/// Aggregates every intermediate product of one compilation, so callers can
/// inspect each stage of the pipeline.
#[derive(Debug, Clone)]
pub struct CompileArtifacts {
    /// The unified nondeterministic automaton over all rules.
    pub nfa: Nfa,
    /// The determinized automaton before minimization.
    pub dfa: Dfa,
    /// The minimized automaton the tables are compacted from.
    pub min_dfa: Dfa,
    /// The emitted scanner tables.
    pub tables: Tables,
}

/// Compiles a rule list into scanner tables with default options.
///
/// The caller submits rules sorted by priority ascending (see
/// [`Config::from_yaml`](crate::config::Config::from_yaml)); rule order
/// breaks priority ties.
///
/// # Errors
///
/// Returns a [`CompileError`] as described in [`compile_artifacts`].
pub fn compile(rules: &[Rule]) -> Result<Tables, CompileError> {
    compile_with(rules, &CompileOptions::default())
}

/// Compiles a rule list into scanner tables.
///
/// # Errors
///
/// Returns a [`CompileError`] as described in [`compile_artifacts`].
pub fn compile_with(rules: &[Rule], options: &CompileOptions) -> Result<Tables, CompileError> {
    Ok(compile_artifacts(rules, options)?.tables)
}

/// Runs the full pipeline and returns every intermediate product.
///
/// # Errors
///
/// - [`CompileError::DuplicateRuleName`] when two rules share a name.
/// - [`CompileError::RegexParse`] when a pattern does not lex or parse.
/// - [`CompileError::UnsupportedOp`] for constructs the back end rejects.
/// - [`CompileError::EmptyAlphabet`] in strict mode when no rule
///   references any input symbol.
/// - [`CompileError::OutOfBudget`] when determinization exceeds
///   `options.max_states` states.
pub fn compile_artifacts(
    rules: &[Rule],
    options: &CompileOptions,
) -> Result<CompileArtifacts, CompileError> {
    check_rule_names(rules)?;

    let mut builder = NfaBuilder::new();
    let mut tagged = Vec::with_capacity(rules.len());
    for (order, rule) in rules.iter().enumerate() {
        let ast = parse_pattern(rule)?;
        let fragment = builder.compile_rule(&rule.name, &ast)?;
        tagged.push((fragment, TokenTag::new(rule.name.clone(), rule.priority, order)));
    }
    let nfa = builder.unify(tagged);
    debug!("unified NFA: {} states", nfa.state_count());

    if nfa.alphabet().is_empty() {
        if options.strict {
            return Err(CompileError::EmptyAlphabet);
        }
        warn!("no rule references any input symbol; emitting degenerate tables");
    }

    let dfa = dfa::determinize(&nfa, options.max_states)?;
    let min_dfa = min::minimize(&dfa);
    let tables = tables::compact(&min_dfa);

    Ok(CompileArtifacts {
        nfa,
        dfa,
        min_dfa,
        tables,
    })
}

/// Parses one rule's pattern to a syntax tree, naming the rule on failure.
fn parse_pattern(rule: &Rule) -> Result<ast::Ast, CompileError> {
    lexer::tokenize(&rule.pattern)
        .and_then(|tokens| parser::parse(&tokens))
        .map_err(|source| CompileError::RegexParse {
            rule: rule.name.clone(),
            source,
        })
}

fn check_rule_names(rules: &[Rule]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            return Err(CompileError::DuplicateRuleName {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}
