use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use log::trace;

use crate::core::ast::{Ast, CharRange, Repeat};
use crate::core::automaton::{EdgeLabel, IdAlloc, StateId, TokenTag, Transition};
use crate::errors::CompileError;

/// A Thompson fragment: a sub-automaton with a single start state and a
/// single accept state.
///
/// The accept state never has outgoing transitions, so combinators can fuse
/// fragments by wiring new ε-edges without rewriting existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// Entry state of the fragment.
    pub start: StateId,
    /// Exit state of the fragment.
    pub accept: StateId,
}

/// Builds Thompson fragments for every rule of one compilation.
///
/// All fragments share one [`IdAlloc`] and one edge map, so their state ids
/// are disjoint by construction and combinators merge edges for free.
#[derive(Debug, Default)]
pub struct NfaBuilder {
    alloc: IdAlloc,
    adjacency: Vec<Vec<Transition>>,
}

impl NfaBuilder {
    /// Creates an empty builder with a fresh id allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new, empty state with no outgoing or incoming transitions.
    fn new_state(&mut self) -> StateId {
        let id = self.alloc.next();
        debug_assert_eq!(id as usize, self.adjacency.len());
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds an edge `from -> to` with the given label.
    fn add_edge(&mut self, from: StateId, to: StateId, label: EdgeLabel) {
        self.adjacency[from as usize].push(Transition { to, label });
    }

    /// Builds the fragment matching only the empty string: `s -ε-> a`.
    fn empty(&mut self) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, accept, EdgeLabel::Eps);
        Fragment { start, accept }
    }

    /// Builds the fragment for a single literal character: `s -c-> a`.
    fn literal(&mut self, ch: char) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, accept, EdgeLabel::Sym(ch));
        Fragment { start, accept }
    }

    /// Builds the fragment for a character class: one parallel edge from
    /// `s` to `a` per code point in the given ranges.
    fn char_class(&mut self, ranges: &[CharRange]) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        for &(lo, hi) in ranges {
            for ch in lo..=hi {
                self.add_edge(start, accept, EdgeLabel::Sym(ch));
            }
        }
        Fragment { start, accept }
    }

    /// Joins two fragments in sequence via `lhs.accept -ε-> rhs.start`.
    fn concat(&mut self, lhs: Fragment, rhs: Fragment) -> Fragment {
        self.add_edge(lhs.accept, rhs.start, EdgeLabel::Eps);
        Fragment {
            start: lhs.start,
            accept: rhs.accept,
        }
    }

    /// Joins two fragments as alternatives under a fresh start and accept.
    fn alternate(&mut self, lhs: Fragment, rhs: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, lhs.start, EdgeLabel::Eps);
        self.add_edge(start, rhs.start, EdgeLabel::Eps);
        self.add_edge(lhs.accept, accept, EdgeLabel::Eps);
        self.add_edge(rhs.accept, accept, EdgeLabel::Eps);
        Fragment { start, accept }
    }

    /// Wraps a fragment in zero-or-more repetition.
    fn star(&mut self, inner: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, inner.start, EdgeLabel::Eps);
        self.add_edge(start, accept, EdgeLabel::Eps);
        self.add_edge(inner.accept, inner.start, EdgeLabel::Eps);
        self.add_edge(inner.accept, accept, EdgeLabel::Eps);
        Fragment { start, accept }
    }

    /// Wraps a fragment in one-or-more repetition. The missing start-to-
    /// accept bypass is what forces at least one iteration.
    fn plus(&mut self, inner: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, inner.start, EdgeLabel::Eps);
        self.add_edge(inner.accept, inner.start, EdgeLabel::Eps);
        self.add_edge(inner.accept, accept, EdgeLabel::Eps);
        Fragment { start, accept }
    }

    /// Wraps a fragment so it may match zero or one time.
    fn optional(&mut self, inner: Fragment) -> Fragment {
        let start = self.new_state();
        let accept = self.new_state();
        self.add_edge(start, accept, EdgeLabel::Eps);
        self.add_edge(start, inner.start, EdgeLabel::Eps);
        self.add_edge(inner.accept, accept, EdgeLabel::Eps);
        Fragment { start, accept }
    }

    /// Compiles one rule's syntax tree into a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnsupportedOp`] when the tree contains a
    /// construct the table back end cannot express, such as the `.`
    /// wildcard, whose alphabet is not finite.
    pub fn compile_rule(&mut self, rule: &str, ast: &Ast) -> Result<Fragment, CompileError> {
        match ast {
            Ast::Empty => Ok(self.empty()),
            Ast::Lit(c) => Ok(self.literal(*c)),
            Ast::Class(ranges) => Ok(self.char_class(ranges)),
            Ast::Any => Err(CompileError::UnsupportedOp {
                rule: rule.to_string(),
                op: ".",
            }),
            Ast::Seq(parts) => {
                let mut acc: Option<Fragment> = None;
                for part in parts {
                    let frag = self.compile_rule(rule, part)?;
                    acc = Some(match acc {
                        Some(prev) => self.concat(prev, frag),
                        None => frag,
                    });
                }
                match acc {
                    Some(fragment) => Ok(fragment),
                    None => Ok(self.empty()),
                }
            }
            Ast::Branch(branches) => {
                let mut acc: Option<Fragment> = None;
                for branch in branches {
                    let frag = self.compile_rule(rule, branch)?;
                    acc = Some(match acc {
                        Some(prev) => self.alternate(prev, frag),
                        None => frag,
                    });
                }
                match acc {
                    Some(fragment) => Ok(fragment),
                    None => Ok(self.empty()),
                }
            }
            Ast::Repeat(inner, kind) => {
                let frag = self.compile_rule(rule, inner)?;
                Ok(match kind {
                    Repeat::ZeroOrMore => self.star(frag),
                    Repeat::OneOrMore => self.plus(frag),
                    Repeat::ZeroOrOne => self.optional(frag),
                })
            }
        }
    }

    /// Merges the rule fragments under a fresh common start state and
    /// finalizes the unified NFA.
    ///
    /// Every fragment accept state keeps its rule's tag; the unified start
    /// reaches each fragment through a single ε-edge.
    #[must_use]
    pub fn unify(mut self, rules: Vec<(Fragment, TokenTag)>) -> Nfa {
        let start = self.new_state();
        let mut accepts = IndexMap::new();
        for (fragment, tag) in rules {
            trace!(
                "rule `{}`: fragment {} -> {}",
                tag.name, fragment.start, fragment.accept
            );
            self.add_edge(start, fragment.start, EdgeLabel::Eps);
            accepts.insert(fragment.accept, tag);
        }
        Nfa {
            adjacency: self.adjacency,
            start,
            accepts,
        }
    }
}

/// The union of every rule fragment under one ε-start state.
#[derive(Debug, Clone)]
pub struct Nfa {
    /// Adjacency lists indexed by state id.
    pub adjacency: Vec<Vec<Transition>>,
    /// The shared start state.
    pub start: StateId,
    /// Accept state of each rule fragment, tagged with its rule, in rule
    /// submission order.
    pub accepts: IndexMap<StateId, TokenTag>,
}

impl Nfa {
    /// Returns the outgoing transitions of a state.
    #[must_use]
    pub fn transitions(&self, state: StateId) -> &[Transition] {
        &self.adjacency[state as usize]
    }

    /// Number of states in the automaton.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Computes the alphabet used in this NFA, sorted by character.
    ///
    /// Epsilon labels are not part of the alphabet.
    #[must_use]
    pub fn alphabet(&self) -> Vec<char> {
        let mut chars: HashSet<char> = HashSet::new();
        for row in &self.adjacency {
            for tr in row {
                if let EdgeLabel::Sym(c) = tr.label {
                    chars.insert(c);
                }
            }
        }
        let mut chars: Vec<char> = chars.into_iter().collect();
        chars.sort_unstable();
        chars
    }

    /// Computes the ε-closure of a set of states: the least superset closed
    /// under ε-successors, sorted ascending for canonicalization.
    #[must_use]
    pub fn epsilon_closure(&self, seed: &[StateId]) -> Vec<StateId> {
        let mut closure: HashSet<StateId> = seed.iter().copied().collect();
        let mut stack: Vec<StateId> = seed.to_vec();
        while let Some(state) = stack.pop() {
            for tr in self.transitions(state) {
                if tr.label == EdgeLabel::Eps && closure.insert(tr.to) {
                    stack.push(tr.to);
                }
            }
        }
        let mut closure: Vec<StateId> = closure.into_iter().collect();
        closure.sort_unstable();
        closure
    }

    /// Returns every state reachable from `states` by consuming `symbol`.
    #[must_use]
    pub fn move_on(&self, states: &[StateId], symbol: char) -> Vec<StateId> {
        let mut frontier = HashSet::new();
        for &state in states {
            for tr in self.transitions(state) {
                if tr.label == EdgeLabel::Sym(symbol) {
                    frontier.insert(tr.to);
                }
            }
        }
        let mut frontier: Vec<StateId> = frontier.into_iter().collect();
        frontier.sort_unstable();
        frontier
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        for (state, tag) in &self.accepts {
            writeln!(f, "accept: {state} ({})", tag.name)?;
        }
        for (from, row) in self.adjacency.iter().enumerate() {
            for tr in row {
                writeln!(f, "  {from} --{}--> {}", tr.label, tr.to)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{lexer, parser};

    fn compile_single(pattern: &str) -> Nfa {
        let tokens = lexer::tokenize(pattern).unwrap();
        let ast = parser::parse(&tokens).unwrap();
        let mut builder = NfaBuilder::new();
        let fragment = builder.compile_rule("T", &ast).unwrap();
        builder.unify(vec![(fragment, TokenTag::new("T", 1, 0))])
    }

    fn nfa_accepts(nfa: &Nfa, input: &str) -> bool {
        let mut current = nfa.epsilon_closure(&[nfa.start]);
        for ch in input.chars() {
            let moved = nfa.move_on(&current, ch);
            current = nfa.epsilon_closure(&moved);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|state| nfa.accepts.contains_key(state))
    }

    #[test]
    fn test_literal_chain() {
        let nfa = compile_single("if");
        assert!(nfa_accepts(&nfa, "if"));
        assert!(!nfa_accepts(&nfa, "i"));
        assert!(!nfa_accepts(&nfa, "iff"));
    }

    #[test]
    fn test_class_expands_ranges() {
        let nfa = compile_single("[a-c]");
        for ch in ["a", "b", "c"] {
            assert!(nfa_accepts(&nfa, ch), "class should accept {ch}");
        }
        assert!(!nfa_accepts(&nfa, "d"));
        assert_eq!(nfa.alphabet(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_star_accepts_zero_iterations() {
        let nfa = compile_single("a*");
        assert!(nfa_accepts(&nfa, ""));
        assert!(nfa_accepts(&nfa, "aaa"));
        assert!(!nfa_accepts(&nfa, "b"));
    }

    #[test]
    fn test_plus_requires_one_iteration() {
        let nfa = compile_single("a+");
        assert!(!nfa_accepts(&nfa, ""));
        assert!(nfa_accepts(&nfa, "a"));
        assert!(nfa_accepts(&nfa, "aa"));
    }

    #[test]
    fn test_optional_matches_zero_or_one() {
        let nfa = compile_single("a?");
        assert!(nfa_accepts(&nfa, ""));
        assert!(nfa_accepts(&nfa, "a"));
        assert!(!nfa_accepts(&nfa, "aa"));
    }

    #[test]
    fn test_empty_pattern_matches_empty_string_only() {
        let nfa = compile_single("");
        assert!(nfa_accepts(&nfa, ""));
        assert!(!nfa_accepts(&nfa, "a"));
        assert!(nfa.alphabet().is_empty());
    }

    #[test]
    fn test_wildcard_is_unsupported() {
        let tokens = lexer::tokenize("a.b").unwrap();
        let ast = parser::parse(&tokens).unwrap();
        let mut builder = NfaBuilder::new();
        let err = builder.compile_rule("T", &ast).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedOp { op: ".", .. }));
    }

    #[test]
    fn test_unified_state_ids_are_disjoint() {
        let mut builder = NfaBuilder::new();
        let a = {
            let tokens = lexer::tokenize("ab").unwrap();
            let ast = parser::parse(&tokens).unwrap();
            builder.compile_rule("A", &ast).unwrap()
        };
        let b = {
            let tokens = lexer::tokenize("cd").unwrap();
            let ast = parser::parse(&tokens).unwrap();
            builder.compile_rule("B", &ast).unwrap()
        };
        assert_ne!(a.start, b.start);
        assert_ne!(a.accept, b.accept);

        let nfa = builder.unify(vec![
            (a, TokenTag::new("A", 1, 0)),
            (b, TokenTag::new("B", 2, 1)),
        ]);
        assert_eq!(nfa.accepts.len(), 2);
        assert!(nfa_accepts(&nfa, "ab"));
        assert!(nfa_accepts(&nfa, "cd"));
        assert!(!nfa_accepts(&nfa, "ad"));
    }
}
