use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use indexmap::IndexMap;
use log::debug;

use crate::core::automaton::{StateId, TokenTag};
use crate::core::nfa::Nfa;
use crate::errors::CompileError;

/// Deterministic finite automaton produced by subset construction.
///
/// State ids are dense `0..n`, with the start always 0. Transition cells
/// hold [`None`] for the implicit dead state.
#[derive(Debug, Clone)]
pub struct Dfa {
    /// All DFA state identifiers, ascending.
    pub states: Vec<StateId>,
    /// Start state identifier.
    pub start: StateId,
    /// Winning rule tag per accepting state.
    pub accepts: BTreeMap<StateId, TokenTag>,
    /// Transition table indexed by state then alphabet symbol.
    pub trans: Vec<Vec<Option<StateId>>>,
    /// Sorted symbols labelling the columns of `trans`.
    pub alphabet: Vec<char>,
}

impl Dfa {
    /// Returns the tag of a state, or [`None`] when it is not accepting.
    #[must_use]
    pub fn tag(&self, state: StateId) -> Option<&TokenTag> {
        self.accepts.get(&state)
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        for (state, tag) in &self.accepts {
            writeln!(f, "accept: {state} ({})", tag.name)?;
        }
        for (state, row) in self.trans.iter().enumerate() {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(next) = cell {
                    writeln!(f, "  {state} --{}--> {next}", self.alphabet[idx])?;
                }
            }
        }
        Ok(())
    }
}

/// Determinizes an NFA via the classical subset construction.
///
/// # Errors
///
/// Returns [`CompileError::OutOfBudget`] when more than `max_states` DFA
/// states would be created.
pub fn determinize(nfa: &Nfa, max_states: usize) -> Result<Dfa, CompileError> {
    Determinizer::new(nfa, max_states).run()
}

/// Worklist-driven subset construction.
///
/// Subsets are canonicalized as sorted id vectors and used directly as map
/// keys, so distinct state sets can never collide.
struct Determinizer<'a> {
    /// The underlying NFA being determinized.
    nfa: &'a Nfa,
    /// The alphabet of symbols used in the NFA.
    alphabet: Vec<char>,
    /// Mapping from canonical NFA state subsets to DFA state ids.
    map: IndexMap<Vec<StateId>, StateId>,
    /// Queue of NFA state subsets still to process.
    queue: VecDeque<Vec<StateId>>,
    /// Array of DFA transitions being built.
    transitions: Vec<Vec<Option<StateId>>>,
    /// Winning tag per accepting DFA state.
    accepts: BTreeMap<StateId, TokenTag>,
    /// Upper bound on the number of DFA states.
    max_states: usize,
}

impl<'a> Determinizer<'a> {
    fn new(nfa: &'a Nfa, max_states: usize) -> Self {
        let alphabet = nfa.alphabet();
        let mut determinizer = Self {
            nfa,
            alphabet,
            map: IndexMap::new(),
            queue: VecDeque::new(),
            transitions: Vec::new(),
            accepts: BTreeMap::new(),
            max_states,
        };

        let start_key = nfa.epsilon_closure(&[nfa.start]);
        determinizer.record_tag(0, &start_key);
        determinizer.map.insert(start_key.clone(), 0);
        determinizer.queue.push_back(start_key);
        determinizer
    }

    fn run(mut self) -> Result<Dfa, CompileError> {
        if self.max_states == 0 {
            return Err(CompileError::OutOfBudget { limit: 0 });
        }

        while let Some(key) = self.queue.pop_front() {
            let state_id = self.map[&key];
            self.ensure_capacity(state_id as usize + 1);

            for symbol_idx in 0..self.alphabet.len() {
                let symbol = self.alphabet[symbol_idx];
                let next = self.advance_subset(&key, symbol)?;
                self.transitions[state_id as usize][symbol_idx] = next;
            }
        }

        let states: Vec<StateId> = (0..self.map.len()).map(|i| i as StateId).collect();
        debug!(
            "subset construction: {} DFA states, {} accepting",
            states.len(),
            self.accepts.len()
        );
        Ok(Dfa {
            states,
            start: 0,
            accepts: self.accepts,
            trans: self.transitions,
            alphabet: self.alphabet,
        })
    }

    /// Ensures the transitions vector has at least `len` rows.
    fn ensure_capacity(&mut self, len: usize) {
        while self.transitions.len() < len {
            self.transitions.push(vec![None; self.alphabet.len()]);
        }
    }

    /// Computes the DFA successor of a subset under one input symbol.
    ///
    /// An empty move yields no transition rather than an explicit dead
    /// state.
    fn advance_subset(
        &mut self,
        subset: &[StateId],
        symbol: char,
    ) -> Result<Option<StateId>, CompileError> {
        let moved = self.nfa.move_on(subset, symbol);
        if moved.is_empty() {
            return Ok(None);
        }

        let closure = self.nfa.epsilon_closure(&moved);
        self.lookup_or_insert(closure).map(Some)
    }

    /// Looks up a canonical subset, assigning the next dense DFA id and
    /// enqueueing it when unseen.
    fn lookup_or_insert(&mut self, subset: Vec<StateId>) -> Result<StateId, CompileError> {
        if let Some(id) = self.map.get(&subset) {
            return Ok(*id);
        }
        if self.map.len() >= self.max_states {
            return Err(CompileError::OutOfBudget {
                limit: self.max_states,
            });
        }
        let new_id = self.map.len() as StateId;
        self.record_tag(new_id, &subset);
        self.map.insert(subset.clone(), new_id);
        self.queue.push_back(subset);
        Ok(new_id)
    }

    /// Stores the winning tag for a DFA state built from `subset`.
    ///
    /// Among the tags of all NFA accept states in the subset, the smallest
    /// priority wins; ties go to the rule submitted earliest.
    fn record_tag(&mut self, id: StateId, subset: &[StateId]) {
        let mut best: Option<&TokenTag> = None;
        for state in subset {
            let Some(tag) = self.nfa.accepts.get(state) else {
                continue;
            };
            match best {
                Some(current) if !tag.beats(current) => {}
                _ => best = Some(tag),
            }
        }
        if let Some(tag) = best {
            self.accepts.insert(id, tag.clone());
        }
    }
}
