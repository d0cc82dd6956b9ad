use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::core::dfa::Dfa;

/// The three tables driving a table-based scanner.
///
/// Serialization produces the JSON document consumed at scan time:
/// `classifierTable` keys are code points in character form, and
/// `tokenTypeTable` keys are accepting row indices. Row 0 is always the
/// start state, so no separate field is emitted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tables {
    /// Symbol to equivalence-class id. Symbols absent from the map belong
    /// to the reject class.
    #[serde(rename = "classifierTable")]
    pub classifier: BTreeMap<char, u32>,
    /// Row-major `states x classes` matrix; `-1` denotes rejection.
    #[serde(rename = "transitionTable")]
    pub transitions: Vec<Vec<i32>>,
    /// Token name per accepting state row index.
    #[serde(rename = "tokenTypeTable")]
    pub token_types: BTreeMap<u32, String>,
}

impl Tables {
    /// Renders the tables as a pretty-printed JSON document.
    ///
    /// The output is byte-stable for a given input: every map is ordered.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] on serialization
    /// failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Compacts a minimized DFA into its scanner tables.
///
/// Two symbols land in the same equivalence class exactly when they induce
/// identical transition columns over every state; the transition matrix
/// then stores one column per class instead of one per symbol.
#[must_use]
pub fn compact(dfa: &Dfa) -> Tables {
    // Group symbols by their transition column, assigning dense class ids
    // in first-seen order over the sorted alphabet.
    let mut classes: IndexMap<Vec<i32>, u32> = IndexMap::new();
    let mut classifier = BTreeMap::new();
    for (symbol_idx, &symbol) in dfa.alphabet.iter().enumerate() {
        let column: Vec<i32> = dfa
            .states
            .iter()
            .map(|&state| {
                dfa.trans[state as usize][symbol_idx].map_or(-1, |next| next as i32)
            })
            .collect();
        let next_class = classes.len() as u32;
        let class = *classes.entry(column).or_insert(next_class);
        classifier.insert(symbol, class);
    }

    let mut transitions = vec![vec![-1; classes.len()]; dfa.states.len()];
    for (column, &class) in &classes {
        for (row, &cell) in column.iter().enumerate() {
            transitions[row][class as usize] = cell;
        }
    }

    let token_types: BTreeMap<u32, String> = dfa
        .accepts
        .iter()
        .map(|(&state, tag)| (state, tag.name.clone()))
        .collect();

    debug!(
        "compaction: {} symbols in {} classes over {} states",
        classifier.len(),
        classes.len(),
        dfa.states.len()
    );
    Tables {
        classifier,
        transitions,
        token_types,
    }
}
