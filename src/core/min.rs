use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;

use crate::core::automaton::StateId;
use crate::core::dfa::Dfa;

/// Minimizes a DFA by partition refinement.
///
/// The initial partition separates accepting states by token name, not
/// merely accept-versus-reject: two states that announce different tokens
/// must never collapse, even when their outgoing behavior is identical.
#[must_use]
pub fn minimize(dfa: &Dfa) -> Dfa {
    if dfa.trans.len() <= 1 {
        return dfa.clone();
    }

    PartitionRefinement::new(dfa).run()
}

struct PartitionRefinement<'a> {
    /// The DFA being minimized.
    dfa: &'a Dfa,
    /// Current blocks of indistinguishable states. Each block is kept in
    /// ascending state order.
    blocks: Vec<Vec<StateId>>,
    /// Mapping from state to the index of its block in `blocks`.
    state_block: Vec<usize>,
}

impl<'a> PartitionRefinement<'a> {
    fn new(dfa: &'a Dfa) -> Self {
        // One initial block per distinct token name plus one for the
        // non-accepting states, omitted when empty.
        let mut by_name: IndexMap<Option<&str>, Vec<StateId>> = IndexMap::new();
        for state in 0..dfa.trans.len() as StateId {
            let name = dfa.tag(state).map(|tag| tag.name.as_str());
            by_name.entry(name).or_default().push(state);
        }
        let blocks: Vec<Vec<StateId>> = by_name.into_values().collect();

        let mut refinement = Self {
            dfa,
            blocks,
            state_block: vec![0; dfa.trans.len()],
        };
        refinement.rebuild_index();
        refinement
    }

    fn run(mut self) -> Dfa {
        while self.refine_once() {}
        debug!(
            "minimization: {} states -> {} blocks",
            self.dfa.trans.len(),
            self.blocks.len()
        );
        self.rebuild()
    }

    /// Performs one refinement pass, splitting every block whose members
    /// disagree on some successor block. Returns whether anything split.
    fn refine_once(&mut self) -> bool {
        let mut next_blocks = Vec::with_capacity(self.blocks.len());
        let mut changed = false;

        for block in &self.blocks {
            if block.len() == 1 {
                next_blocks.push(block.clone());
                continue;
            }
            let mut groups: IndexMap<Vec<Option<usize>>, Vec<StateId>> = IndexMap::new();
            for &state in block {
                groups.entry(self.signature(state)).or_default().push(state);
            }
            if groups.len() > 1 {
                changed = true;
            }
            next_blocks.extend(groups.into_values());
        }

        if changed {
            self.blocks = next_blocks;
            self.rebuild_index();
        }
        changed
    }

    /// The per-symbol successor blocks of a state. A missing transition
    /// participates as [`None`], so states with and without a successor on
    /// the same symbol always split apart.
    fn signature(&self, state: StateId) -> Vec<Option<usize>> {
        self.dfa.trans[state as usize]
            .iter()
            .map(|next| next.map(|dst| self.state_block[dst as usize]))
            .collect()
    }

    fn rebuild_index(&mut self) {
        for (block_idx, block) in self.blocks.iter().enumerate() {
            for &state in block {
                self.state_block[state as usize] = block_idx;
            }
        }
    }

    /// Renumbers the final blocks densely and rebuilds the DFA over them.
    ///
    /// Blocks are ordered by smallest member; the determinizer always hands
    /// us start id 0, so the start's block becomes state 0 and the emitted
    /// table keeps its start at row 0.
    fn rebuild(mut self) -> Dfa {
        self.blocks.sort_by_key(|block| block[0]);
        self.rebuild_index();

        let mut trans = Vec::with_capacity(self.blocks.len());
        let mut accepts = BTreeMap::new();
        for (block_idx, block) in self.blocks.iter().enumerate() {
            // Any member works as representative: after refinement the
            // whole block agrees on successor blocks and on the tag.
            let repr = block[0];
            let row: Vec<Option<StateId>> = self.dfa.trans[repr as usize]
                .iter()
                .map(|next| next.map(|dst| self.state_block[dst as usize] as StateId))
                .collect();
            trans.push(row);
            if let Some(tag) = self.dfa.tag(repr) {
                accepts.insert(block_idx as StateId, tag.clone());
            }
        }

        let states: Vec<StateId> = (0..self.blocks.len() as StateId).collect();
        let start = self.state_block[self.dfa.start as usize] as StateId;
        Dfa {
            states,
            start,
            accepts,
            trans,
            alphabet: self.dfa.alphabet.clone(),
        }
    }
}
