//! The round-two matching algorithm: an incremental active-set scan that
//! finds every contiguous slice of a module's instruction stream whose
//! stable-hash sequence is a terminal path in the trie (spec §4.3).

use crate::hash::{HashOracle, StableHash, NO_HASH};
use crate::node::HashNode;
use crate::trie::HashTrie;

/// A contiguous slice of the instruction stream that matched a terminal
/// path in the trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedEntry {
    pub start_index: usize,
    pub length: usize,
}

struct TrackedEntry<'n> {
    start_index: usize,
    length: usize,
    node: &'n HashNode,
}

/// Scans a module's linearized instruction stream against a read-only
/// [`HashTrie`]. Stateless across calls: the trie is never mutated.
pub struct Matcher<'t> {
    trie: &'t HashTrie,
}

impl<'t> Matcher<'t> {
    pub fn new(trie: &'t HashTrie) -> Self {
        Self { trie }
    }

    /// Runs the active-set scan over `instr_list`/`invalid_mask` (equal
    /// length `N`). `invalid_mask[i] >= N` marks position `i` as invalid,
    /// breaking any in-progress or starting match. Hashing a position to
    /// `0` (see [`NO_HASH`]) is treated the same way.
    ///
    /// Returns every matched terminal slice; a single position may
    /// contribute more than one [`MatchedEntry`] when several in-progress
    /// matches reach a terminal node simultaneously.
    pub fn find_matches<I, O>(
        &self,
        instr_list: &[I],
        invalid_mask: &[usize],
        oracle: &O,
    ) -> Vec<MatchedEntry>
    where
        O: HashOracle<I>,
    {
        let n = instr_list.len();
        debug_assert_eq!(invalid_mask.len(), n);

        let mut tracked: Vec<TrackedEntry> = Vec::new();
        let mut matches = Vec::new();

        for idx in 0..n {
            if invalid_mask.get(idx).copied().unwrap_or(n) >= n {
                tracked.clear();
                continue;
            }

            let hash: StableHash = oracle.stable_hash(&instr_list[idx]);
            if hash == NO_HASH {
                tracked.clear();
                continue;
            }

            let mut next: Vec<TrackedEntry> = Vec::new();

            if let Some(child) = self.trie.root().successors.get(&hash) {
                next.push(TrackedEntry {
                    start_index: idx,
                    length: 1,
                    node: child,
                });
            }
            for entry in &tracked {
                if let Some(child) = entry.node.successors.get(&hash) {
                    next.push(TrackedEntry {
                        start_index: entry.start_index,
                        length: entry.length + 1,
                        node: child,
                    });
                }
            }

            for entry in &next {
                if entry.node.is_terminal {
                    matches.push(MatchedEntry {
                        start_index: entry.start_index,
                        length: entry.length,
                    });
                }
            }

            tracked = next;
        }

        matches
    }
}
