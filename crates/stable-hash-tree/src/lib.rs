//! A persistent trie of stable machine-instruction hashes, used to carry
//! cross-module outlining knowledge between the two codegen rounds of a
//! two-round LTO build.
//!
//! Round one inserts every locally profitable instruction sequence
//! ([`outliner::record_local_outlining`]) and persists the resulting
//! [`HashTrie`] ([`codec`]). Round two rehydrates it and asks the
//! [`matcher::Matcher`] to find every terminal prefix match in the current
//! module's instruction stream, so the outliner can both boost already-
//! repeated sequences and discover brand-new singleton candidates
//! ([`outliner::augment_round_two`]).
//!
//! The hashing of individual instructions and the outlining cost model are
//! both external collaborators here, modeled as the [`hash::HashOracle`]
//! and [`outliner::CostModel`] traits respectively — this crate only
//! consumes their verdicts.

pub mod codec;
pub mod error;
pub mod hash;
pub mod matcher;
pub mod mode;
pub mod node;
pub mod outliner;
pub mod trie;

pub use error::TrieError;
pub use hash::{HashOracle, HashSequence, StableHash, NO_HASH};
pub use matcher::{MatchedEntry, Matcher};
pub use mode::{load_trie, HashTreeMode, LoadedTrie, RuntimeOptions};
pub use node::HashNode;
pub use outliner::{augment_round_two, record_local_outlining, residual_cost, Candidate, CostModel, OutlinedFunction};
pub use trie::HashTrie;

impl HashTrie {
    /// Loads a trie from `path`, degrading to an empty trie and logging at
    /// `debug` on any I/O or format error — per spec §7, codec failures
    /// are never fatal; every consumer treats them as "no global trie
    /// available" and falls back to purely-local outlining.
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match codec::read_from_file(path) {
            Ok(trie) => trie,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no usable hash tree on disk, starting empty");
                Self::new()
            }
        }
    }
}
