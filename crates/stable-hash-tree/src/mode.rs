//! Process-wide lifecycle control: the hash-tree mode, the runtime option
//! surface of spec §6, and the optional singleton shared trie of §4.5/§5.

use std::path::Path;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

use tracing::debug;

use crate::hash::HashSequence;
use crate::trie::HashTrie;

/// Which phase of the two-round protocol the process is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashTreeMode {
    #[default]
    None,
    Writing,
    Reading,
}

impl HashTreeMode {
    /// Parses the `outliner-hash-tree-mode` option: case-insensitive
    /// `"read"` or `"write"`, anything else (including the default `""`)
    /// maps to `None`.
    pub fn from_option_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "read" => Self::Reading,
            "write" => Self::Writing,
            _ => Self::None,
        }
    }
}

/// The four runtime options of spec §6, gathered into one struct so the
/// CLI only has to parse them once.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub hash_tree_mode: HashTreeMode,
    pub use_singleton_hash_tree: bool,
    pub outline_dead_code_only: bool,
    pub outline_cold_code_only: bool,
}

impl RuntimeOptions {
    pub fn new(
        hash_tree_mode_str: &str,
        use_singleton_hash_tree: bool,
        outline_dead_code_only: bool,
        outline_cold_code_only: bool,
    ) -> Self {
        Self {
            hash_tree_mode: HashTreeMode::from_option_str(hash_tree_mode_str),
            use_singleton_hash_tree,
            outline_dead_code_only,
            outline_cold_code_only,
        }
    }
}

// The process-wide shared trie used when `use-singleton-machine-outliner-
// hashtree` is enabled. Lazily initialized; a `RwLock` rather than a plain
// `Mutex` because spec §5 explicitly calls it "exclusive-write,
// shared-read": round one's worker threads each take a write lock only
// for the duration of their own `insert_many` call, while round two's
// per-module matchers take a read lock, letting multiple modules match
// concurrently against the frozen trie.
static SINGLETON_TRIE: OnceLock<RwLock<HashTrie>> = OnceLock::new();

fn singleton() -> &'static RwLock<HashTrie> {
    SINGLETON_TRIE.get_or_init(|| RwLock::new(HashTrie::new()))
}

/// Inserts every sequence in `sequences` into the singleton trie, taking
/// the write lock once per call and releasing it on return. Call sites in
/// round one typically hold this for the lifetime of one translation
/// unit's outlining pass.
pub fn insert_many_singleton<S: AsRef<[u64]>>(sequences: &[S]) {
    let mut guard = match singleton().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.insert_many(sequences);
    debug!(count = sequences.len(), "inserted into singleton hash tree");
}

/// Borrows the singleton trie for reading (round two). No write lock is
/// ever taken on this path; callers are expected to only read after round
/// one has quiesced across all threads, per spec §5.
pub fn read_singleton() -> RwLockReadGuard<'static, HashTrie> {
    match singleton().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// When singleton mode is enabled, decoding a trie from a buffer/file is a
/// deliberate no-op: the in-memory singleton authoritatively supersedes
/// any persisted file (spec §4.5). Returns `true` if the caller should
/// skip the on-disk codec entirely.
pub fn singleton_supersedes_file(options: &RuntimeOptions) -> bool {
    options.use_singleton_hash_tree
}

/// A trie borrowed either from the singleton or owned after a file load.
/// `Deref`s to `HashTrie` so callers (the `Matcher`, size/depth queries)
/// don't need to match on which source it came from.
pub enum LoadedTrie {
    Owned(HashTrie),
    Singleton(RwLockReadGuard<'static, HashTrie>),
}

impl std::ops::Deref for LoadedTrie {
    type Target = HashTrie;

    fn deref(&self) -> &HashTrie {
        match self {
            LoadedTrie::Owned(trie) => trie,
            LoadedTrie::Singleton(guard) => guard,
        }
    }
}

/// Resolves which trie a round-two consumer should read against: when
/// singleton mode is enabled the in-memory singleton authoritatively
/// supersedes the file and `path` is never even opened (spec §4.5); only
/// otherwise does this fall back to decoding `path`.
pub fn load_trie(path: &Path, options: &RuntimeOptions) -> LoadedTrie {
    if singleton_supersedes_file(options) {
        LoadedTrie::Singleton(read_singleton())
    } else {
        LoadedTrie::Owned(HashTrie::load_or_default(path))
    }
}

/// Replaces the singleton's contents. Exposed for tests that need a
/// clean slate between scenarios; production code should rely on
/// monotonic inserts instead.
#[cfg(test)]
pub(crate) fn reset_singleton_for_test() {
    let mut guard = match singleton().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = HashTrie::new();
}
