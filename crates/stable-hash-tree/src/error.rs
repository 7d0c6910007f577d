use thiserror::Error;

/// Errors surfaced by [`crate::codec`]. Every `HashTrie` data-structure
/// operation (insert, find, walk, size, depth) is infallible; only
/// serialization round-trips can fail.
#[derive(Debug, Error)]
pub enum TrieError {
    #[error("I/O error reading/writing hash tree: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed hash tree encoding: {0}")]
    MalformedEncoding(String),
}
