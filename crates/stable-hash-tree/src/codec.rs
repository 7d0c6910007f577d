//! Serializes and deserializes a [`HashTrie`] to/from the self-describing
//! textual format of spec §4.2: a JSON object mapping decimal string
//! node-IDs to `{hash, isTerminal, neighbors, source?}` records.
//!
//! The format is intentionally opaque: extra top-level fields in a record
//! are ignored on read, and the node-ID indirection (rather than inline
//! nesting) leaves room for future extensions without breaking readers
//! that tolerate unknown fields.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::TrieError;
use crate::hash::StableHash;
use crate::node::HashNode;
use crate::trie::HashTrie;

/// Encodes `trie` with no debug annotations. Equivalent to
/// `encode_with_debug_map(trie, &HashMap::new())`.
pub fn encode(trie: &HashTrie) -> String {
    encode_with_debug_map(trie, &HashMap::new())
}

/// Encodes `trie`, annotating each node whose hash is a key in
/// `debug_map` with a `"source"` field. Readers must ignore it; it exists
/// purely to make dumps legible to a human (see spec §4.2).
pub fn encode_with_debug_map(trie: &HashTrie, debug_map: &HashMap<StableHash, String>) -> String {
    let ids = assign_ids(trie.root());
    let records = build_records(trie.root(), &ids, debug_map);
    // `serde_json`'s default `Map` is a `BTreeMap`, so key order in the
    // rendered object is lexicographic over the decimal ID strings. That's
    // fine: readers key off the IDs referenced in `neighbors`, not textual
    // adjacency.
    serde_json::to_string_pretty(&Value::Object(records))
        .unwrap_or_else(|_| "{}".to_string())
}

/// Assigns decimal node IDs by a depth-first traversal using an explicit
/// stack, root first (so the root always receives ID `0`). Node identity
/// is tracked by pointer since the tree has no other unique key available
/// before IDs exist.
fn assign_ids(root: &HashNode) -> HashMap<*const HashNode, u64> {
    let mut ids = HashMap::new();
    let mut stack: Vec<&HashNode> = vec![root];
    while let Some(node) = stack.pop() {
        let key = node as *const HashNode;
        if ids.contains_key(&key) {
            continue;
        }
        let id = ids.len() as u64;
        ids.insert(key, id);
        for child in node.successors.values() {
            stack.push(child);
        }
    }
    ids
}

fn build_records(
    root: &HashNode,
    ids: &HashMap<*const HashNode, u64>,
    debug_map: &HashMap<StableHash, String>,
) -> Map<String, Value> {
    let mut out = Map::new();
    let mut stack: Vec<&HashNode> = vec![root];
    while let Some(node) = stack.pop() {
        let id = ids[&(node as *const HashNode)];
        let mut record = Map::new();
        record.insert("hash".to_string(), Value::String(format!("{:x}", node.hash)));
        record.insert(
            "isTerminal".to_string(),
            Value::String(if node.is_terminal { "true" } else { "false" }.to_string()),
        );
        if let Some(source) = debug_map.get(&node.hash) {
            record.insert("source".to_string(), Value::String(source.clone()));
        }
        let neighbors: Vec<Value> = node
            .successors
            .values()
            .map(|child| {
                let child_id = ids[&(child.as_ref() as *const HashNode)];
                Value::String(child_id.to_string())
            })
            .collect();
        record.insert("neighbors".to_string(), Value::Array(neighbors));
        out.insert(id.to_string(), Value::Object(record));
        for child in node.successors.values() {
            stack.push(child);
        }
    }
    out
}

struct PendingRecord {
    hash: StableHash,
    is_terminal: bool,
    neighbor_ids: Vec<u64>,
}

/// Decodes a `HashTrie` from the buffer-level textual format.
pub fn decode(buffer: &str) -> Result<HashTrie, TrieError> {
    let parsed: Value = serde_json::from_str(buffer)
        .map_err(|e| TrieError::MalformedEncoding(format!("invalid JSON: {e}")))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| TrieError::MalformedEncoding("top-level value is not a mapping".into()))?;

    let mut json_map: HashMap<u64, PendingRecord> = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let id: u64 = key
            .parse()
            .map_err(|_| TrieError::MalformedEncoding(format!("non-decimal node id {key:?}")))?;
        let record = value.as_object().ok_or_else(|| {
            TrieError::MalformedEncoding(format!("record for node {id} is not a mapping"))
        })?;
        let hash_str = record
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| TrieError::MalformedEncoding(format!("node {id} missing \"hash\"")))?;
        let hash = StableHash::from_str_radix(hash_str, 16).map_err(|_| {
            TrieError::MalformedEncoding(format!("node {id} has ill-formed hash {hash_str:?}"))
        })?;
        let is_terminal = record
            .get("isTerminal")
            .and_then(Value::as_str)
            .map(|s| {
                let lower = s.to_lowercase();
                lower == "true" || lower == "on"
            })
            .unwrap_or(false);
        let neighbor_ids = record
            .get("neighbors")
            .and_then(Value::as_array)
            .ok_or_else(|| TrieError::MalformedEncoding(format!("node {id} missing \"neighbors\"")))?
            .iter()
            .map(|v| {
                v.as_str()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| {
                        TrieError::MalformedEncoding(format!("node {id} has a non-decimal neighbor"))
                    })
            })
            .collect::<Result<Vec<u64>, TrieError>>()?;
        json_map.insert(
            id,
            PendingRecord {
                hash,
                is_terminal,
                neighbor_ids,
            },
        );
    }

    if !json_map.contains_key(&0) {
        return Err(TrieError::MalformedEncoding(
            "missing root node (expected id \"0\")".into(),
        ));
    }

    // Pass 1: iterative depth-first preorder over pending IDs using an
    // explicit stack, validating that every referenced neighbor exists.
    let mut preorder: Vec<u64> = Vec::new();
    let mut visited: std::collections::HashSet<u64> = std::collections::HashSet::new();
    let mut stack = vec![0u64];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            return Err(TrieError::MalformedEncoding(format!(
                "node {id} is referenced more than once (not a tree)"
            )));
        }
        let record = json_map
            .get(&id)
            .ok_or_else(|| TrieError::MalformedEncoding(format!("missing neighbor {id}")))?;
        preorder.push(id);
        for &neighbor in &record.neighbor_ids {
            if !json_map.contains_key(&neighbor) {
                return Err(TrieError::MalformedEncoding(format!(
                    "node {id} references missing neighbor {neighbor}"
                )));
            }
            stack.push(neighbor);
        }
    }

    // Pass 2: process in reverse preorder so every node's children are
    // already built by the time the node itself is assembled.
    let mut built: HashMap<u64, HashNode> = HashMap::with_capacity(preorder.len());
    for &id in preorder.iter().rev() {
        let record = &json_map[&id];
        let mut node = HashNode {
            hash: record.hash,
            is_terminal: record.is_terminal,
            successors: Default::default(),
        };
        for &neighbor_id in &record.neighbor_ids {
            let child = built.remove(&neighbor_id).ok_or_else(|| {
                TrieError::MalformedEncoding(format!(
                    "node {id} references neighbor {neighbor_id} twice"
                ))
            })?;
            node.successors.insert(child.hash, Box::new(child));
        }
        built.insert(id, node);
    }

    let root = built
        .remove(&0)
        .ok_or_else(|| TrieError::MalformedEncoding("failed to assemble root node".into()))?;
    trace!(nodes = preorder.len(), "decoded hash tree");
    Ok(HashTrie::from_root(root))
}

/// Reads a `HashTrie` from `path`, wrapping filesystem errors as
/// [`TrieError::Io`] and format errors as [`TrieError::MalformedEncoding`].
pub fn read_from_file(path: &Path) -> Result<HashTrie, TrieError> {
    let buffer = fs::read_to_string(path)?;
    decode(&buffer)
}

/// Writes `trie` to `path` in the textual format, surfacing filesystem
/// errors as [`TrieError::Io`].
pub fn write_to_file(trie: &HashTrie, path: &Path) -> Result<(), TrieError> {
    let encoded = encode(trie);
    fs::write(path, encoded)?;
    debug!(path = %path.display(), "wrote hash tree");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::sorted_dump;

    fn sample_trie() -> HashTrie {
        let mut trie = HashTrie::new();
        trie.insert(&[1, 2, 4]);
        trie.insert(&[1, 3, 4]);
        trie.insert(&[1, 3, 4, 5]);
        trie
    }

    #[test]
    fn round_trips_through_text() {
        let trie = sample_trie();
        let text = encode(&trie);
        let decoded = decode(&text).expect("round-trip decode should succeed");

        assert!(decoded.find(&[1, 2, 4]));
        assert!(decoded.find(&[1, 3, 4]));
        assert!(decoded.find(&[1, 3, 4, 5]));
        assert!(!decoded.find(&[1, 3]));
        assert_eq!(sorted_dump(&trie), sorted_dump(&decoded));
    }

    #[test]
    fn round_trips_the_empty_trie() {
        let trie = HashTrie::new();
        let text = encode(&trie);
        let decoded = decode(&text).expect("empty trie should still round-trip");
        assert_eq!(decoded.size(false), 1);
    }

    #[test]
    fn debug_map_annotates_source_but_is_ignorable() {
        let trie = sample_trie();
        let mut debug_map = HashMap::new();
        debug_map.insert(1u64, "mov x0, x1".to_string());

        let text = encode_with_debug_map(&trie, &debug_map);
        assert!(text.contains("mov x0, x1"));

        let decoded = decode(&text).expect("source field must not break decoding");
        assert_eq!(sorted_dump(&trie), sorted_dump(&decoded));
    }

    #[test]
    fn rejects_non_mapping_top_level() {
        let err = decode("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TrieError::MalformedEncoding(_)));
    }

    #[test]
    fn rejects_missing_root() {
        let text = r#"{"1": {"hash": "a", "isTerminal": "false", "neighbors": []}}"#;
        let err = decode(text).unwrap_err();
        assert!(matches!(err, TrieError::MalformedEncoding(_)));
    }

    #[test]
    fn rejects_dangling_neighbor_reference() {
        let text = r#"{"0": {"hash": "0", "isTerminal": "false", "neighbors": ["99"]}}"#;
        let err = decode(text).unwrap_err();
        assert!(matches!(err, TrieError::MalformedEncoding(_)));
    }

    #[test]
    fn rejects_missing_hash_field() {
        let text = r#"{"0": {"isTerminal": "false", "neighbors": []}}"#;
        let err = decode(text).unwrap_err();
        assert!(matches!(err, TrieError::MalformedEncoding(_)));
    }

    #[test]
    fn accepts_on_as_terminal_synonym() {
        let text = r#"{
            "0": {"hash": "0", "isTerminal": "false", "neighbors": ["1"]},
            "1": {"hash": "2a", "isTerminal": "on", "neighbors": []}
        }"#;
        let decoded = decode(text).expect("\"on\" should be accepted as terminal synonym");
        assert!(decoded.find(&[0x2a]));
    }

    #[test]
    fn write_and_read_from_file_round_trip() {
        let trie = sample_trie();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("stable-hash-tree-test-{}.json", std::process::id()));

        write_to_file(&trie, &path).expect("write should succeed");
        let decoded = read_from_file(&path).expect("read should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(sorted_dump(&trie), sorted_dump(&decoded));
    }

    #[test]
    fn read_from_missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("stable-hash-tree-does-not-exist.json");
        let err = read_from_file(&path).unwrap_err();
        assert!(matches!(err, TrieError::Io(_)));
    }
}
