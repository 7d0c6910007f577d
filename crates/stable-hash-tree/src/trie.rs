use crate::hash::StableHash;
use crate::node::HashNode;

/// A persistent trie of stable-hash sequences.
///
/// Insert and find are O(L) in the length of the sequence, independent of
/// the size of the tree. The tree grows monotonically: there is no API to
/// remove a sequence, and it is torn down as a whole with the `HashTrie`
/// itself (see spec §3/§4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTrie {
    root: HashNode,
}

impl Default for HashTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl HashTrie {
    pub fn new() -> Self {
        Self {
            root: HashNode::root(),
        }
    }

    pub fn root(&self) -> &HashNode {
        &self.root
    }

    /// Reconstructs a `HashTrie` directly from an already-built root node.
    /// Used by the codec after decoding.
    pub(crate) fn from_root(root: HashNode) -> Self {
        Self { root }
    }

    /// Inserts one hash sequence. A no-op for an empty sequence: the root
    /// is never marked terminal.
    pub fn insert(&mut self, sequence: &[StableHash]) {
        let mut current = &mut self.root;
        for &hash in sequence {
            current = current
                .successors
                .entry(hash)
                .or_insert_with(|| Box::new(HashNode::new(hash)));
        }
        if !sequence.is_empty() {
            current.is_terminal = true;
        }
    }

    /// Inserts every sequence in `sequences`. Equivalent to calling
    /// [`HashTrie::insert`] in a loop; atomicity across sequences is not
    /// guaranteed or required.
    pub fn insert_many<S: AsRef<[StableHash]>>(&mut self, sequences: &[S]) {
        for sequence in sequences {
            self.insert(sequence.as_ref());
        }
    }

    /// Returns true iff `sequence` was previously inserted exactly (a
    /// strict prefix of an inserted sequence is not present).
    pub fn find(&self, sequence: &[StableHash]) -> bool {
        let mut current = &self.root;
        for hash in sequence {
            match current.successors.get(hash) {
                Some(next) => current = next,
                None => return false,
            }
        }
        current.is_terminal
    }

    /// Depth-first walk from the root. `node_cb` is called for every
    /// visited node (including the root); `edge_cb` is called for every
    /// traversed edge as `(parent, child)`. Sibling order is the
    /// `successors` map's key order (ascending by hash).
    pub fn walk<NodeCb, EdgeCb>(&self, mut node_cb: NodeCb, mut edge_cb: EdgeCb)
    where
        NodeCb: FnMut(&HashNode),
        EdgeCb: FnMut(&HashNode, &HashNode),
    {
        fn visit<NodeCb, EdgeCb>(node: &HashNode, node_cb: &mut NodeCb, edge_cb: &mut EdgeCb)
        where
            NodeCb: FnMut(&HashNode),
            EdgeCb: FnMut(&HashNode, &HashNode),
        {
            node_cb(node);
            for child in node.successors.values() {
                edge_cb(node, child);
                visit(child, node_cb, edge_cb);
            }
        }
        visit(&self.root, &mut node_cb, &mut edge_cb);
    }

    /// Counts reachable nodes, including the root. When `terminals_only`
    /// is set, counts only terminal nodes; since the root is never
    /// terminal, it is naturally excluded from that count without any
    /// special-casing.
    pub fn size(&self, terminals_only: bool) -> usize {
        let mut count = 0usize;
        self.walk(
            |node| {
                if !terminals_only || node.is_terminal {
                    count += 1;
                }
            },
            |_parent, _child| {},
        );
        count
    }

    /// Length of the longest root-to-node path. An empty trie has depth 0.
    pub fn depth(&self) -> usize {
        fn depth_of(node: &HashNode) -> usize {
            node.successors
                .values()
                .map(|child| 1 + depth_of(child))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.root)
    }
}

/// Collects `(hash, is_terminal)` pairs in walk order. `BTreeMap`
/// successors already guarantee key-sorted sibling order, so this is
/// directly comparable between two tries with different insertion
/// histories (spec §8's "sorted by key" equality property). Shared by
/// this module's and the codec's tests.
#[cfg(test)]
pub(crate) fn sorted_dump(trie: &HashTrie) -> Vec<(StableHash, bool)> {
    let mut out = Vec::new();
    trie.walk(
        |node| out.push((node.hash, node.is_terminal)),
        |_parent, _child| {},
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trie_has_zero_depth_and_only_the_root_counts_toward_size() {
        let trie = HashTrie::new();
        assert_eq!(trie.depth(), 0);
        assert_eq!(trie.size(false), 1);
        assert_eq!(trie.size(true), 0);
        assert!(!trie.find(&[]));
    }

    #[test]
    fn inserting_empty_sequence_is_a_noop() {
        let mut trie = HashTrie::new();
        trie.insert(&[]);
        assert!(!trie.root().is_terminal);
        assert_eq!(trie.size(false), 1);
    }

    #[test]
    fn basic_depth_and_size_scenario() {
        let mut trie = HashTrie::new();
        trie.insert(&[1, 2, 4]);
        trie.insert(&[1, 3, 4]);
        trie.insert(&[1, 3, 4, 5]);

        assert_eq!(trie.depth(), 4);
        assert_eq!(trie.size(false), 7);
        assert_eq!(trie.size(true), 3);
    }

    #[test]
    fn find_excludes_non_terminal_prefix() {
        let mut trie = HashTrie::new();
        trie.insert(&[10, 20, 30]);

        assert!(!trie.find(&[10]));
        assert!(!trie.find(&[10, 20]));
        assert!(trie.find(&[10, 20, 30]));
        assert!(!trie.find(&[10, 20, 30, 40]));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut a = HashTrie::new();
        a.insert(&[1, 2, 3]);
        a.insert(&[1, 2, 3]);

        let mut b = HashTrie::new();
        b.insert(&[1, 2, 3]);

        assert_eq!(sorted_dump(&a), sorted_dump(&b));
    }

    #[test]
    fn insert_order_does_not_affect_shape() {
        let mut a = HashTrie::new();
        a.insert(&[1, 2, 4]);
        a.insert(&[1, 3, 4]);

        let mut b = HashTrie::new();
        b.insert(&[1, 3, 4]);
        b.insert(&[1, 2, 4]);

        assert_eq!(sorted_dump(&a), sorted_dump(&b));
    }

    #[test]
    fn inserting_a_super_sequence_keeps_the_earlier_terminal() {
        let mut trie = HashTrie::new();
        trie.insert(&[1, 2]);
        trie.insert(&[1, 2, 3]);

        assert!(trie.find(&[1, 2]));
        assert!(trie.find(&[1, 2, 3]));
    }
}
