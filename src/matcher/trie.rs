//! Keyword trie: the insert-time half of the matching engine.
//!
//! [`PatternTrie`] stores keywords byte by byte in an arena of nodes addressed
//! by dense indices. Each node keeps its child edges sorted for binary-search
//! lookup and records which inserted values end at it. A finished trie is
//! consumed by [`AutomatonBuilder`](super::automaton::AutomatonBuilder).

/// Index of a node in the trie arena.
///
/// Stable for the lifetime of the trie; nodes are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    /// The root node, present in every trie.
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Position of this node in arena-parallel tables.
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Index of an inserted value in the trie's value arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueId(usize);

/// A single trie node.
///
/// A node is terminal exactly when `outputs` is non-empty: every insertion
/// attaches one value to its final node, so the end-of-word marker and the
/// output list coincide.
#[derive(Debug, Clone, Default)]
struct Node {
    /// Child edges sorted by byte; at most one child per byte.
    children: Vec<(u8, NodeId)>,
    /// Values of words ending exactly here, in insertion order.
    outputs: Vec<ValueId>,
}

/// Error returned when inserting an empty pattern.
///
/// Empty patterns are meaningless to match and are rejected outright rather
/// than silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pattern is empty")]
pub struct InvalidPatternError;

/// Byte-keyed keyword trie, built incrementally via [`add_word`].
///
/// Generic over the output value type `T`; the trie owns every inserted value
/// and the built automaton later hands out `&T` references. Construction is
/// purely additive: nodes and values are never removed.
///
/// [`add_word`]: PatternTrie::add_word
#[derive(Debug, Clone)]
pub struct PatternTrie<T> {
    nodes: Vec<Node>,
    values: Vec<T>,
}

impl<T> PatternTrie<T> {
    /// Create an empty trie containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            values: Vec::new(),
        }
    }

    /// Insert `word` with an associated output `value`.
    ///
    /// Walks from the root, creating a node for each byte not yet present,
    /// and appends `value` at the final node. Inserting the same word twice
    /// records both values in insertion order; inserting a prefix or an
    /// extension of an existing word is fully supported.
    ///
    /// Matching is case-sensitive over exactly the bytes given here:
    /// normalize consistently at insert and search time or matches are
    /// silently missed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPatternError`] if `word` is empty.
    pub fn add_word(&mut self, word: &str, value: T) -> Result<(), InvalidPatternError> {
        if word.is_empty() {
            return Err(InvalidPatternError);
        }

        let mut node = NodeId::ROOT;
        for byte in word.bytes() {
            node = self.child_or_insert(node, byte);
        }

        let value_id = ValueId(self.values.len());
        self.values.push(value);
        self.nodes[node.index()].outputs.push(value_id);
        Ok(())
    }

    /// Number of accepted insertions (duplicates counted separately).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no words have been inserted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of nodes in the arena, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Child of `node` for `byte`, if the edge exists.
    pub(crate) fn child(&self, node: NodeId, byte: u8) -> Option<NodeId> {
        let children = &self.nodes[node.index()].children;
        children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|pos| children[pos].1)
    }

    /// Child edges of `node`, sorted by byte.
    pub(crate) fn children(&self, node: NodeId) -> &[(u8, NodeId)] {
        &self.nodes[node.index()].children
    }

    /// Values recorded directly at `node`, in insertion order.
    pub(crate) fn outputs(&self, node: NodeId) -> &[ValueId] {
        &self.nodes[node.index()].outputs
    }

    /// Resolve a value id to the stored value.
    pub(crate) fn value(&self, id: ValueId) -> &T {
        &self.values[id.0]
    }

    /// Walk to the child of `node` for `byte`, inserting a fresh node if the
    /// edge does not exist yet. Keeps the edge list sorted.
    fn child_or_insert(&mut self, node: NodeId, byte: u8) -> NodeId {
        match self.nodes[node.index()]
            .children
            .binary_search_by_key(&byte, |&(b, _)| b)
        {
            Ok(pos) => self.nodes[node.index()].children[pos].1,
            Err(pos) => {
                let child = NodeId(self.nodes.len());
                self.nodes.push(Node::default());
                self.nodes[node.index()].children.insert(pos, (byte, child));
                child
            }
        }
    }
}

impl<T> Default for PatternTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}
