//! Failure-link construction and the query-side automaton.
//!
//! [`AutomatonBuilder`] consumes a finished [`PatternTrie`] and runs one
//! breadth-first pass that gives every node (a) a failure link to the deepest
//! proper suffix of its path that is also a trie path and (b) a merged output
//! set: its own values followed by everything inherited through the failure
//! link. The resulting [`Automaton`] answers [`search`](Automaton::search)
//! queries in a single pass over the input, with no allocation per symbol and
//! no failure-chain walking at output time.

use std::collections::VecDeque;

use super::trie::{NodeId, PatternTrie, ValueId};

/// Error returned when [`AutomatonBuilder::build`] is invoked a second time.
///
/// Construction is single-shot: the builder hands its trie over to the
/// automaton and cannot rebuild. Building from an empty trie is *not* an
/// error; it yields an automaton that matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("automaton already built; construction is single-shot")]
pub struct BuildError;

/// One-shot builder that turns a [`PatternTrie`] into an [`Automaton`].
#[derive(Debug)]
pub struct AutomatonBuilder<T> {
    trie: Option<PatternTrie<T>>,
}

impl<T> AutomatonBuilder<T> {
    /// Take ownership of a finished trie.
    pub fn new(trie: PatternTrie<T>) -> Self {
        Self { trie: Some(trie) }
    }

    /// Compute failure links and merged output sets, producing the automaton.
    ///
    /// Breadth-first over the trie: direct children of the root fall back to
    /// the root; for every deeper node the parent's failure chain is walked
    /// until a node with a matching child is found. Output sets are merged
    /// eagerly during the same pass — a failure target sits at strictly
    /// smaller depth, so its merged set is always complete by the time a node
    /// inherits from it. Each node is enqueued exactly once, so the whole
    /// pass is linear in trie size.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if called again on the same builder.
    pub fn build(&mut self) -> Result<Automaton<T>, BuildError> {
        let trie = self.trie.take().ok_or(BuildError)?;

        let node_count = trie.node_count();
        let mut fail = vec![NodeId::ROOT; node_count];
        let mut outputs: Vec<Vec<ValueId>> = vec![Vec::new(); node_count];
        let mut queue = VecDeque::new();

        for &(_, child) in trie.children(NodeId::ROOT) {
            outputs[child.index()] = trie.outputs(child).to_vec();
            queue.push_back(child);
        }

        while let Some(current) = queue.pop_front() {
            for &(byte, child) in trie.children(current) {
                let mut fallback = fail[current.index()];
                while trie.child(fallback, byte).is_none() && fallback != NodeId::ROOT {
                    fallback = fail[fallback.index()];
                }
                let target = trie.child(fallback, byte).unwrap_or(NodeId::ROOT);
                fail[child.index()] = target;

                // Own values first, then the target's already-merged set.
                let mut merged = trie.outputs(child).to_vec();
                merged.extend_from_slice(&outputs[target.index()]);
                outputs[child.index()] = merged;

                queue.push_back(child);
            }
        }

        Ok(Automaton {
            trie,
            fail,
            outputs,
        })
    }
}

/// The built matcher: trie transitions plus failure-link and merged-output
/// tables indexed in parallel by node.
///
/// Immutable once built; [`search`](Automaton::search) only reads, so a
/// shared reference (or an `Arc`) can serve concurrent queries from any
/// number of threads without locking.
#[derive(Debug, Clone)]
pub struct Automaton<T> {
    trie: PatternTrie<T>,
    fail: Vec<NodeId>,
    outputs: Vec<Vec<ValueId>>,
}

impl<T> Automaton<T> {
    /// Scan `text` once, lazily yielding a reference to every matched value.
    ///
    /// Results come in non-decreasing order of match end position; matches
    /// ending at the same position surface the longest word's own values
    /// first, then inherited suffix-word values. Overlapping and nested
    /// occurrences are all reported.
    ///
    /// Every call starts fresh at the root: nothing carries over between
    /// calls, and a keyword spanning two calls is never detected — pass one
    /// contiguous string per logical unit. Bytes outside the trained
    /// alphabet simply keep the scan at the root.
    pub fn search<'a, 'h>(&'a self, text: &'h str) -> Matches<'a, 'h, T> {
        let no_pending: &[ValueId] = &[];
        Matches {
            automaton: self,
            state: NodeId::ROOT,
            input: text.bytes(),
            pending: no_pending.iter(),
        }
    }

    /// Number of patterns the automaton was built from.
    pub fn pattern_count(&self) -> usize {
        self.trie.len()
    }

    /// Number of trie nodes backing the automaton.
    pub fn node_count(&self) -> usize {
        self.trie.node_count()
    }

    /// One transition: consume `byte` from `state`, walking failure links on
    /// mismatch until an edge exists or the root absorbs the byte.
    fn step(&self, mut state: NodeId, byte: u8) -> NodeId {
        loop {
            if let Some(next) = self.trie.child(state, byte) {
                return next;
            }
            if state == NodeId::ROOT {
                return NodeId::ROOT;
            }
            state = self.fail[state.index()];
        }
    }

    /// Failure-link table, for construction assertions in tests.
    #[cfg(test)]
    fn fail_of(&self, state: NodeId) -> NodeId {
        self.fail[state.index()]
    }
}

/// Lazy stream of matched values from one [`Automaton::search`] call.
///
/// Yields `&T` in match order; dropping it early simply stops the scan.
pub struct Matches<'a, 'h, T> {
    automaton: &'a Automaton<T>,
    state: NodeId,
    input: std::str::Bytes<'h>,
    pending: std::slice::Iter<'a, ValueId>,
}

impl<'a, T> Iterator for Matches<'a, '_, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(&id) = self.pending.next() {
                return Some(self.automaton.trie.value(id));
            }
            let byte = self.input.next()?;
            self.state = self.automaton.step(self.state, byte);
            self.pending = self.automaton.outputs[self.state.index()].iter();
        }
    }
}

impl<T> std::iter::FusedIterator for Matches<'_, '_, T> {}
