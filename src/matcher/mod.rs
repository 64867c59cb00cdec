//! Multi-pattern string matching.
//!
//! The matching engine in two strictly layered halves:
//!
//! - [`trie::PatternTrie`] accumulates keywords and their output values;
//! - [`automaton::AutomatonBuilder`] consumes the trie once, wires every node
//!   with a failure link and a merged output set, and produces the immutable
//!   [`automaton::Automaton`], whose [`search`](automaton::Automaton::search)
//!   reports every keyword occurring anywhere in an input in a single pass.
//!
//! Symbols are bytes. Valid UTF-8 patterns can only match at code-point
//! boundaries of valid UTF-8 input (continuation bytes never start a
//! pattern), so byte-level matching is exact for `&str` data while keeping
//! the transition tables dense. Matching is case-sensitive; callers that
//! want case-insensitivity normalize both the patterns and the input.

pub mod automaton;
pub mod trie;
