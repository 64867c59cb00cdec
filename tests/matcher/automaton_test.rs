//! Tests for automaton construction semantics.

use keywatch::matcher::automaton::{Automaton, AutomatonBuilder};
use keywatch::matcher::trie::PatternTrie;

fn automaton_of(patterns: &[(&str, i32)]) -> Automaton<i32> {
    let mut trie = PatternTrie::new();
    for (pattern, value) in patterns {
        trie.add_word(pattern, *value).expect("should insert pattern");
    }
    AutomatonBuilder::new(trie)
        .build()
        .expect("first build should succeed")
}

fn collect(automaton: &Automaton<i32>, haystack: &str) -> Vec<i32> {
    automaton.search(haystack).copied().collect()
}

#[test]
fn build_is_single_shot() {
    let mut trie = PatternTrie::new();
    trie.add_word("stop", 1).expect("should insert pattern");

    let mut builder = AutomatonBuilder::new(trie);
    builder.build().expect("first build should succeed");

    let err = builder.build().expect_err("second build should fail");
    assert_eq!(
        err.to_string(),
        "automaton already built; construction is single-shot"
    );
}

#[test]
fn empty_dictionary_builds_an_automaton_that_matches_nothing() {
    let automaton = automaton_of(&[]);

    assert_eq!(automaton.pattern_count(), 0);
    assert_eq!(automaton.node_count(), 1);
    assert_eq!(collect(&automaton, "any haystack at all"), Vec::<i32>::new());
}

#[test]
fn duplicate_patterns_surface_every_value_in_insertion_order() {
    let automaton = automaton_of(&[("boom", 1), ("boom", 2)]);

    assert_eq!(automaton.pattern_count(), 2);
    assert_eq!(collect(&automaton, "kaboom"), vec![1, 2]);
}

#[test]
fn insertion_order_does_not_change_match_results() {
    let forward = automaton_of(&[("he", 1), ("she", 2), ("hers", 3)]);
    let reverse = automaton_of(&[("hers", 3), ("she", 2), ("he", 1)]);

    for haystack in ["ushers", "she sells seashells", "hehe", "x"] {
        let mut forward_hits = collect(&forward, haystack);
        let mut reverse_hits = collect(&reverse, haystack);
        forward_hits.sort_unstable();
        reverse_hits.sort_unstable();
        assert_eq!(forward_hits, reverse_hits, "haystack {haystack:?}");
    }
}

#[test]
fn counts_reflect_the_dictionary() {
    let automaton = automaton_of(&[("cat", 1), ("catalog", 2)]);

    assert_eq!(automaton.pattern_count(), 2);
    // root + one node per byte of "catalog"; "cat" is a prefix of it.
    assert_eq!(automaton.node_count(), 8);
}
