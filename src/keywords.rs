//! Keyword rule sets: the dictionary the watcher matches lines against.
//!
//! Rules come from the config file (or [`default_rules`]) and compile into an
//! [`Automaton`] whose values are the rules' notification messages. The
//! pipeline lower-cases every line before searching, so patterns are
//! lower-cased here at compile time to keep matching case-insensitive end to
//! end.

use serde::{Deserialize, Serialize};

use crate::matcher::automaton::{Automaton, AutomatonBuilder, BuildError};
use crate::matcher::trie::{InvalidPatternError, PatternTrie};

/// Errors from compiling a keyword rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeywordError {
    /// A rule's pattern was empty.
    #[error("invalid keyword rule: {0}")]
    InvalidPattern(#[from] InvalidPatternError),

    /// The rule set could not be compiled into an automaton.
    #[error("failed to compile keyword rules: {0}")]
    Build(#[from] BuildError),
}

/// One keyword rule: a substring to look for in log lines and the message to
/// send when it is found.
///
/// An empty `message` (the serde default) forwards the matched log line
/// verbatim; a non-empty one replaces the line in the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substring to look for; matched case-insensitively.
    pub pattern: String,

    /// Replacement message; empty means "forward the raw line".
    #[serde(default)]
    pub message: String,
}

/// Compile `rules` into a matching automaton.
///
/// Patterns are lower-cased before insertion. Duplicate patterns are legal;
/// each occurrence keeps its own message and all of them are reported on a
/// match, in rule order.
///
/// # Errors
///
/// Returns [`KeywordError::InvalidPattern`] if any rule has an empty pattern.
pub fn compile(rules: &[KeywordRule]) -> Result<Automaton<String>, KeywordError> {
    let mut trie = PatternTrie::new();
    for rule in rules {
        trie.add_word(&rule.pattern.to_lowercase(), rule.message.clone())?;
    }

    let mut builder = AutomatonBuilder::new(trie);
    let automaton = builder.build()?;
    Ok(automaton)
}

/// Stock rule set for a vanilla Minecraft server log.
///
/// Player join/leave and death phrases forward the raw log line; backup
/// phrases substitute a short status message. Used whenever the config file
/// does not provide its own rules.
pub fn default_rules() -> Vec<KeywordRule> {
    fn raw(pattern: &str) -> KeywordRule {
        KeywordRule {
            pattern: pattern.to_owned(),
            message: String::new(),
        }
    }

    fn message(pattern: &str, message: &str) -> KeywordRule {
        KeywordRule {
            pattern: pattern.to_owned(),
            message: message.to_owned(),
        }
    }

    vec![
        // Server lifecycle
        raw("joined the game"),
        raw("left the game"),
        raw("server empty for 60 seconds"),
        message("starting backup", "Starting Backup"),
        message("backup complete", "Backup Complete"),
        // Deaths
        raw("fell from a high place"),
        raw("fell out of the world"),
        raw("hit the ground too hard"),
        raw("was squished too much"),
        raw("went up in flames"),
        raw("burned to death"),
        raw("tried to swim in lava"),
        raw("drowned"),
        raw("starved to death"),
        // Combat deaths
        raw("was slain by"),
        raw("was frozen to death by"),
        raw("was shot by"),
        raw("blew up"),
        raw("was blown up by"),
        raw("was killed by"),
        raw("was killed trying to hurt"),
        // Environmental deaths
        raw("fell into a patch of"),
        raw("fell into the void"),
        raw("was impaled on a stalagmite"),
        raw("walked into fire whilst fighting"),
        raw("tried to swim in lava to escape"),
        raw("drowned whilst trying to escape"),
        raw("froze to death"),
        raw("suffocated in a wall"),
        raw("was pricked to death"),
        raw("was struck by lightning"),
        raw("discovered the floor was lava"),
        raw("was obliterated by a sonically charged shriek"),
        raw("was stung to death by bees"),
        raw("was rammed by a goat"),
    ]
}
