//! Per-line policy: decide what, if anything, to send for each log line.
//!
//! Three outcomes per line, decided by the first automaton match: no match →
//! no action; matched message empty → forward the raw line verbatim; matched
//! message non-empty → the message replaces the line. The policy lives here,
//! at the delivery boundary — the automaton itself just reports matches.

use tracing::debug;

use crate::matcher::automaton::Automaton;
use crate::notifier::{Notifier, NotifyError};

/// Pick the message to send for `line`, if any.
///
/// The search runs over a lower-cased copy of the line (patterns are
/// compiled lower-cased); the raw line is forwarded untouched when the
/// winning rule carries no message of its own. Only the first match decides
/// — later matches on the same line are ignored.
pub fn resolve<'a>(automaton: &'a Automaton<String>, line: &'a str) -> Option<&'a str> {
    let lowered = line.to_lowercase();
    let value = automaton.search(&lowered).next()?;
    if value.is_empty() {
        Some(line)
    } else {
        Some(value.as_str())
    }
}

/// Matching pipeline: a compiled automaton plus the sink notifications go to.
pub struct Pipeline {
    automaton: Automaton<String>,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    /// Build a pipeline from a compiled automaton and a delivery sink.
    pub fn new(automaton: Automaton<String>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            automaton,
            notifier,
        }
    }

    /// Run one log line through the policy. Returns whether a notification
    /// was sent.
    ///
    /// Surrounding whitespace is trimmed before matching; blank lines are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Propagates delivery errors from the notifier. The line is dropped
    /// either way — there is no retry.
    pub async fn handle_line(&self, line: &str) -> Result<bool, NotifyError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(false);
        }

        let Some(message) = resolve(&self.automaton, line) else {
            return Ok(false);
        };

        debug!(notification = %message, "line matched");
        self.notifier.notify(message).await?;
        Ok(true)
    }

    /// Number of patterns in the compiled rule set.
    pub fn pattern_count(&self) -> usize {
        self.automaton.pattern_count()
    }
}
