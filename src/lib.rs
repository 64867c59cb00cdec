//! Keywatch — a keyword-driven log watcher.
//!
//! Single Rust binary. Tails a Minecraft server log through rotations,
//! matches every line against a compiled keyword automaton, and posts
//! notifications to a Discord webhook.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod keywords;
pub mod logging;
pub mod matcher;

pub mod notifier;
pub mod pipeline;
pub mod tailer;
