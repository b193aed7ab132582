//! Lyrics model: plain lines or LRC-style time-tagged lines.

mod parse;

pub use parse::*;
