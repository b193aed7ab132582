//! Audio playback engine.
//!
//! The session drives playback through [`PlaybackEngine`]; [`RodioEngine`]
//! is the real implementation, backed by an output thread that owns the
//! audio device.

mod output;
mod types;

pub use output::RodioEngine;
pub use types::PlaybackEngine;

#[cfg(test)]
pub(crate) mod fake;
