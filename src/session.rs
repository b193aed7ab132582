//! Interactive playback session.
//!
//! `Session` owns the play queue and the playback engine and is the single
//! source of truth for transport state. The runtime feeds it [`Action`]s
//! and periodic ticks, drains its [`Effect`]s to drive workers, and draws
//! its [`Snapshot`].

mod action;
mod dispatch;
mod listen;
mod model;
mod prompt;
mod queue;
mod scroller;
mod shuffle;
mod state;
mod view;

pub use action::Action;
pub use listen::ListenTimer;
pub use model::Session;
pub use prompt::{Prompt, PromptEdit, PromptKind};
pub use queue::{Direction, Queue, Removed};
pub use scroller::Scroller;
pub use shuffle::shuffled;
pub use state::*;
pub use view::{LyricRow, NowPlaying, QueueRow, Snapshot};

#[cfg(test)]
mod tests;
