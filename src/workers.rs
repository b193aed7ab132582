//! Background workers.
//!
//! Every optional subsystem runs on its own thread under the
//! [`Supervisor`], which gives them one start/stop/status lifecycle. Workers
//! never touch the queue: they read [`Slot`]s published by the runtime and
//! write their own status and caches back.

mod analysis;
mod discord_ipc;
mod metadata;
mod presence;
mod relay;
mod slot;
mod spectrum;
mod supervisor;

pub use analysis::{Analysis, AnalysisCache, AnalysisJob, AnalysisParams, run_analysis};
pub use discord_ipc::{Activity, DiscordIpc};
pub use metadata::{MetadataJob, MetadataSinks, TrackInfo, run_metadata};
pub use presence::run_presence;
pub use relay::{StreamCursor, run_relay};
pub use slot::Slot;
pub use spectrum::{SpectralFrame, spectral_frames};
pub use supervisor::{StatusSlot, StopFlag, Supervisor, WorkerCtx, WorkerKind, WorkerStatus};

#[cfg(test)]
mod tests;
