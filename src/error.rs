//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no track matches {0:?}")]
    TrackNotFound(String),

    #[error("invalid clip {start:.1}..{end:.1} for a {duration:.1}s track")]
    InvalidClip { start: f64, end: f64, duration: f64 },

    #[error("playback: {0}")]
    Playback(String),

    #[error("terminal: {0}")]
    Terminal(String),

    #[error("discord ipc: {0}")]
    Ipc(String),

    #[error("http: {0}")]
    Http(#[from] ureq::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
