//! Command line.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{QueueLoopSetting, Settings};

#[derive(Debug, Parser)]
#[command(name = "reprise", version, about = "Terminal music player")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play tracks from the catalog or a directory.
    Play(PlayArgs),
    /// Edit a named clip of one track.
    Clip(ClipArgs),
    /// Print the effective settings as TOML.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoopArg {
    Off,
    Repeat,
    Reshuffle,
}

impl From<LoopArg> for QueueLoopSetting {
    fn from(v: LoopArg) -> Self {
        match v {
            LoopArg::Off => Self::Off,
            LoopArg::Repeat => Self::Repeat,
            LoopArg::Reshuffle => Self::Reshuffle,
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct PlayArgs {
    /// Catalog ids, titles, `tag:NAME` or directories. Defaults to the
    /// whole catalog.
    pub targets: Vec<String>,

    /// Initial volume (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// What happens at the end of the queue.
    #[arg(long = "loop", value_enum)]
    pub queue_loop: Option<LoopArg>,

    /// -1 shuffles fully, 0 keeps order, N moves no track more than N places.
    #[arg(long, allow_negative_numbers = true)]
    pub shuffle_radius: Option<i64>,

    /// Start in clip mode.
    #[arg(long)]
    pub clip: bool,

    #[arg(long)]
    pub discord: bool,

    #[arg(long)]
    pub visualize: bool,

    #[arg(long)]
    pub stream: bool,

    #[arg(long)]
    pub lyrics: bool,

    /// Show translated lyrics next to the original.
    #[arg(long)]
    pub translated: bool,
}

impl PlayArgs {
    /// Flags win over loaded settings. Feature flags only switch things on.
    pub fn apply(&self, settings: &mut Settings) {
        let p = &mut settings.playback;
        if let Some(v) = self.volume {
            p.volume = v;
        }
        if let Some(l) = self.queue_loop {
            p.queue_loop = l.into();
        }
        if let Some(r) = self.shuffle_radius {
            p.shuffle_radius = r;
        }
        p.clip_mode |= self.clip;

        let f = &mut settings.features;
        f.discord |= self.discord;
        f.visualize |= self.visualize;
        f.stream |= self.stream;
        f.lyrics |= self.lyrics || self.translated;
        f.translated_lyrics |= self.translated;
    }
}

#[derive(Debug, Args)]
pub struct ClipArgs {
    /// Catalog id or title.
    pub track: String,

    /// Clip name.
    #[arg(long, default_value = "default")]
    pub name: String,
}
