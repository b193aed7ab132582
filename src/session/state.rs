//! Small state enums shared by the session, the dispatcher and the UI.

use crate::catalog::TrackId;
use crate::config::QueueLoopSetting;

/// The playback state of the session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Repeat the current track when it ends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    #[default]
    None,
    /// Replay a single time, then fall back to `None`.
    Once,
    Infinite,
}

impl RepeatMode {
    /// `None -> Once -> Infinite -> None`.
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Once,
            Self::Once => Self::Infinite,
            Self::Infinite => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Once => "repeat once",
            Self::Infinite => "repeat",
        }
    }
}

/// What happens when the tail of the queue is reached.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum QueueLoop {
    /// The session ends.
    #[default]
    Off,
    /// Wrap to the head.
    Repeat,
    /// Start a freshly shuffled lap of the whole queue.
    Reshuffle,
}

impl QueueLoop {
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "",
            Self::Repeat => "loop",
            Self::Reshuffle => "reshuffle",
        }
    }
}

impl From<QueueLoopSetting> for QueueLoop {
    fn from(s: QueueLoopSetting) -> Self {
        match s {
            QueueLoopSetting::Off => Self::Off,
            QueueLoopSetting::Repeat => Self::Repeat,
            QueueLoopSetting::Reshuffle => Self::Reshuffle,
        }
    }
}

/// Which pane receives navigation keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Queue,
    Lyrics,
}

/// Optional features that can be toggled while playing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    Visualize,
    Stream,
    Discord,
    Lyrics,
    TranslatedLyrics,
}

impl Feature {
    pub fn label(self) -> &'static str {
        match self {
            Self::Visualize => "visualizer",
            Self::Stream => "stream",
            Self::Discord => "discord",
            Self::Lyrics => "lyrics",
            Self::TranslatedLyrics => "translated lyrics",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Features {
    pub visualize: bool,
    pub stream: bool,
    pub discord: bool,
    pub lyrics: bool,
    pub translated_lyrics: bool,
}

impl Features {
    pub fn get(&self, f: Feature) -> bool {
        match f {
            Feature::Visualize => self.visualize,
            Feature::Stream => self.stream,
            Feature::Discord => self.discord,
            Feature::Lyrics => self.lyrics,
            Feature::TranslatedLyrics => self.translated_lyrics,
        }
    }

    fn slot(&mut self, f: Feature) -> &mut bool {
        match f {
            Feature::Visualize => &mut self.visualize,
            Feature::Stream => &mut self.stream,
            Feature::Discord => &mut self.discord,
            Feature::Lyrics => &mut self.lyrics,
            Feature::TranslatedLyrics => &mut self.translated_lyrics,
        }
    }

    /// Flip `f` and return the new value.
    pub fn toggle(&mut self, f: Feature) -> bool {
        let slot = self.slot(f);
        *slot = !*slot;
        *slot
    }
}

/// Why the session left the previous track.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    TrackEnded,
    Skip,
    Back,
    Restart,
    Jump,
    Delete,
    NextLap,
    End,
}

/// Side effects the runtime applies after a session mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// A new track was loaded.
    TrackChanged(TrackId),
    /// Queue contents or order changed.
    QueueChanged,
    PlaybackChanged(PlaybackState),
    /// Playback jumped to a new position (seconds, as displayed).
    Seeked(f64),
    /// A feature was switched; its worker must follow.
    FeatureToggled(Feature, bool),
    VolumeChanged(u8),
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycle_has_period_three() {
        for start in [RepeatMode::None, RepeatMode::Once, RepeatMode::Infinite] {
            assert_eq!(start.cycle().cycle().cycle(), start);
            assert_ne!(start.cycle(), start);
        }
    }

    #[test]
    fn features_toggle_reports_new_value() {
        let mut f = Features::default();
        assert!(f.toggle(Feature::Discord));
        assert!(f.get(Feature::Discord));
        assert!(!f.toggle(Feature::Discord));
        assert!(!f.get(Feature::Visualize));
    }
}
