use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type TrackId = u32;

/// Key under which all-time listening is accumulated.
pub const TOTAL_KEY: &str = "total";

/// A named trim range, in seconds.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub start: f64,
    pub end: f64,
}

impl Clip {
    /// Build a clip, enforcing `0 <= start <= end <= duration`.
    pub fn new(start: f64, end: f64, duration: f64) -> Result<Self> {
        if !(0.0..=end).contains(&start) || end > duration {
            return Err(Error::InvalidClip {
                start,
                end,
                duration,
            });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, pos: f64) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Tag-derived metadata cached by the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMeta {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    /// Seconds.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub path: PathBuf,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub clips: BTreeMap<String, Clip>,
    /// Clip used by clip mode.
    #[serde(default)]
    pub active_clip: Option<String>,
    /// Seconds listened, keyed by year and by [`TOTAL_KEY`].
    #[serde(default)]
    pub listen_times: BTreeMap<String, f64>,
    #[serde(default)]
    pub raw_lyrics: Option<String>,
    #[serde(default)]
    pub raw_override_lyrics: Option<String>,
    #[serde(default)]
    pub raw_translated_lyrics: Option<String>,
    #[serde(default)]
    pub meta: TrackMeta,
}

impl Track {
    pub fn new(id: TrackId, title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            title: title.into(),
            path: path.into(),
            tags: BTreeSet::new(),
            clips: BTreeMap::new(),
            active_clip: None,
            listen_times: BTreeMap::new(),
            raw_lyrics: None,
            raw_override_lyrics: None,
            raw_translated_lyrics: None,
            meta: TrackMeta::default(),
        }
    }

    /// `Artist - Title` when the artist is known.
    pub fn display(&self) -> String {
        match self.meta.artist.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{} - {}", a, self.title),
            _ => self.title.clone(),
        }
    }

    /// Store a clip under `name`, validated against the known duration.
    pub fn set_clip(&mut self, name: &str, start: f64, end: f64) -> Result<()> {
        let duration = self.meta.duration.unwrap_or(f64::MAX);
        let clip = Clip::new(start, end, duration)?;
        self.clips.insert(name.to_string(), clip);
        if self.active_clip.is_none() {
            self.active_clip = Some(name.to_string());
        }
        Ok(())
    }

    /// The clip clip mode should use, if any.
    pub fn active_clip(&self) -> Option<Clip> {
        self.active_clip
            .as_deref()
            .and_then(|name| self.clips.get(name))
            .copied()
    }

    /// Add `seconds` to both the `year` bucket and the total.
    pub fn add_listen_time(&mut self, year: i32, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        *self.listen_times.entry(year.to_string()).or_insert(0.0) += seconds;
        *self.listen_times.entry(TOTAL_KEY.to_string()).or_insert(0.0) += seconds;
    }

    /// Lyrics to display: override lyrics win over the raw lyrics.
    pub fn lyrics_source(&self) -> Option<&str> {
        self.raw_override_lyrics
            .as_deref()
            .or(self.raw_lyrics.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}
