//! Owned snapshot of everything the frame composer draws.

use crate::catalog::TrackId;
use crate::engine::PlaybackEngine;

use super::model::Session;
use super::prompt::Prompt;
use super::state::{Features, Focus, PlaybackState, QueueLoop, RepeatMode};

#[derive(Debug, Clone, PartialEq)]
pub struct QueueRow {
    pub pos: usize,
    pub id: TrackId,
    pub title: String,
    pub playing: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub id: TrackId,
    pub title: String,
    /// 1-based position in the queue.
    pub pos: usize,
    pub queue_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricRow {
    pub text: String,
    pub translation: Option<String>,
    /// Line currently being sung.
    pub current: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub rows: Vec<QueueRow>,
    pub now_playing: Option<NowPlaying>,
    pub state: PlaybackState,
    pub repeat: RepeatMode,
    pub queue_loop: QueueLoop,
    /// Clip mode is on and bounds the current track.
    pub clip: bool,
    pub ending: bool,
    pub position: f64,
    pub duration: f64,
    pub volume: u8,
    pub muted: bool,
    pub features: Features,
    pub focus: Focus,
    pub help: bool,
    pub prompt: Option<Prompt>,
    /// `None` when the lyric pane is hidden.
    pub lyrics: Option<Vec<LyricRow>>,
    pub message: Option<String>,
}

impl<E: PlaybackEngine> Session<E> {
    pub fn snapshot(&self) -> Snapshot {
        let current = self.queue.current();
        let cursor = self.queue.cursor();
        let rows = self
            .queue
            .view()
            .visible()
            .filter_map(|pos| {
                let id = self.queue.get(pos)?;
                let title = self
                    .catalog
                    .get(id)
                    .map(|t| t.display())
                    .unwrap_or_else(|| format!("#{id}"));
                Some(QueueRow {
                    pos,
                    id,
                    title,
                    playing: pos == current,
                    selected: pos == cursor,
                })
            })
            .collect();

        let now_playing = if self.finished {
            None
        } else {
            self.current_track().map(|t| NowPlaying {
                id: t.id,
                title: t.display(),
                pos: current + 1,
                queue_len: self.queue.len(),
            })
        };

        Snapshot {
            rows,
            now_playing,
            state: self.state,
            repeat: self.repeat,
            queue_loop: self.queue_loop,
            clip: self.effective_clip().is_some(),
            ending: self.ending,
            position: self.position(),
            duration: self.display_duration(),
            volume: self.volume,
            muted: self.is_muted(),
            features: self.features,
            focus: self.focus,
            help: self.help,
            prompt: self.prompt.clone(),
            lyrics: self.lyric_rows(),
            message: self.message().map(str::to_string),
        }
    }

    fn lyric_rows(&self) -> Option<Vec<LyricRow>> {
        if !self.features.lyrics {
            return None;
        }
        let lyrics = self.lyrics.as_ref()?;
        let sung = lyrics.line_at(self.engine.position());
        let translated = self
            .translated
            .as_ref()
            .filter(|_| self.features.translated_lyrics);
        Some(
            self.lyric_view
                .visible()
                .filter_map(|i| {
                    let text = lyrics.text(i)?.to_string();
                    Some(LyricRow {
                        text,
                        translation: translated.and_then(|t| t.text(i)).map(str::to_string),
                        current: sung == Some(i),
                        selected: self.focus == Focus::Lyrics
                            && i == self.lyric_view.cursor(),
                    })
                })
                .collect(),
        )
    }
}
