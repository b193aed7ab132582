//! Interactive editor for one named clip of one track.

use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use tracing::debug;

use crate::engine::PlaybackEngine;
use crate::error::{Error, Result};
use crate::ui::{self, ClipView};

use super::input::LoopEvent;

/// Step for a plain arrow key, in seconds.
const FINE_STEP: f64 = 0.1;
/// Step with Shift held.
const COARSE_STEP: f64 = 1.0;
/// Previewing the end boundary starts this long before it.
pub const END_PREVIEW: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipField {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipStep {
    /// Seek here and pause.
    Preview(f64),
    TogglePlay,
    Commit { start: f64, end: f64 },
    Abort,
    Ignored,
}

/// Two-field editing state. `0 <= start <= end <= duration` holds after
/// every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipEditor {
    field: ClipField,
    start: f64,
    end: f64,
    duration: f64,
}

impl ClipEditor {
    pub fn new(start: f64, end: f64, duration: f64) -> Self {
        let duration = duration.max(0.0);
        let end = end.clamp(0.0, duration);
        Self {
            field: ClipField::Start,
            start: start.clamp(0.0, end),
            end,
            duration,
        }
    }

    pub fn field(&self) -> ClipField {
        self.field
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Where to seek to preview the field being edited.
    pub fn preview_at(&self) -> f64 {
        match self.field {
            ClipField::Start => self.start,
            ClipField::End => (self.end - END_PREVIEW).max(self.start),
        }
    }

    /// Move the edited boundary by `delta`, clamped to its neighbours.
    pub fn nudge(&mut self, delta: f64) -> f64 {
        match self.field {
            ClipField::Start => self.start = (self.start + delta).clamp(0.0, self.end),
            ClipField::End => self.end = (self.end + delta).clamp(self.start, self.duration),
        }
        self.preview_at()
    }

    pub fn swap_field(&mut self) -> f64 {
        self.field = match self.field {
            ClipField::Start => ClipField::End,
            ClipField::End => ClipField::Start,
        };
        self.preview_at()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ClipStep {
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            COARSE_STEP
        } else {
            FINE_STEP
        };
        match key.code {
            KeyCode::Left => ClipStep::Preview(self.nudge(-step)),
            KeyCode::Right => ClipStep::Preview(self.nudge(step)),
            KeyCode::Char(' ') => ClipStep::TogglePlay,
            KeyCode::Char('t') => ClipStep::Preview(self.swap_field()),
            KeyCode::Enter => ClipStep::Commit {
                start: self.start,
                end: self.end,
            },
            KeyCode::Char('q') | KeyCode::Esc => ClipStep::Abort,
            _ => ClipStep::Ignored,
        }
    }
}

/// Run the editor on `path` until the user commits or aborts. Editing
/// starts from `initial`, or the whole track. Returns the committed
/// `(start, end)`.
pub fn run<B: Backend, E: PlaybackEngine>(
    terminal: &mut Terminal<B>,
    engine: &mut E,
    path: &Path,
    title: &str,
    initial: Option<(f64, f64)>,
    events: &Receiver<LoopEvent>,
) -> Result<Option<(f64, f64)>> {
    engine.load(path)?;
    let duration = engine
        .duration()
        .or(initial.map(|(_, end)| end))
        .unwrap_or(0.0);
    let (start, end) = initial.unwrap_or((0.0, duration));
    let mut editor = ClipEditor::new(start, end, duration);
    engine.seek(editor.start())?;
    engine.play();
    let mut playing = true;

    loop {
        let position = engine.position();
        // Previews stop at the end boundary.
        if playing && position >= editor.end() {
            engine.pause();
            playing = false;
        }

        let view = ClipView {
            title,
            start: editor.start(),
            end: editor.end(),
            duration: editor.duration(),
            position,
            editing_end: editor.field() == ClipField::End,
            playing,
        };
        terminal
            .draw(|f| ui::draw_clip_editor(f, &view))
            .map_err(|e| Error::Terminal(e.to_string()))?;

        let key = match events.recv_timeout(Duration::from_millis(100)) {
            Ok(LoopEvent::Key(k)) => k,
            Ok(LoopEvent::InputFailed(msg)) => return Err(Error::Terminal(msg)),
            Ok(_) | Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        };

        match editor.handle_key(key) {
            ClipStep::Preview(at) => {
                engine.seek(at)?;
                engine.pause();
                playing = false;
            }
            ClipStep::TogglePlay => {
                if playing {
                    engine.pause();
                } else {
                    if engine.position() >= editor.end() {
                        engine.seek(editor.preview_at())?;
                    }
                    engine.resume();
                }
                playing = !playing;
            }
            ClipStep::Commit { start, end } => {
                debug!(start, end, "clip committed");
                engine.stop();
                return Ok(Some((start, end)));
            }
            ClipStep::Abort => {
                engine.stop();
                return Ok(None);
            }
            ClipStep::Ignored => {}
        }
    }
}
