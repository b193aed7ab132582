//! Frame composer.
//!
//! [`draw`] is a pure function of a session [`Snapshot`], the worker status
//! lights and the terminal size. It clears and redraws the whole frame on
//! every call and leaves out whatever does not fit.

mod bars;
mod clip;
mod help;
mod layout;

use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::session::{LyricRow, PlaybackState, QueueRow, Snapshot};
use crate::workers::{SpectralFrame, WorkerStatus};

pub use bars::{format_time, horizontal_bar, skip_cells, spectrum_rows, truncate};
pub use clip::{ClipView, clip_bounds_text, clip_track, draw_clip_editor};
pub use help::BINDINGS;
pub use layout::{LayoutOpts, MIN_PROGRESS_WIDTH, MIN_SPLIT_WIDTH, MIN_VOLUME_WIDTH, Panes};

const VOLUME_BAR_WIDTH: usize = 10;

/// Worker states shown in the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerLights {
    pub analysis: WorkerStatus,
    pub relay: WorkerStatus,
    pub presence: WorkerStatus,
}

pub struct FrameInput<'a> {
    pub snapshot: &'a Snapshot,
    pub lights: WorkerLights,
    /// Frame for the current position, when the analysis is ready.
    pub spectrum: Option<&'a SpectralFrame>,
    pub listen_url: Option<&'a str>,
    pub visualizer_rows: u16,
}

impl FrameInput<'_> {
    pub fn layout_opts(&self) -> LayoutOpts {
        layout_opts(self.snapshot, self.visualizer_rows)
    }
}

fn layout_opts(snapshot: &Snapshot, visualizer_rows: u16) -> LayoutOpts {
    LayoutOpts {
        lyrics: snapshot.features.lyrics,
        focus: snapshot.focus,
        visualize: snapshot.features.visualize,
        visualizer_rows,
    }
}

pub fn draw(frame: &mut Frame, input: &FrameInput) {
    let area = frame.area();
    frame.render_widget(Clear, area);
    let panes = Panes::compute(area, input.layout_opts());
    let snap = input.snapshot;

    if let Some(r) = panes.status {
        let text = status_text(snap, input.lights, input.listen_url);
        line(frame, r, truncate(&text, usize::from(r.width)), Style::default());
    }
    if let Some(r) = panes.queue {
        draw_queue(frame, r, &snap.rows);
    }
    if let Some(r) = panes.lyrics {
        draw_lyrics(frame, r, snap.lyrics.as_deref().unwrap_or_default());
    }
    if let Some(r) = panes.spectrum {
        draw_spectrum(frame, r, input.spectrum, input.lights.analysis);
    }
    if let Some(r) = panes.now_playing {
        let text = now_playing_text(snap, usize::from(r.width));
        line(frame, r, text, Style::default().add_modifier(Modifier::BOLD));
    }
    if let Some(r) = panes.progress {
        line(frame, r, progress_text(snap, r.width), Style::default());
    }
    if let Some(r) = panes.bottom {
        draw_bottom(frame, r, snap);
    }
    if snap.help {
        help::draw_help(frame, area);
    }
}

fn line(frame: &mut Frame, r: Rect, text: String, style: Style) {
    frame.render_widget(Paragraph::new(Line::styled(text, style)), r);
}

fn light(status: WorkerStatus) -> &'static str {
    match status {
        WorkerStatus::Idle => "off",
        WorkerStatus::Connecting => "connecting",
        WorkerStatus::Running => "on",
        WorkerStatus::Failed => "failed",
    }
}

pub fn status_text(snap: &Snapshot, lights: WorkerLights, listen_url: Option<&str>) -> String {
    let mut parts = vec!["reprise".to_string()];
    if !snap.queue_loop.label().is_empty() {
        parts.push(snap.queue_loop.label().to_string());
    }
    if snap.features.visualize {
        parts.push(format!("vis: {}", light(lights.analysis)));
    }
    if snap.features.stream {
        match (lights.relay, listen_url) {
            (WorkerStatus::Running, Some(url)) => parts.push(format!("stream: on {url}")),
            (s, _) => parts.push(format!("stream: {}", light(s))),
        }
    }
    if snap.features.discord {
        parts.push(format!("discord: {}", light(lights.presence)));
    }
    parts.join(" │ ")
}

fn glyph(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Playing => "▶",
        PlaybackState::Paused => "⏸",
        PlaybackState::Stopped => "■",
    }
}

/// Glyph, id, title, queue position and mode flags. The title gives way
/// first when the line is too long.
pub fn now_playing_text(snap: &Snapshot, width: usize) -> String {
    let Some(np) = &snap.now_playing else {
        return truncate(&format!("{} nothing playing", glyph(PlaybackState::Stopped)), width);
    };

    let mut flags = Vec::new();
    if snap.clip {
        flags.push("clip");
    }
    if !snap.repeat.label().is_empty() {
        flags.push(snap.repeat.label());
    }
    if snap.ending {
        flags.push("ending");
    }
    let mut tail = format!(" ({}/{})", np.pos, np.queue_len);
    for f in flags {
        tail.push_str(&format!(" [{f}]"));
    }

    let head = format!("{} {} ", glyph(snap.state), np.id);
    let room = width.saturating_sub(head.width() + tail.width());
    if room < 4 {
        return truncate(&format!("{head}{}", np.title), width);
    }
    format!("{head}{}{tail}", truncate(&np.title, room))
}

/// `elapsed / total`, the progress bar, and the right-aligned volume bar.
/// Bars that do not fit are left out.
pub fn progress_text(snap: &Snapshot, width: u16) -> String {
    let w = usize::from(width);
    let total = if snap.duration > 0.0 {
        format_time(snap.duration)
    } else {
        "-:--".to_string()
    };
    let times = format!("{} / {total}", format_time(snap.position));

    let volume = (width >= MIN_VOLUME_WIDTH).then(|| {
        let label = if snap.muted {
            "mute".to_string()
        } else {
            format!("{:>3}%", snap.volume)
        };
        let bar = horizontal_bar(f64::from(snap.volume) / 100.0, VOLUME_BAR_WIDTH);
        format!(" vol {bar} {label}")
    });
    let volume_w = volume.as_ref().map_or(0, |v| v.width());

    let mut left = times;
    let bar_w = w.saturating_sub(left.width() + 1 + volume_w + 1);
    if width >= MIN_PROGRESS_WIDTH && bar_w >= 4 {
        let fraction = if snap.duration > 0.0 {
            snap.position / snap.duration
        } else {
            0.0
        };
        left.push(' ');
        left.push_str(&horizontal_bar(fraction, bar_w));
    }

    match volume {
        Some(v) => {
            let pad = w.saturating_sub(left.width() + volume_w);
            format!("{left}{}{v}", " ".repeat(pad))
        }
        None => truncate(&left, w),
    }
}

pub fn queue_line(row: &QueueRow, width: usize) -> String {
    let marker = if row.playing { "▶" } else { " " };
    truncate(&format!("{marker} {:>4} {}", row.id, row.title), width)
}

fn draw_queue(frame: &mut Frame, r: Rect, rows: &[QueueRow]) {
    let width = usize::from(r.width);
    let lines: Vec<Line> = rows
        .iter()
        .map(|row| {
            let mut style = Style::default();
            if row.playing {
                style = style.add_modifier(Modifier::BOLD);
            }
            if row.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::styled(queue_line(row, width), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), r);
}

fn draw_lyrics(frame: &mut Frame, r: Rect, rows: &[LyricRow]) {
    let block = Block::default().borders(Borders::LEFT);
    let inner = block.inner(r);
    frame.render_widget(block, r);
    let width = usize::from(inner.width);

    let lines: Vec<Line> = if rows.is_empty() {
        vec![Line::from(truncate("no lyrics", width))]
    } else {
        rows.iter()
            .map(|row| {
                let text = match &row.translation {
                    Some(t) => format!("{}  · {t}", row.text),
                    None => row.text.clone(),
                };
                let mut style = Style::default();
                if row.current {
                    style = style.add_modifier(Modifier::BOLD);
                } else {
                    style = style.add_modifier(Modifier::DIM);
                }
                if row.selected {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(truncate(&text, width), style))
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_spectrum(frame: &mut Frame, r: Rect, spectrum: Option<&SpectralFrame>, status: WorkerStatus) {
    let lines: Vec<Line> = match spectrum {
        Some(s) => spectrum_rows(s, usize::from(r.width), usize::from(r.height))
            .into_iter()
            .map(Line::from)
            .collect(),
        None => {
            let note = match status {
                WorkerStatus::Failed => "analysis failed",
                _ => "analysing…",
            };
            vec![Line::styled(
                truncate(note, usize::from(r.width)),
                Style::default().add_modifier(Modifier::DIM),
            )]
        }
    };
    frame.render_widget(Paragraph::new(lines), r);
}

fn draw_bottom(frame: &mut Frame, r: Rect, snap: &Snapshot) {
    let width = usize::from(r.width);
    if let Some(p) = &snap.prompt {
        let label = format!("{}: ", p.kind.label());
        let before: String = p.buffer().chars().take(p.cursor()).collect();
        let caret = label.width() + before.width();

        // Keep the caret on screen by dropping the start of long input.
        let text = format!("{label}{}", p.buffer());
        let (visible, dropped) = skip_cells(&text, caret.saturating_sub(width.saturating_sub(1)));
        line(frame, r, truncate(visible, width), Style::default());

        let x = r.x + caret.saturating_sub(dropped).min(width.saturating_sub(1)) as u16;
        frame.set_cursor_position(Position::new(x, r.y));
        return;
    }

    let (text, style) = match &snap.message {
        Some(m) => (m.as_str(), Style::default().add_modifier(Modifier::ITALIC)),
        None => ("? help", Style::default().add_modifier(Modifier::DIM)),
    };
    line(frame, r, truncate(text, width), style);
}
