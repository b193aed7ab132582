//! Clip editor screen.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Clear, Paragraph},
};

use super::bars::{format_time, truncate};

pub struct ClipView<'a> {
    pub title: &'a str,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub position: f64,
    pub editing_end: bool,
    pub playing: bool,
}

/// One cell per column: `─` outside the clip, `━` inside it and `┃` at the
/// playhead.
pub fn clip_track(view: &ClipView, width: usize) -> String {
    if width == 0 || view.duration <= 0.0 {
        return "─".repeat(width);
    }
    let cell = |t: f64| (((t / view.duration) * width as f64) as usize).min(width - 1);
    let (lo, hi, head) = (cell(view.start), cell(view.end), cell(view.position));
    (0..width)
        .map(|i| {
            if i == head {
                '┃'
            } else if (lo..=hi).contains(&i) {
                '━'
            } else {
                '─'
            }
        })
        .collect()
}

pub fn clip_bounds_text(view: &ClipView) -> String {
    let mark = |on: bool| if on { ">" } else { " " };
    format!(
        "{}start {}  {}end {}  len {}  at {}",
        mark(!view.editing_end),
        format_time(view.start),
        mark(view.editing_end),
        format_time(view.end),
        format_time(view.end - view.start),
        format_time(view.position),
    )
}

pub fn draw_clip_editor(frame: &mut Frame, view: &ClipView) {
    let area = frame.area();
    frame.render_widget(Clear, area);
    let width = usize::from(area.width);
    let state = if view.playing { "▶" } else { "⏸" };

    let lines = vec![
        Line::styled(
            truncate(&format!("{state} {}", view.title), width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(clip_track(view, width)),
        Line::from(truncate(&clip_bounds_text(view), width)),
        Line::styled(
            truncate("←/→ nudge  shift ×10  t start/end  space play  enter save  q cancel", width),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];
    let rows = area.height.min(lines.len() as u16);
    frame.render_widget(Paragraph::new(lines), Rect { height: rows, ..area });
}
