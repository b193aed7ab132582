use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

/// Key bindings shown by the help overlay, in display order.
pub const BINDINGS: &[(&str, &str)] = &[
    ("j/k ↓/↑", "move cursor"),
    ("PgUp/PgDn g/G", "page, top/bottom"),
    ("enter", "play selected / seek to lyric"),
    ("space", "play/pause"),
    ("n/p", "next/previous track"),
    ("r", "restart track"),
    ("←/→", "scrub back/forward"),
    ("+/-", "volume up/down"),
    ("m", "mute"),
    ("R", "cycle repeat"),
    ("c", "clip mode"),
    ("e", "end after this track"),
    ("N", "next shuffled lap"),
    ("d", "delete selected"),
    ("J/K", "move selected down/up"),
    (".", "jump to now playing"),
    ("i/a", "insert/append track"),
    ("t", "tag queued tracks"),
    ("/", "find in queue"),
    ("v s D", "visualizer, stream, discord"),
    ("y/Y", "lyrics, translated lyrics"),
    ("tab", "switch queue/lyrics focus"),
    ("?", "close help"),
    ("q", "quit"),
];

fn popup_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

/// Centered overlay; whatever part of the list does not fit is cut off.
pub fn draw_help(frame: &mut Frame, area: Rect) {
    let key_w = BINDINGS.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(k, v)| Line::from(format!("{k:<key_w$}  {v}")))
        .collect();

    let popup = popup_rect(56, lines.len() as u16 + 2, area);
    if popup.width < 10 || popup.height < 3 {
        return;
    }
    frame.render_widget(Clear, popup);
    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" keys ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(help, popup);
}
