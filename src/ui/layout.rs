//! Row and column budgeting. Lower-priority panes are dropped first when the
//! terminal is small.

use ratatui::layout::Rect;

use crate::session::Focus;

/// Narrower than this and the progress bar is left out.
pub const MIN_PROGRESS_WIDTH: u16 = 24;
/// Narrower than this and the volume bar is left out.
pub const MIN_VOLUME_WIDTH: u16 = 60;
/// Queue and lyrics sit side by side from this width on.
pub const MIN_SPLIT_WIDTH: u16 = 80;
/// The spectrum pane never squeezes the queue below this many rows.
const MIN_QUEUE_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOpts {
    pub lyrics: bool,
    pub focus: Focus,
    pub visualize: bool,
    pub visualizer_rows: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panes {
    pub status: Option<Rect>,
    pub queue: Option<Rect>,
    pub lyrics: Option<Rect>,
    pub spectrum: Option<Rect>,
    pub now_playing: Option<Rect>,
    pub progress: Option<Rect>,
    pub bottom: Option<Rect>,
}

impl Panes {
    pub fn compute(area: Rect, opts: LayoutOpts) -> Self {
        let mut left = area.height;
        let mut take = || {
            let ok = left > 0;
            left = left.saturating_sub(1);
            ok
        };
        let has_now_playing = take();
        let has_status = take();
        let has_bottom = take();
        let has_progress = take();

        let middle = left;
        let spectrum_rows = if opts.visualize
            && opts.visualizer_rows > 0
            && middle >= opts.visualizer_rows + MIN_QUEUE_ROWS
        {
            opts.visualizer_rows
        } else {
            0
        };
        let list_rows = middle - spectrum_rows;

        let mut y = area.y;
        let mut row = |height: u16, present: bool| {
            if !present || height == 0 {
                return None;
            }
            let r = Rect::new(area.x, y, area.width, height);
            y += height;
            Some(r)
        };

        let status = row(1, has_status);
        let list = row(list_rows, true);
        let spectrum = row(spectrum_rows, true);
        let now_playing = row(1, has_now_playing);
        let progress = row(1, has_progress);
        let bottom = row(1, has_bottom);

        let (queue, lyrics) = match list {
            Some(list) if opts.lyrics => split_list(list, opts.focus),
            other => (other, None),
        };

        Self {
            status,
            queue,
            lyrics,
            spectrum,
            now_playing,
            progress,
            bottom,
        }
    }

    /// Visible rows of the queue and lyric panes, for the session's
    /// scrollers.
    pub fn list_rows(&self) -> (usize, usize) {
        let h = |r: Option<Rect>| r.map_or(0, |r| usize::from(r.height));
        (h(self.queue), h(self.lyrics))
    }
}

fn split_list(list: Rect, focus: Focus) -> (Option<Rect>, Option<Rect>) {
    if list.width >= MIN_SPLIT_WIDTH {
        let queue_w = list.width / 2;
        let queue = Rect::new(list.x, list.y, queue_w, list.height);
        let lyrics = Rect::new(list.x + queue_w, list.y, list.width - queue_w, list.height);
        return (Some(queue), Some(lyrics));
    }
    match focus {
        Focus::Queue => (Some(list), None),
        Focus::Lyrics => (None, Some(list)),
    }
}
