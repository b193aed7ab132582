//! Windowed cursor over a list longer than the visible area.

use std::ops::Range;

/// Viewport state: `total` items, `window` visible rows, an absolute
/// `cursor`, and the index of the first visible row (`top`).
///
/// Invariants (whenever `total > 0` and `window > 0`):
/// - `cursor < total`
/// - `top <= total.saturating_sub(window)`
/// - `top <= cursor < top + window`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scroller {
    total: usize,
    window: usize,
    cursor: usize,
    top: usize,
}

impl Scroller {
    pub fn new(total: usize, window: usize) -> Self {
        let mut s = Self {
            total,
            window,
            cursor: 0,
            top: 0,
        };
        s.recenter();
        s
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn top(&self) -> usize {
        self.top
    }

    /// Absolute indices of the visible rows.
    pub fn visible(&self) -> Range<usize> {
        self.top..(self.top + self.window).min(self.total)
    }

    /// Change the number of visible rows, recentering on the cursor.
    pub fn resize(&mut self, window: usize) {
        self.window = window;
        self.recenter();
    }

    /// The list grew or shrank; keep the cursor on a valid row.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.cursor = self.cursor.min(total.saturating_sub(1));
        self.follow();
    }

    /// Move the cursor by `delta` rows, clamped to the list.
    pub fn scroll(&mut self, delta: isize) {
        let target = self.cursor.saturating_add_signed(delta);
        self.set_cursor(target);
    }

    /// Jump the cursor to `pos` (clamped).
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.total.saturating_sub(1));
        self.follow();
    }

    fn max_top(&self) -> usize {
        self.total.saturating_sub(self.window)
    }

    fn recenter(&mut self) {
        self.top = self
            .cursor
            .saturating_sub(self.window / 2)
            .min(self.max_top());
    }

    /// Recenter only when the cursor leaves the middle half of the window,
    /// so single steps inside the band never move the view.
    fn follow(&mut self) {
        if self.window == 0 {
            self.top = 0;
            return;
        }
        let margin = self.window / 4;
        let band_lo = self.top + margin;
        let band_hi = self.top + self.window - 1 - margin;
        if self.cursor < band_lo || self.cursor > band_hi || self.top > self.max_top() {
            self.recenter();
        }
    }
}
