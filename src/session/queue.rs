//! The play queue: ordered track ids, the now-playing index and the
//! selection viewport.
//!
//! All index rebasing lives here. Callers never adjust `current` or the
//! cursor by hand after a mutation.

use crate::catalog::TrackId;

use super::scroller::Scroller;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of [`Queue::delete`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Removed {
    pub id: TrackId,
    /// The deleted entry was the one playing. `current` now points at the
    /// entry that followed it (or the new last entry, see `was_tail`).
    pub was_current: bool,
    /// The deleted playing entry was the last one.
    pub was_tail: bool,
}

#[derive(Debug, Clone)]
pub struct Queue {
    items: Vec<TrackId>,
    current: usize,
    view: Scroller,
    /// Unshuffled copy of every queued id, used to build new laps.
    origin: Vec<TrackId>,
}

impl Queue {
    /// `origin` is the unshuffled order; `items` the order to play.
    pub fn new(origin: Vec<TrackId>, items: Vec<TrackId>) -> Self {
        let view = Scroller::new(items.len(), 0);
        Self {
            items,
            current: 0,
            view,
            origin,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[TrackId] {
        &self.items
    }

    pub fn origin(&self) -> &[TrackId] {
        &self.origin
    }

    pub fn get(&self, pos: usize) -> Option<TrackId> {
        self.items.get(pos).copied()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_id(&self) -> Option<TrackId> {
        self.get(self.current)
    }

    pub fn cursor(&self) -> usize {
        self.view.cursor()
    }

    pub fn selected_id(&self) -> Option<TrackId> {
        self.get(self.cursor())
    }

    pub fn view(&self) -> &Scroller {
        &self.view
    }

    /// Up to `n` ids starting at the playing entry.
    pub fn upcoming(&self, n: usize) -> Vec<TrackId> {
        self.items.iter().skip(self.current).take(n).copied().collect()
    }

    /// Insert `id` at `pos` (clamped to the end). Entries at or after `pos`
    /// shift down, and so do `current` and the cursor when they pointed there.
    pub fn insert(&mut self, pos: usize, id: TrackId) {
        let was_empty = self.items.is_empty();
        let pos = pos.min(self.items.len());
        self.items.insert(pos, id);
        self.origin.push(id);

        if !was_empty && pos <= self.current {
            self.current += 1;
        }
        let mut cursor = self.view.cursor();
        if !was_empty && pos <= cursor {
            cursor += 1;
        }
        self.view.set_total(self.items.len());
        self.view.set_cursor(cursor);
    }

    pub fn append(&mut self, id: TrackId) {
        self.insert(self.items.len(), id);
    }

    /// Remove the entry at `pos`, rebasing `current` and the cursor.
    pub fn delete(&mut self, pos: usize) -> Option<Removed> {
        if pos >= self.items.len() {
            return None;
        }
        let id = self.items.remove(pos);
        if let Some(o) = self.origin.iter().position(|&x| x == id) {
            self.origin.remove(o);
        }

        let was_current = pos == self.current;
        let mut was_tail = false;
        if pos < self.current {
            self.current -= 1;
        } else if was_current && self.current >= self.items.len() {
            was_tail = true;
            self.current = self.items.len().saturating_sub(1);
        }

        let mut cursor = self.view.cursor();
        if pos < cursor {
            cursor -= 1;
        }
        self.view.set_total(self.items.len());
        self.view.set_cursor(cursor);

        Some(Removed {
            id,
            was_current,
            was_tail,
        })
    }

    /// Swap the entry at `pos` with its neighbour. `current` follows the
    /// playing track and the cursor follows the moved entry.
    pub fn move_entry(&mut self, pos: usize, dir: Direction) -> Option<usize> {
        let target = match dir {
            Direction::Up => pos.checked_sub(1)?,
            Direction::Down => pos + 1,
        };
        if pos >= self.items.len() || target >= self.items.len() {
            return None;
        }
        self.items.swap(pos, target);

        if self.current == pos {
            self.current = target;
        } else if self.current == target {
            self.current = pos;
        }
        if self.view.cursor() == pos {
            self.view.set_cursor(target);
        }
        Some(target)
    }

    /// Make `pos` the playing entry.
    pub fn set_current(&mut self, pos: usize) -> bool {
        if pos < self.items.len() {
            self.current = pos;
            true
        } else {
            false
        }
    }

    /// Step to the next entry; `false` at the tail.
    pub fn advance(&mut self) -> bool {
        self.set_current(self.current + 1)
    }

    /// Step to the previous entry; `false` at the head.
    pub fn retreat(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(p) => self.set_current(p),
            None => false,
        }
    }

    /// Replace the queue with a new lap and start it from the top.
    pub fn replace_with_lap(&mut self, items: Vec<TrackId>) {
        self.items = items;
        self.current = 0;
        self.view.set_total(self.items.len());
        self.view.set_cursor(0);
    }

    pub fn scroll(&mut self, delta: isize) {
        self.view.scroll(delta);
    }

    pub fn select(&mut self, pos: usize) {
        self.view.set_cursor(pos);
    }

    pub fn snap_to_current(&mut self) {
        self.view.set_cursor(self.current);
    }

    pub fn resize(&mut self, window: usize) {
        if window != self.view.window() {
            self.view.resize(window);
        }
    }
}
