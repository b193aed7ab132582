//! Applying [`Action`]s to the session.

use tracing::debug;

use crate::catalog::fuzzy_match_positions;
use crate::engine::PlaybackEngine;

use super::action::Action;
use super::model::Session;
use super::prompt::{Prompt, PromptEdit, PromptKind};
use super::queue::Direction;
use super::state::{Effect, Feature, Focus, Transition};

impl<E: PlaybackEngine> Session<E> {
    /// Apply one action. Returns `true` when anything visible may have
    /// changed and a redraw is due.
    pub fn apply(&mut self, action: Action) -> bool {
        if self.finished {
            return false;
        }
        debug!(?action, "apply");
        match action {
            Action::Quit => {
                self.last_transition = Some(Transition::End);
                self.finish();
            }

            Action::CursorUp => self.queue.scroll(-1),
            Action::CursorDown => self.queue.scroll(1),
            Action::PageUp => self.queue.scroll(-(self.page() as isize)),
            Action::PageDown => self.queue.scroll(self.page() as isize),
            Action::Top => self.queue.select(0),
            Action::Bottom => self.queue.select(self.queue.len().saturating_sub(1)),
            Action::PlaySelected => self.jump_to(self.queue.cursor()),
            Action::DeleteSelected => self.delete_selected(),
            Action::MoveUp => self.move_selected(Direction::Up),
            Action::MoveDown => self.move_selected(Direction::Down),
            Action::SnapToPlaying => self.queue.snap_to_current(),

            Action::TogglePause => self.toggle_pause(),
            Action::Play => self.resume(),
            Action::Pause => self.pause(),
            Action::Stop => self.stop(),
            Action::Next => self.next(),
            Action::Prev => self.prev(),
            Action::Restart => self.restart(),
            Action::SeekBy(d) => self.seek_by(d),
            Action::SeekTo(p) => self.seek_to(p),
            Action::ScrubForward => self.scrub_forward(),
            Action::ScrubBack => self.scrub_back(),

            Action::VolumeUp => self.change_volume(1),
            Action::VolumeDown => self.change_volume(-1),
            Action::SetVolume(v) => self.set_volume(v),
            Action::ToggleMute => self.toggle_mute(),
            Action::CycleRepeat => self.cycle_repeat(),
            Action::ToggleClipMode => self.toggle_clip_mode(),
            Action::ToggleEnding => self.toggle_ending(),
            Action::NextLap => self.next_lap(),
            Action::Toggle(f) => self.toggle_feature(f),
            Action::SwitchFocus => self.switch_focus(),
            Action::ToggleHelp => self.help = !self.help,

            Action::LyricsUp => self.scroll_lyrics(-1),
            Action::LyricsDown => self.scroll_lyrics(1),
            Action::LyricsSeek => self.seek_to_lyric(),

            Action::OpenPrompt(kind) => {
                self.help = false;
                self.prompt = Some(Prompt::new(kind));
            }
            Action::Prompt(edit) => self.edit_prompt(edit),
        }
        true
    }

    fn page(&self) -> usize {
        self.queue.view().window().max(1)
    }

    /// Delete the entry under the cursor. Deleting the playing entry moves
    /// on as if the track had ended.
    pub(super) fn delete_selected(&mut self) {
        let pos = self.queue.cursor();
        if pos >= self.queue.len() {
            return;
        }
        if pos == self.queue.current() {
            self.account_listen();
        }
        let Some(removed) = self.queue.delete(pos) else {
            return;
        };
        self.effects.push(Effect::QueueChanged);
        debug!(id = removed.id, pos, "deleted from queue");

        if self.queue.is_empty() {
            self.notify("queue is empty");
            self.finish();
            return;
        }
        if !removed.was_current {
            return;
        }

        self.last_transition = Some(Transition::Delete);
        if removed.was_tail && !self.wrap_queue() {
            self.finish();
            return;
        }
        self.load_current();
    }

    fn move_selected(&mut self, dir: Direction) {
        if self.queue.move_entry(self.queue.cursor(), dir).is_some() {
            self.effects.push(Effect::QueueChanged);
        }
    }

    fn toggle_feature(&mut self, f: Feature) {
        let on = self.features.toggle(f);
        if !self.features.lyrics && self.focus == Focus::Lyrics {
            self.focus = Focus::Queue;
        }
        self.effects.push(Effect::FeatureToggled(f, on));
        self.notify(format!("{} {}", f.label(), if on { "on" } else { "off" }));
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Queue if self.features.lyrics && self.lyrics.is_some() => Focus::Lyrics,
            Focus::Queue => {
                self.notify("no lyrics to focus");
                Focus::Queue
            }
            Focus::Lyrics => Focus::Queue,
        };
    }

    fn scroll_lyrics(&mut self, delta: isize) {
        self.lyric_follow = false;
        self.lyric_view.scroll(delta);
    }

    /// Jump playback to the selected time-tagged lyric line and resume
    /// following playback.
    fn seek_to_lyric(&mut self) {
        let cursor = self.lyric_view.cursor();
        let Some(t) = self.lyrics.as_ref().and_then(|l| l.time_of(cursor)) else {
            self.notify("lyrics are not time-tagged");
            return;
        };
        self.seek_raw(t);
        self.lyric_follow = true;
    }

    fn edit_prompt(&mut self, edit: PromptEdit) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match edit {
            PromptEdit::Cancel => self.prompt = None,
            PromptEdit::Submit => {
                let kind = prompt.kind;
                let text = prompt.buffer().trim().to_string();
                if self.commit_prompt(kind, &text) {
                    self.prompt = None;
                }
            }
            other => prompt.edit(other),
        }
    }

    /// Returns `true` when the prompt should close.
    fn commit_prompt(&mut self, kind: PromptKind, text: &str) -> bool {
        if text.is_empty() {
            self.notify(format!("{}: nothing entered", kind.label()));
            return false;
        }
        match kind {
            PromptKind::Insert | PromptKind::Append => {
                let id = match self.catalog.lookup(text) {
                    Ok(id) => id,
                    Err(e) => {
                        self.notify(e.to_string());
                        return false;
                    }
                };
                let was_empty = self.queue.is_empty();
                if kind == PromptKind::Insert && !was_empty {
                    self.queue.insert(self.queue.cursor() + 1, id);
                } else {
                    self.queue.append(id);
                }
                self.effects.push(Effect::QueueChanged);
                let title = self
                    .catalog
                    .get(id)
                    .map(|t| t.display())
                    .unwrap_or_default();
                self.notify(format!("queued {title}"));
                true
            }
            PromptKind::Tag => {
                let tags: Vec<String> = text
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                if tags.is_empty() {
                    self.notify("tag: nothing entered");
                    return false;
                }
                let ids = self.queue.items().to_vec();
                let mut tagged = 0;
                for id in ids {
                    if let Some(track) = self.catalog.get_mut(id) {
                        track.tags.extend(tags.iter().cloned());
                        tagged += 1;
                    }
                }
                self.notify(format!("tagged {tagged} tracks with {}", tags.join(", ")));
                true
            }
            PromptKind::Find => match self.find_in_queue(text) {
                Some(pos) => {
                    self.queue.select(pos);
                    true
                }
                None => {
                    self.notify(format!("no queued track matches \"{text}\""));
                    false
                }
            },
        }
    }

    /// First queue position after the cursor (wrapping) whose track matches
    /// `query` by id, title or fuzzy display match.
    fn find_in_queue(&self, query: &str) -> Option<usize> {
        let len = self.queue.len();
        let by_id = query.parse::<u32>().ok();
        (1..=len)
            .map(|off| (self.queue.cursor() + off) % len)
            .find(|&pos| {
                let Some(id) = self.queue.get(pos) else {
                    return false;
                };
                if by_id == Some(id) {
                    return true;
                }
                self.catalog.get(id).is_some_and(|t| {
                    t.title.eq_ignore_ascii_case(query)
                        || fuzzy_match_positions(&t.display(), query).is_some()
                })
            })
    }
}
