//! Single-line text prompt with a cursor offset.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Insert a track after the selected entry.
    Insert,
    /// Append a track to the end of the queue.
    Append,
    /// Add comma-separated tags to every queued track.
    Tag,
    /// Move the cursor to a matching queued track.
    Find,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Append => "append",
            Self::Tag => "tag",
            Self::Find => "find",
        }
    }
}

/// Edits applied to an open prompt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PromptEdit {
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    buffer: String,
    /// Offset in characters, `0..=buffer.chars().count()`.
    cursor: usize,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
            cursor: 0,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_at(&self, char_pos: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_pos)
            .map_or(self.buffer.len(), |(b, _)| b)
    }

    /// Apply a text edit. `Submit`/`Cancel` are handled by the session.
    pub fn edit(&mut self, edit: PromptEdit) {
        match edit {
            PromptEdit::Char(c) => {
                let at = self.byte_at(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            }
            PromptEdit::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_at(self.cursor);
                    self.buffer.remove(at);
                }
            }
            PromptEdit::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_at(self.cursor);
                    self.buffer.remove(at);
                }
            }
            PromptEdit::Left => self.cursor = self.cursor.saturating_sub(1),
            PromptEdit::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            PromptEdit::Home => self.cursor = 0,
            PromptEdit::End => self.cursor = self.char_count(),
            PromptEdit::Submit | PromptEdit::Cancel => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(kind: PromptKind, s: &str) -> Prompt {
        let mut p = Prompt::new(kind);
        for c in s.chars() {
            p.edit(PromptEdit::Char(c));
        }
        p
    }

    #[test]
    fn edits_happen_at_the_cursor() {
        let mut p = typed(PromptKind::Find, "helo");
        p.edit(PromptEdit::Left);
        p.edit(PromptEdit::Char('l'));
        assert_eq!(p.buffer(), "hello");
        assert_eq!(p.cursor(), 4);

        p.edit(PromptEdit::Home);
        p.edit(PromptEdit::Delete);
        assert_eq!(p.buffer(), "ello");
        p.edit(PromptEdit::Backspace);
        assert_eq!(p.buffer(), "ello");

        p.edit(PromptEdit::End);
        p.edit(PromptEdit::Backspace);
        assert_eq!(p.buffer(), "ell");
        p.edit(PromptEdit::Right);
        assert_eq!(p.cursor(), 3);
    }

    #[test]
    fn multibyte_characters_are_one_step() {
        let mut p = typed(PromptKind::Tag, "añb");
        p.edit(PromptEdit::Left);
        p.edit(PromptEdit::Backspace);
        assert_eq!(p.buffer(), "ab");
        assert_eq!(p.cursor(), 1);
    }
}
