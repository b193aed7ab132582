//! Key map: raw key events to session [`Action`]s, by mode and focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::{Action, Feature, Focus, PromptEdit, PromptKind};

/// What the session looks like to the key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub prompt_open: bool,
    pub help: bool,
    pub focus: Focus,
}

pub fn map_key(key: KeyEvent, cx: KeyContext) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(if cx.prompt_open {
            Action::Prompt(PromptEdit::Cancel)
        } else {
            Action::Quit
        });
    }
    if cx.prompt_open {
        return prompt_key(key).map(Action::Prompt);
    }
    if cx.help && matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
        return Some(Action::ToggleHelp);
    }

    let lyrics = cx.focus == Focus::Lyrics;
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,

        KeyCode::Char('j') | KeyCode::Down if lyrics => Action::LyricsDown,
        KeyCode::Char('k') | KeyCode::Up if lyrics => Action::LyricsUp,
        KeyCode::Enter if lyrics => Action::LyricsSeek,
        KeyCode::Char('j') | KeyCode::Down => Action::CursorDown,
        KeyCode::Char('k') | KeyCode::Up => Action::CursorUp,
        KeyCode::Enter => Action::PlaySelected,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Action::Top,
        KeyCode::Char('G') | KeyCode::End => Action::Bottom,
        KeyCode::Char('d') | KeyCode::Delete => Action::DeleteSelected,
        KeyCode::Char('J') => Action::MoveDown,
        KeyCode::Char('K') => Action::MoveUp,
        KeyCode::Char('.') => Action::SnapToPlaying,

        KeyCode::Char(' ') => Action::TogglePause,
        KeyCode::Char('n') => Action::Next,
        KeyCode::Char('p') => Action::Prev,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left => Action::ScrubBack,
        KeyCode::Right => Action::ScrubForward,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,
        KeyCode::Char('m') => Action::ToggleMute,
        KeyCode::Char('R') => Action::CycleRepeat,
        KeyCode::Char('c') => Action::ToggleClipMode,
        KeyCode::Char('e') => Action::ToggleEnding,
        KeyCode::Char('N') => Action::NextLap,

        KeyCode::Char('v') => Action::Toggle(Feature::Visualize),
        KeyCode::Char('s') => Action::Toggle(Feature::Stream),
        KeyCode::Char('D') => Action::Toggle(Feature::Discord),
        KeyCode::Char('y') => Action::Toggle(Feature::Lyrics),
        KeyCode::Char('Y') => Action::Toggle(Feature::TranslatedLyrics),
        KeyCode::Tab => Action::SwitchFocus,
        KeyCode::Char('?') => Action::ToggleHelp,

        KeyCode::Char('i') => Action::OpenPrompt(PromptKind::Insert),
        KeyCode::Char('a') => Action::OpenPrompt(PromptKind::Append),
        KeyCode::Char('t') => Action::OpenPrompt(PromptKind::Tag),
        KeyCode::Char('/') => Action::OpenPrompt(PromptKind::Find),
        _ => return None,
    };
    Some(action)
}

fn prompt_key(key: KeyEvent) -> Option<PromptEdit> {
    let edit = match key.code {
        KeyCode::Char(c) if !c.is_control() => PromptEdit::Char(c),
        KeyCode::Backspace => PromptEdit::Backspace,
        KeyCode::Delete => PromptEdit::Delete,
        KeyCode::Left => PromptEdit::Left,
        KeyCode::Right => PromptEdit::Right,
        KeyCode::Home => PromptEdit::Home,
        KeyCode::End => PromptEdit::End,
        KeyCode::Enter => PromptEdit::Submit,
        KeyCode::Esc => PromptEdit::Cancel,
        _ => return None,
    };
    Some(edit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    const NORMAL: KeyContext = KeyContext {
        prompt_open: false,
        help: false,
        focus: Focus::Queue,
    };

    #[test]
    fn navigation_follows_focus() {
        assert_eq!(map_key(key(KeyCode::Char('j')), NORMAL), Some(Action::CursorDown));
        assert_eq!(map_key(key(KeyCode::Enter), NORMAL), Some(Action::PlaySelected));

        let lyrics = KeyContext {
            focus: Focus::Lyrics,
            ..NORMAL
        };
        assert_eq!(map_key(key(KeyCode::Down), lyrics), Some(Action::LyricsDown));
        assert_eq!(map_key(key(KeyCode::Enter), lyrics), Some(Action::LyricsSeek));
        // Transport keys work regardless of focus.
        assert_eq!(map_key(key(KeyCode::Char(' ')), lyrics), Some(Action::TogglePause));
    }

    #[test]
    fn prompt_captures_letters() {
        let cx = KeyContext {
            prompt_open: true,
            ..NORMAL
        };
        assert_eq!(
            map_key(key(KeyCode::Char('q')), cx),
            Some(Action::Prompt(PromptEdit::Char('q')))
        );
        assert_eq!(map_key(key(KeyCode::Esc), cx), Some(Action::Prompt(PromptEdit::Cancel)));
        assert_eq!(map_key(key(KeyCode::Enter), cx), Some(Action::Prompt(PromptEdit::Submit)));
        assert_eq!(map_key(key(KeyCode::Tab), cx), None);
    }

    #[test]
    fn ctrl_c_quits_or_cancels() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, NORMAL), Some(Action::Quit));
        let cx = KeyContext {
            prompt_open: true,
            ..NORMAL
        };
        assert_eq!(map_key(ctrl_c, cx), Some(Action::Prompt(PromptEdit::Cancel)));
    }

    #[test]
    fn escape_closes_help() {
        let cx = KeyContext { help: true, ..NORMAL };
        assert_eq!(map_key(key(KeyCode::Esc), cx), Some(Action::ToggleHelp));
        assert_eq!(map_key(key(KeyCode::Esc), NORMAL), None);
    }

    #[test]
    fn shifted_letters_are_distinct() {
        assert_eq!(map_key(key(KeyCode::Char('r')), NORMAL), Some(Action::Restart));
        assert_eq!(map_key(key(KeyCode::Char('R')), NORMAL), Some(Action::CycleRepeat));
        assert_eq!(
            map_key(key(KeyCode::Char('D')), NORMAL),
            Some(Action::Toggle(Feature::Discord))
        );
    }
}
