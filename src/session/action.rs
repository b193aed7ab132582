use super::prompt::{PromptEdit, PromptKind};
use super::state::Feature;

/// A session mutation, produced by the key map or by remote control.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Action {
    Quit,

    // Queue pane
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    PlaySelected,
    DeleteSelected,
    MoveUp,
    MoveDown,
    SnapToPlaying,

    // Transport
    TogglePause,
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    Restart,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// Absolute seek, in displayed seconds (clip-relative in clip mode).
    SeekTo(f64),
    ScrubForward,
    ScrubBack,

    VolumeUp,
    VolumeDown,
    /// Absolute volume, 0-100.
    SetVolume(u8),
    ToggleMute,
    CycleRepeat,
    ToggleClipMode,
    ToggleEnding,
    NextLap,
    Toggle(Feature),
    SwitchFocus,
    ToggleHelp,

    // Lyrics pane
    LyricsUp,
    LyricsDown,
    LyricsSeek,

    OpenPrompt(PromptKind),
    Prompt(PromptEdit),
}
