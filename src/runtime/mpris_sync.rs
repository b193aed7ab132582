use crate::mpris::ControlCmd;
use crate::session::Action;

/// Session action for a command received over the bus. Positions arrive
/// in microseconds.
pub fn control_action(cmd: ControlCmd) -> Action {
    match cmd {
        ControlCmd::Quit => Action::Quit,
        ControlCmd::Play => Action::Play,
        ControlCmd::Pause => Action::Pause,
        ControlCmd::PlayPause => Action::TogglePause,
        ControlCmd::Stop => Action::Stop,
        ControlCmd::Next => Action::Next,
        ControlCmd::Prev => Action::Prev,
        ControlCmd::Seek(us) => Action::SeekBy(us as f64 / 1_000_000.0),
        ControlCmd::SetPosition(us) => Action::SeekTo(us as f64 / 1_000_000.0),
    }
}
