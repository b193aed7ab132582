//! Everything the event loop waits on arrives as a [`LoopEvent`] on one
//! channel: terminal input, remote control, and the frame timer (as a
//! receive timeout).

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tracing::{debug, warn};

use crate::mpris::ControlCmd;
use crate::workers::StopFlag;

#[derive(Debug)]
pub enum LoopEvent {
    Key(KeyEvent),
    Resize,
    Remote(ControlCmd),
    /// The terminal stopped delivering events.
    InputFailed(String),
}

/// Read terminal events until `stop` is raised.
pub fn spawn_input(tx: Sender<LoopEvent>, stop: StopFlag) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("input".into()).spawn(move || {
        while !stop.is_stopped() {
            let ready = match event::poll(Duration::from_millis(100)) {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(LoopEvent::InputFailed(e.to_string()));
                    break;
                }
            };
            if !ready {
                continue;
            }
            let out = match event::read() {
                Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => LoopEvent::Key(k),
                Ok(Event::Resize(..)) => LoopEvent::Resize,
                Ok(_) => continue,
                Err(e) => LoopEvent::InputFailed(e.to_string()),
            };
            let failed = matches!(out, LoopEvent::InputFailed(_));
            if tx.send(out).is_err() || failed {
                break;
            }
        }
        debug!("input thread exiting");
    })
}

/// Forward remote-control commands into the loop channel.
pub fn forward_remote(rx: Receiver<ControlCmd>, tx: Sender<LoopEvent>) {
    let spawned = thread::Builder::new()
        .name("remote".into())
        .spawn(move || {
            for cmd in rx {
                if tx.send(LoopEvent::Remote(cmd)).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "remote control unavailable");
    }
}

/// Split `first` plus whatever is already queued into the key burst and
/// the other events, preserving the order of each.
pub fn drain_burst(first: KeyEvent, rx: &Receiver<LoopEvent>) -> (Vec<KeyEvent>, Vec<LoopEvent>) {
    let mut keys = vec![first];
    let mut rest = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        match ev {
            LoopEvent::Key(k) => keys.push(k),
            other => rest.push(other),
        }
    }
    (keys, rest)
}

/// Whether key `index` of a burst of `len` keys is applied. With
/// coalescing on, normal mode only acts on the last key; prompt typing
/// always goes through.
pub fn applies(index: usize, len: usize, prompt_open: bool, coalesce: bool) -> bool {
    !coalesce || prompt_open || index + 1 == len
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn burst_keeps_other_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(LoopEvent::Key(key('b'))).unwrap();
        tx.send(LoopEvent::Remote(ControlCmd::Next)).unwrap();
        tx.send(LoopEvent::Key(key('c'))).unwrap();

        let (keys, rest) = drain_burst(key('a'), &rx);
        let chars: Vec<KeyCode> = keys.iter().map(|k| k.code).collect();
        assert_eq!(chars, vec![KeyCode::Char('a'), KeyCode::Char('b'), KeyCode::Char('c')]);
        assert!(matches!(rest.as_slice(), [LoopEvent::Remote(ControlCmd::Next)]));
    }

    #[test]
    fn coalescing_applies_only_the_last_key() {
        let applied: Vec<usize> = (0..3).filter(|&i| applies(i, 3, false, true)).collect();
        assert_eq!(applied, vec![2]);
    }

    #[test]
    fn prompt_and_disabled_coalescing_apply_everything() {
        assert!((0..3).all(|i| applies(i, 3, true, true)));
        assert!((0..3).all(|i| applies(i, 3, false, false)));
    }
}
