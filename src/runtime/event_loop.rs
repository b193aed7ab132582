use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use ratatui::{Terminal, backend::Backend, layout::Rect};
use tracing::{debug, error};

use crate::config::Settings;
use crate::engine::PlaybackEngine;
use crate::error::{Error, Result};
use crate::session::{Action, Session};
use crate::ui::{self, FrameInput, LayoutOpts, Panes};

use super::input::{LoopEvent, applies, drain_burst};
use super::keys::{KeyContext, map_key};
use super::mpris_sync::control_action;
use super::services::Services;

/// Longest wait between redraws.
const MAX_FRAME: Duration = Duration::from_millis(500);

/// How long to wait for input before the next redraw: one progress-bar
/// eighth-cell of playback, or one visualizer frame when that is sooner,
/// never faster than `max_fps`.
pub fn frame_interval(width: u16, duration: f64, visualizer_fps: Option<u32>, max_fps: u32) -> Duration {
    let mut secs = MAX_FRAME.as_secs_f64();
    if width > 0 && duration > 0.0 {
        secs = secs.min(duration / (f64::from(width) * 8.0));
    }
    if let Some(fps) = visualizer_fps.filter(|&f| f > 0) {
        secs = secs.min(1.0 / f64::from(fps));
    }
    let floor = 1.0 / f64::from(max_fps.max(1));
    Duration::from_secs_f64(secs.max(floor))
}

/// Main loop: tick the session, hand its effects to the services, draw,
/// then wait for the next event or frame. Returns once the session
/// finishes. The session is finished on return even when the terminal
/// failed, so listening time is always credited.
pub fn run<B: Backend, E: PlaybackEngine>(
    terminal: &mut Terminal<B>,
    settings: &Settings,
    session: &mut Session<E>,
    services: &mut Services,
    events: &Receiver<LoopEvent>,
) -> Result<()> {
    let out = drive(terminal, settings, session, services, events);
    if !session.is_finished() {
        session.finish();
        for effect in session.take_effects() {
            services.apply(effect, session);
        }
    }
    out
}

fn drive<B: Backend, E: PlaybackEngine>(
    terminal: &mut Terminal<B>,
    settings: &Settings,
    session: &mut Session<E>,
    services: &mut Services,
    events: &Receiver<LoopEvent>,
) -> Result<()> {
    let listen_url = settings.stream.listen_url.clone();
    loop {
        let size = terminal.size().map_err(|e| Error::Terminal(e.to_string()))?;
        let features = session.features();
        let opts = LayoutOpts {
            lyrics: features.lyrics,
            focus: session.focus(),
            visualize: features.visualize,
            visualizer_rows: settings.ui.visualizer_rows,
        };
        let area = Rect::new(0, 0, size.width, size.height);
        let (queue_rows, lyric_rows) = Panes::compute(area, opts).list_rows();
        session.resize(queue_rows, lyric_rows);

        session.tick();
        for effect in session.take_effects() {
            services.apply(effect, session);
        }
        services.publish(session);

        let snapshot = session.snapshot();
        let analysis = session
            .queue()
            .current_id()
            .filter(|_| snapshot.features.visualize)
            .and_then(|id| services.analysis(id));
        let position = session.engine().position();
        let input = FrameInput {
            snapshot: &snapshot,
            lights: services.lights(),
            spectrum: analysis.as_ref().and_then(|a| a.frame_at(position)),
            listen_url: listen_url.as_deref(),
            visualizer_rows: settings.ui.visualizer_rows,
        };
        terminal
            .draw(|f| ui::draw(f, &input))
            .map_err(|e| Error::Terminal(e.to_string()))?;

        if session.is_finished() {
            debug!("session finished");
            return Ok(());
        }

        let fps = snapshot
            .features
            .visualize
            .then_some(settings.visualizer.fps);
        let wait = frame_interval(size.width, snapshot.duration, fps, settings.ui.max_fps);
        match events.recv_timeout(wait) {
            Ok(event) => handle(event, settings, session, events)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("event channel closed");
                session.apply(Action::Quit);
            }
        }
    }
}

fn handle<E: PlaybackEngine>(
    event: LoopEvent,
    settings: &Settings,
    session: &mut Session<E>,
    events: &Receiver<LoopEvent>,
) -> Result<()> {
    match event {
        LoopEvent::Key(first) => {
            let (keys, rest) = drain_burst(first, events);
            let len = keys.len();
            for (i, key) in keys.into_iter().enumerate() {
                let cx = KeyContext {
                    prompt_open: session.prompt().is_some(),
                    help: session.help_visible(),
                    focus: session.focus(),
                };
                if !applies(i, len, cx.prompt_open, settings.input.coalesce_bursts) {
                    continue;
                }
                if let Some(action) = map_key(key, cx) {
                    session.apply(action);
                }
            }
            for ev in rest {
                handle(ev, settings, session, events)?;
            }
        }
        LoopEvent::Remote(cmd) => {
            session.apply(control_action(cmd));
        }
        LoopEvent::Resize => {}
        LoopEvent::InputFailed(msg) => {
            error!(error = %msg, "terminal input failed");
            session.apply(Action::Quit);
            return Err(Error::Terminal(msg));
        }
    }
    Ok(())
}
