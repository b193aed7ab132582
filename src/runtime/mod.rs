use std::io::{self, Stdout};
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::catalog::{Catalog, TrackId};
use crate::config::Settings;
use crate::engine::{PlaybackEngine, RodioEngine};
use crate::error::{Error, Result};
use crate::mpris::{ControlCmd, spawn_mpris};
use crate::session::Session;
use crate::workers::StopFlag;

mod clip_editor;
mod event_loop;
mod input;
mod keys;
mod mpris_sync;
mod services;
mod settings;
mod startup;

pub use settings::load_settings;
pub use startup::resolve_targets;

use input::{LoopEvent, forward_remote, spawn_input};
use services::Services;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn enter_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Play `ids` from `catalog` until the user quits or the queue runs out,
/// then save what the session learned back to the catalog.
pub fn play(settings: &Settings, catalog: Catalog, ids: Vec<TrackId>) -> Result<()> {
    let engine = RodioEngine::open()?;
    let mut session = Session::new(catalog, ids, engine, settings);

    let (event_tx, event_rx) = mpsc::channel::<LoopEvent>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = spawn_mpris(control_tx);
    forward_remote(control_rx, event_tx.clone());

    let mut services = Services::new(settings, Some(mpris));
    let mut terminal = enter_terminal()?;
    let stop_input = StopFlag::default();
    let input = spawn_input(event_tx, stop_input.clone());

    let run_result = match input {
        Ok(_) => {
            session.start();
            services.start(&session);
            event_loop::run(&mut terminal, settings, &mut session, &mut services, &event_rx)
        }
        Err(e) => Err(Error::Io(e)),
    };

    stop_input.stop();
    services.shutdown();
    // Restoring the terminal can fail; the report and the save still happen.
    let restored = leave_terminal(&mut terminal);
    if let Err(e) = &restored {
        warn!(error = %e, "failed to restore the terminal");
    }

    for path in session.missing() {
        eprintln!("reprise: could not play {}", path.display());
    }
    let catalog = session.into_catalog();
    if let Err(e) = catalog.save() {
        warn!(error = %e, "failed to save catalog");
        eprintln!("reprise: failed to save catalog: {e}");
    }
    run_result.and(restored)
}

/// Edit clip `name` of track `id` interactively and save it as the
/// track's active clip.
pub fn edit_clip(settings: &Settings, mut catalog: Catalog, id: TrackId, name: &str) -> Result<()> {
    let track = catalog
        .get(id)
        .ok_or_else(|| Error::TrackNotFound(id.to_string()))?;
    let path = track.path.clone();
    let title = track.display();
    let initial = track.clips.get(name).map(|c| (c.start, c.end));

    let mut engine = RodioEngine::open()?;
    engine.set_volume(f32::from(settings.playback.volume) / 100.0);

    let (event_tx, event_rx) = mpsc::channel::<LoopEvent>();
    let mut terminal = enter_terminal()?;
    let stop_input = StopFlag::default();
    let edited = match spawn_input(event_tx, stop_input.clone()) {
        Ok(_) => clip_editor::run(&mut terminal, &mut engine, &path, &title, initial, &event_rx),
        Err(e) => Err(Error::Io(e)),
    };
    stop_input.stop();
    leave_terminal(&mut terminal)?;

    let Some((start, end)) = edited? else {
        info!(id, "clip edit cancelled");
        return Ok(());
    };
    if let Some(track) = catalog.get_mut(id) {
        track.set_clip(name, start, end)?;
        track.active_clip = Some(name.to_string());
    }
    catalog.save()?;
    println!("saved clip {name:?}: {start:.1}s to {end:.1}s");
    Ok(())
}
