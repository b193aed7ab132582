use clap::Parser;
use tracing::{info, warn};

mod catalog;
mod cli;
mod config;
mod engine;
mod error;
mod logging;
mod lyrics;
mod mpris;
mod runtime;
mod session;
mod ui;
mod workers;

use catalog::Catalog;
use cli::{Cli, Command, PlayArgs};

fn load_catalog(settings: &config::Settings) -> error::Result<Catalog> {
    match settings.catalog_path() {
        Some(path) => Catalog::load(&path),
        None => Ok(Catalog::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (mut settings, fallback) = runtime::load_settings();
    if let Some(msg) = &fallback {
        eprintln!("reprise: {msg}");
    }

    let _log_guard = match logging::init(&settings) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("reprise: logging disabled: {e}");
            None
        }
    };
    if let Some(msg) = fallback {
        warn!("{msg}");
    }

    match cli.command.unwrap_or(Command::Play(PlayArgs::default())) {
        Command::Play(args) => {
            args.apply(&mut settings);
            let mut catalog = load_catalog(&settings)?;
            let ids = runtime::resolve_targets(&mut catalog, &args.targets, &settings.library)?;
            if ids.is_empty() {
                eprintln!("reprise: nothing to play");
                return Ok(());
            }
            info!(tracks = ids.len(), "starting session");
            runtime::play(&settings, catalog, ids)?;
        }
        Command::Clip(args) => {
            let catalog = load_catalog(&settings)?;
            let id = catalog.lookup(&args.track)?;
            runtime::edit_clip(&settings, catalog, id, &args.name)?;
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
