use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `REPRISE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("REPRISE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.volume > 100 {
            return Err("playback.volume must be <= 100".to_string());
        }
        if self.playback.volume_step == 0 {
            return Err("playback.volume_step must be >= 1".to_string());
        }
        if self.playback.scrub_seconds.is_nan() || self.playback.scrub_seconds <= 0.0 {
            return Err("playback.scrub_seconds must be > 0".to_string());
        }
        if self.playback.shuffle_radius < -1 {
            return Err("playback.shuffle_radius must be -1, 0 or a positive radius".to_string());
        }
        if self.visualizer.fps == 0 || self.visualizer.bands == 0 {
            return Err("visualizer.fps and visualizer.bands must be >= 1".to_string());
        }
        if self.ui.max_fps == 0 {
            return Err("ui.max_fps must be >= 1".to_string());
        }
        if self.stream.chunk_ms == 0 {
            return Err("stream.chunk_ms must be >= 1".to_string());
        }
        if self.stream.sample_rate == 0 || self.stream.channels == 0 {
            return Err("stream.sample_rate and stream.channels must be >= 1".to_string());
        }
        Ok(())
    }

    /// Catalog location, honoring `library.catalog_path`.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.library
            .catalog_path
            .clone()
            .or_else(|| xdg_dir("XDG_DATA_HOME", &[".local", "share"]).map(|d| d.join("catalog.json")))
    }

    /// Log directory, honoring `logging.directory`.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .directory
            .clone()
            .or_else(|| xdg_dir("XDG_STATE_HOME", &[".local", "state"]))
    }

    /// Where extracted cover art is cached.
    pub fn art_dir(&self) -> PathBuf {
        xdg_dir("XDG_CACHE_HOME", &[".cache"])
            .map(|d| d.join("art"))
            .unwrap_or_else(|| env::temp_dir().join("reprise-art"))
    }
}

/// Resolve the config path from `REPRISE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("REPRISE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/reprise/config.toml`
/// or `~/.config/reprise/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join("config.toml"))
}

/// `$<var>/reprise`, or `$HOME/<fallback...>/reprise`.
fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    let base = if let Some(dir) = env::var_os(var) {
        Some(PathBuf::from(dir))
    } else if let Some(home) = env::var_os("HOME") {
        let mut p = PathBuf::from(home);
        p.extend(home_fallback);
        Some(p)
    } else {
        None
    };

    base.map(|d| d.join("reprise"))
}
