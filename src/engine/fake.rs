//! In-memory engine for session and runtime tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::types::PlaybackEngine;

#[derive(Debug, Default)]
pub struct FakeEngine {
    /// Durations by path; paths not listed fail to load.
    pub files: HashMap<PathBuf, f64>,
    pub loaded: Option<PathBuf>,
    pub loads: Vec<PathBuf>,
    pub playing: bool,
    pub position: f64,
    pub volume: f32,
    pub active: bool,
}

impl FakeEngine {
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(p, d)| (PathBuf::from(p), d))
                .collect(),
            volume: 1.0,
            ..Self::default()
        }
    }
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        if !self.files.contains_key(path) {
            return Err(Error::Playback(format!("cannot open {}", path.display())));
        }
        self.loaded = Some(path.to_path_buf());
        self.loads.push(path.to_path_buf());
        self.position = 0.0;
        self.playing = false;
        self.active = true;
        Ok(())
    }

    fn play(&mut self) {
        self.playing = self.loaded.is_some();
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn resume(&mut self) {
        self.play();
    }

    fn stop(&mut self) {
        self.loaded = None;
        self.playing = false;
        self.active = false;
        self.position = 0.0;
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.position = seconds;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.loaded.as_ref().and_then(|p| self.files.get(p)).copied()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
