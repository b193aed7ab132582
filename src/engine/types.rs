use std::path::Path;

use crate::error::Result;

/// Playback capability used by the session. Positions are seconds from the
/// start of the file.
pub trait PlaybackEngine {
    /// Open `path` and hold it paused at the start.
    fn load(&mut self, path: &Path) -> Result<()>;
    /// Start the loaded track.
    fn play(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Drop the loaded track.
    fn stop(&mut self);
    fn seek(&mut self, seconds: f64) -> Result<()>;
    /// Linear volume, `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> f64;
    /// Total length, when the decoder knows it.
    fn duration(&self) -> Option<f64>;
    /// A track is loaded and has not run out of samples.
    fn is_active(&self) -> bool;
}
