//! Pre-analysis of upcoming tracks: decoded PCM for the relay and spectral
//! frames for the visualizer, cached by track id.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Decoder;
use rodio::source::UniformSourceIterator;
use tracing::{debug, info, warn};

use crate::catalog::TrackId;
use crate::error::{Error, Result};

use super::slot::Slot;
use super::spectrum::{SpectralFrame, spectral_frames};
use super::supervisor::{StopFlag, WorkerCtx, WorkerStatus};

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Interleaved s16 samples, empty unless requested.
    pub pcm: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Empty unless requested.
    pub frames: Vec<SpectralFrame>,
    pub fps: u32,
}

impl Analysis {
    /// Spectral frame shown at `position` seconds.
    pub fn frame_at(&self, position: f64) -> Option<&SpectralFrame> {
        if position < 0.0 {
            return None;
        }
        self.frames.get((position * f64::from(self.fps)) as usize)
    }

    fn satisfies(&self, job: &AnalysisJob) -> bool {
        (!job.pcm || !self.pcm.is_empty()) && (!job.spectrum || !self.frames.is_empty())
    }
}

/// Shared between the analysis worker (writer) and the renderer and relay
/// (readers). Readers only ever check whether an entry is there.
pub type AnalysisCache = Arc<Mutex<HashMap<TrackId, Arc<Analysis>>>>;

/// What the analysis worker should prepare, published by the runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisJob {
    /// Now playing first, then the next few queue entries.
    pub window: Vec<(TrackId, PathBuf)>,
    pub pcm: bool,
    pub spectrum: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub fps: u32,
    pub bands: usize,
}

pub fn run_analysis(ctx: WorkerCtx, job: Slot<AnalysisJob>, cache: AnalysisCache, params: AnalysisParams) {
    ctx.status.set(WorkerStatus::Running);
    let mut failed: HashSet<PathBuf> = HashSet::new();

    while !ctx.stop.is_stopped() {
        let job = job.get().unwrap_or_default();
        evict(&cache, &job);

        let next = job.window.iter().find(|(id, path)| {
            !failed.contains(path)
                && !cache
                    .lock()
                    .ok()
                    .and_then(|c| c.get(id).map(|a| a.satisfies(&job)))
                    .unwrap_or(false)
        });
        let Some((id, path)) = next.cloned() else {
            ctx.stop.sleep(Duration::from_millis(100));
            continue;
        };
        if !job.pcm && !job.spectrum {
            ctx.stop.sleep(Duration::from_millis(100));
            continue;
        }

        debug!(id, path = %path.display(), "analysing");
        match analyse(&path, &job, params, &ctx.stop) {
            Ok(Some(a)) => {
                if let Ok(mut c) = cache.lock() {
                    c.insert(id, Arc::new(a));
                }
                info!(id, "analysis ready");
            }
            Ok(None) => break,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "analysis failed");
                failed.insert(path);
            }
        }
    }
    debug!("analysis worker exiting");
}

/// Drop cached entries that left the window.
fn evict(cache: &AnalysisCache, job: &AnalysisJob) {
    if let Ok(mut c) = cache.lock() {
        c.retain(|id, _| job.window.iter().any(|(w, _)| w == id));
    }
}

fn analyse(path: &Path, job: &AnalysisJob, p: AnalysisParams, stop: &StopFlag) -> Result<Option<Analysis>> {
    let Some(samples) = decode(path, p.channels, p.sample_rate, stop)? else {
        return Ok(None);
    };

    let frames = if job.spectrum {
        match spectral_frames(&samples, p.channels, p.sample_rate, p.fps, p.bands, stop) {
            Some(f) => f,
            None => return Ok(None),
        }
    } else {
        Vec::new()
    };
    let pcm = if job.pcm { to_s16(&samples) } else { Vec::new() };

    Ok(Some(Analysis {
        pcm,
        sample_rate: p.sample_rate,
        channels: p.channels,
        frames,
        fps: p.fps,
    }))
}

/// Decode the whole file, resampled to `rate` Hz and `channels` channels.
fn decode(path: &Path, channels: u16, rate: u32, stop: &StopFlag) -> Result<Option<Vec<f32>>> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| Error::Playback(format!("{}: {e}", path.display())))?;

    let mut out = Vec::new();
    for (i, s) in UniformSourceIterator::new(decoder, channels, rate).enumerate() {
        if i % 65_536 == 0 && stop.is_stopped() {
            return Ok(None);
        }
        out.push(s);
    }
    Ok(Some(out))
}

pub(super) fn to_s16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect()
}
