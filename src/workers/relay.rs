//! Live stream relay: feeds raw PCM to an encoder process.

use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::TrackId;
use crate::config::StreamSettings;

use super::analysis::AnalysisCache;
use super::slot::Slot;
use super::supervisor::{WorkerCtx, WorkerStatus};

/// How long teardown waits for the writer thread after killing the encoder.
const WRITER_GRACE: Duration = Duration::from_secs(1);

/// Where the relay should be reading, published by the runtime. A changed
/// `generation` means playback jumped and the relay must resync.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamCursor {
    pub generation: u64,
    pub track: Option<TrackId>,
    /// Seconds into the file.
    pub position: f64,
    pub paused: bool,
}

pub fn run_relay(ctx: WorkerCtx, cursor: Slot<StreamCursor>, cache: AnalysisCache, cfg: StreamSettings) {
    let mut child = match spawn_encoder(&cfg) {
        Ok(c) => c,
        Err(e) => {
            warn!(encoder = %cfg.encoder, error = %e, "failed to start encoder");
            ctx.status.set(WorkerStatus::Failed);
            return;
        }
    };
    let Some(stdin) = child.stdin.take() else {
        ctx.status.set(WorkerStatus::Failed);
        shutdown(child);
        return;
    };

    // Pipe writes block while the encoder is not reading, so they happen
    // on their own thread. This loop only ever hands chunks over.
    let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(1);
    let writer = match thread::Builder::new()
        .name("relay-writer".into())
        .spawn(move || write_chunks(stdin, rx))
    {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "failed to start relay writer");
            ctx.status.set(WorkerStatus::Failed);
            shutdown(child);
            return;
        }
    };
    info!(encoder = %cfg.encoder, "stream relay started");
    ctx.status.set(WorkerStatus::Running);

    let channels = usize::from(cfg.channels.max(1));
    let chunk_frames = (u64::from(cfg.sample_rate) * cfg.chunk_ms.max(1) / 1000).max(1) as usize;
    let chunk_dur = Duration::from_millis(cfg.chunk_ms.max(1));

    let mut generation = None;
    let mut frame = 0usize;
    let mut pending: Option<Vec<u8>> = None;
    let mut next_write = Instant::now();

    while !ctx.stop.is_stopped() {
        let c = cursor.get().unwrap_or_default();
        if generation != Some(c.generation) {
            generation = Some(c.generation);
            frame = (c.position.max(0.0) * f64::from(cfg.sample_rate)) as usize;
            pending = None;
            debug!(generation = c.generation, frame, "relay resync");
        }

        let bytes = match pending.take() {
            Some(b) => b,
            None if c.paused => silence(chunk_frames, channels),
            None => {
                let analysis = c
                    .track
                    .and_then(|id| cache.lock().ok().and_then(|m| m.get(&id).cloned()));
                let pcm = analysis.as_ref().map(|a| a.pcm.as_slice()).filter(|p| !p.is_empty());
                let out = chunk_bytes(pcm, frame, chunk_frames, channels);
                frame += chunk_frames;
                out
            }
        };

        match tx.try_send(bytes) {
            Ok(()) => {}
            // The encoder is behind; offer the same chunk again next time.
            Err(TrySendError::Full(b)) => pending = Some(b),
            Err(TrySendError::Disconnected(_)) => {
                ctx.status.set(WorkerStatus::Failed);
                break;
            }
        }

        next_write += chunk_dur;
        let now = Instant::now();
        if next_write < now {
            // Fell behind (machine suspended, encoder stalled): do not burst.
            next_write = now;
        } else if !ctx.stop.sleep(next_write - now) {
            break;
        }
    }

    drop(tx);
    // Killing the encoder breaks the pipe under a writer stuck in `write`.
    shutdown(child);
    let deadline = Instant::now() + WRITER_GRACE;
    while !writer.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    if writer.is_finished() {
        let _ = writer.join();
    } else {
        warn!("relay writer still blocked, detaching it");
    }
    debug!("stream relay stopped");
}

fn write_chunks(mut stdin: ChildStdin, rx: Receiver<Vec<u8>>) {
    for chunk in rx {
        if let Err(e) = stdin.write_all(&chunk) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                warn!("encoder closed its input");
            } else {
                warn!(error = %e, "relay write failed");
            }
            return;
        }
    }
}

fn spawn_encoder(cfg: &StreamSettings) -> io::Result<Child> {
    Command::new(&cfg.encoder)
        .args(&cfg.encoder_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

fn shutdown(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn silence(frames: usize, channels: usize) -> Vec<u8> {
    vec![0u8; frames * channels * 2]
}

/// Little-endian s16 bytes for `frames` frames starting at `start`, padded
/// with silence past the end of `pcm` (or entirely, when it is not ready).
pub(super) fn chunk_bytes(pcm: Option<&[i16]>, start: usize, frames: usize, channels: usize) -> Vec<u8> {
    let mut out = silence(frames, channels);
    let Some(pcm) = pcm else {
        return out;
    };
    let from = start.saturating_mul(channels).min(pcm.len());
    let to = (from + frames * channels).min(pcm.len());
    for (i, s) in pcm[from..to].iter().enumerate() {
        let [lo, hi] = s.to_le_bytes();
        out[i * 2] = lo;
        out[i * 2 + 1] = hi;
    }
    out
}
