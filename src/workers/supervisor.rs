use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerStatus {
    #[default]
    Idle,
    Connecting,
    Running,
    Failed,
}

impl WorkerStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Connecting,
            2 => Self::Running,
            3 => Self::Failed,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::Running => 2,
            Self::Failed => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    /// Decodes upcoming tracks for the visualizer and the relay.
    Analysis,
    /// Pushes now-playing details to MPRIS, presence and the relay.
    Metadata,
    /// Discord rich presence.
    Presence,
    /// Live stream encoder feed.
    Relay,
}

impl WorkerKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Metadata => "metadata",
            Self::Presence => "presence",
            Self::Relay => "relay",
        }
    }
}

/// Status written by a worker and polled by the renderer.
#[derive(Clone, Debug, Default)]
pub struct StatusSlot(Arc<AtomicU8>);

impl StatusSlot {
    pub fn set(&self, status: WorkerStatus) {
        self.0.store(status.as_u8(), Ordering::Relaxed);
    }

    pub fn get(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.0.load(Ordering::Relaxed))
    }
}

/// Cooperative cancellation flag checked by worker loops.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep for `dur` in short slices. Returns `false` if stopped meanwhile.
    pub fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(20)));
        }
    }
}

/// Handed to every worker thread.
#[derive(Clone, Debug, Default)]
pub struct WorkerCtx {
    pub stop: StopFlag,
    pub status: StatusSlot,
}

struct WorkerHandle {
    stop: StopFlag,
    join: JoinHandle<()>,
}

/// Owns the worker threads. Starting a kind that is already running
/// replaces it; stopping joins the thread before returning.
#[derive(Default)]
pub struct Supervisor {
    workers: HashMap<WorkerKind, WorkerHandle>,
    statuses: HashMap<WorkerKind, StatusSlot>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<F>(&mut self, kind: WorkerKind, run: F)
    where
        F: FnOnce(WorkerCtx) + Send + 'static,
    {
        self.stop(kind);

        let status = self.statuses.entry(kind).or_default().clone();
        status.set(WorkerStatus::Connecting);
        let ctx = WorkerCtx {
            stop: StopFlag::default(),
            status: status.clone(),
        };
        let stop = ctx.stop.clone();

        match thread::Builder::new()
            .name(format!("worker-{}", kind.name()))
            .spawn(move || run(ctx))
        {
            Ok(join) => {
                debug!(worker = kind.name(), "started");
                self.workers.insert(kind, WorkerHandle { stop, join });
            }
            Err(e) => {
                warn!(worker = kind.name(), error = %e, "failed to spawn");
                status.set(WorkerStatus::Failed);
            }
        }
    }

    /// Signal the worker and wait for its thread to exit.
    pub fn stop(&mut self, kind: WorkerKind) {
        if let Some(h) = self.workers.remove(&kind) {
            h.stop.stop();
            if h.join.join().is_err() {
                warn!(worker = kind.name(), "worker panicked");
            }
            debug!(worker = kind.name(), "stopped");
        }
        if let Some(s) = self.statuses.get(&kind) {
            s.set(WorkerStatus::Idle);
        }
    }

    /// The worker thread is alive.
    pub fn is_running(&self, kind: WorkerKind) -> bool {
        self.workers
            .get(&kind)
            .is_some_and(|h| !h.join.is_finished())
    }

    pub fn status(&self, kind: WorkerKind) -> WorkerStatus {
        self.statuses
            .get(&kind)
            .map_or(WorkerStatus::Idle, StatusSlot::get)
    }

    /// A worker that gave up and should be restarted on the next trigger.
    pub fn needs_restart(&self, kind: WorkerKind) -> bool {
        self.workers.contains_key(&kind)
            && (self.status(kind) == WorkerStatus::Failed || !self.is_running(kind))
    }

    pub fn stop_all(&mut self) {
        let kinds: Vec<WorkerKind> = self.workers.keys().copied().collect();
        for k in kinds {
            self.stop(k);
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop_all();
    }
}
