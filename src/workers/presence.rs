use std::time::Duration;

use tracing::{info, warn};

use crate::config::DiscordSettings;

use super::discord_ipc::{Activity, DiscordIpc};
use super::slot::Slot;
use super::supervisor::{WorkerCtx, WorkerStatus};

/// Mirror the activity slot to Discord until stopped. A failed connection
/// or write ends the worker with `Failed`; the runtime restarts it on the
/// next track change.
pub fn run_presence(ctx: WorkerCtx, activity: Slot<Option<Activity>>, cfg: DiscordSettings) {
    if cfg.client_id.trim().is_empty() {
        warn!("discord presence enabled without discord.client_id");
        ctx.status.set(WorkerStatus::Failed);
        return;
    }

    ctx.status.set(WorkerStatus::Connecting);
    let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
    let mut ipc = match DiscordIpc::connect(cfg.client_id.trim(), timeout) {
        Ok(ipc) => ipc,
        Err(e) => {
            warn!(error = %e, "discord connection failed");
            ctx.status.set(WorkerStatus::Failed);
            return;
        }
    };
    info!("discord presence connected");
    ctx.status.set(WorkerStatus::Running);

    let mut seen = 0;
    loop {
        if ctx.stop.is_stopped() {
            let _ = ipc.set_activity(None);
            break;
        }
        if let Some((version, current)) = activity.newer_than(seen) {
            seen = version;
            if let Err(e) = ipc.set_activity(current.as_ref()) {
                warn!(error = %e, "discord update failed");
                ctx.status.set(WorkerStatus::Failed);
                return;
            }
        }
        ctx.stop.sleep(Duration::from_millis(250));
    }
}
