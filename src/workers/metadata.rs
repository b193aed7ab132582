//! Now-playing sync: MPRIS metadata, the presence activity and the relay's
//! metadata endpoints, refreshed on every track change.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::picture::{MimeType, PictureType};
use lofty::prelude::*;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::catalog::{Track, TrackId};
use crate::config::StreamSettings;
use crate::error::Result;
use crate::mpris::MprisHandle;

use super::discord_ipc::Activity;
use super::slot::Slot;
use super::supervisor::{WorkerCtx, WorkerStatus};

/// Owned copy of what the sinks need to know about a track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub id: TrackId,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub path: PathBuf,
    /// Seconds, 0 when unknown.
    pub duration: f64,
}

impl TrackInfo {
    pub fn from_track(track: &Track, duration: f64) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            artist: track.meta.artist.clone(),
            album: track.meta.album.clone(),
            path: track.path.clone(),
            duration,
        }
    }

    fn activity(&self, started_at: i64) -> Activity {
        Activity {
            details: self.title.clone(),
            state: self.artist.clone().unwrap_or_else(|| "Unknown artist".into()),
            large_text: self.album.clone(),
            large_image: None,
            started_at: Some(started_at),
        }
    }
}

/// Published by the runtime whenever the track or a sink toggle changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataJob {
    pub track: Option<TrackInfo>,
    pub presence: bool,
    pub relay: bool,
}

pub struct MetadataSinks {
    pub mpris: Option<MprisHandle>,
    pub presence: Slot<Option<Activity>>,
    pub stream: StreamSettings,
    /// Extracted cover images are written here.
    pub art_dir: PathBuf,
}

/// Serve jobs until stopped. Only the newest job matters: jobs published
/// while a slow upload runs are collapsed into one.
pub fn run_metadata(ctx: WorkerCtx, jobs: Slot<MetadataJob>, sinks: MetadataSinks) {
    ctx.status.set(WorkerStatus::Running);
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(sinks.stream.timeout_secs.max(1))))
        .build()
        .into();

    let mut seen = 0;
    while !ctx.stop.is_stopped() {
        let Some((version, job)) = jobs.newer_than(seen) else {
            ctx.stop.sleep(Duration::from_millis(100));
            continue;
        };
        seen = version;

        let art = job.track.as_ref().and_then(|t| cover_art(&t.path));
        let art_path = match (&job.track, &art) {
            (Some(t), Some((bytes, mime))) => store_art(&sinks.art_dir, t.id, bytes, mime),
            _ => None,
        };

        if let Some(mpris) = &sinks.mpris {
            let art_url = art_path.as_ref().map(|p| format!("file://{}", p.display()));
            mpris.set_track_metadata(job.track.as_ref(), art_url);
        }

        let activity = match (&job.track, job.presence) {
            (Some(t), true) => Some(t.activity(chrono::Utc::now().timestamp())),
            _ => None,
        };
        sinks.presence.set(activity);

        if job.relay {
            if let Some(t) = &job.track {
                match push_relay(&agent, &sinks.stream, t, art.as_ref().map(|(b, _)| b.as_slice())) {
                    Ok(()) => ctx.status.set(WorkerStatus::Running),
                    Err(e) => {
                        warn!(id = t.id, error = %e, "relay metadata update failed");
                        ctx.status.set(WorkerStatus::Failed);
                    }
                }
            }
        }
    }
    debug!("metadata worker exiting");
}

/// Embedded front cover (or the first picture) with its MIME type.
fn cover_art(path: &Path) -> Option<(Vec<u8>, MimeType)> {
    let tagged = lofty::read_from_path(path).ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    let pictures = tag.pictures();
    let pic = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;
    let mime = pic.mime_type().cloned().unwrap_or(MimeType::Jpeg);
    Some((pic.data().to_vec(), mime))
}

fn art_extension(mime: &MimeType) -> &'static str {
    match mime {
        MimeType::Png => "png",
        MimeType::Gif => "gif",
        MimeType::Bmp => "bmp",
        MimeType::Tiff => "tiff",
        _ => "jpg",
    }
}

fn store_art(dir: &Path, id: TrackId, bytes: &[u8], mime: &MimeType) -> Option<PathBuf> {
    let path = dir.join(format!("{id}.{}", art_extension(mime)));
    if path.exists() {
        return Some(path);
    }
    let written = fs::create_dir_all(dir).and_then(|()| fs::write(&path, bytes));
    match written {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to cache cover art");
            None
        }
    }
}

pub(super) fn relay_payload(track: &TrackInfo) -> String {
    json!({
        "id": track.id,
        "title": track.title,
        "artist": track.artist,
        "album": track.album,
        "duration": track.duration,
    })
    .to_string()
}

fn push_relay(agent: &ureq::Agent, cfg: &StreamSettings, track: &TrackInfo, art: Option<&[u8]>) -> Result<()> {
    if let Some(url) = &cfg.metadata_url {
        agent
            .post(url)
            .header("Content-Type", "application/json")
            .send(relay_payload(track))?;
        info!(id = track.id, "relay metadata sent");
    }
    if let (Some(url), Some(bytes)) = (&cfg.artwork_url, art) {
        agent
            .post(url)
            .header("Content-Type", "application/octet-stream")
            .send(bytes)?;
        debug!(id = track.id, "relay artwork sent");
    }
    Ok(())
}
