//! Drives the background workers and MPRIS from session effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::catalog::TrackId;
use crate::config::Settings;
use crate::engine::PlaybackEngine;
use crate::mpris::MprisHandle;
use crate::session::{Effect, Feature, PlaybackState, Session};
use crate::ui::WorkerLights;
use crate::workers::{
    Activity, Analysis, AnalysisCache, AnalysisJob, AnalysisParams, MetadataJob, MetadataSinks, Slot,
    StreamCursor, Supervisor, TrackInfo, WorkerKind, run_analysis, run_metadata, run_presence,
    run_relay,
};

pub struct Services {
    settings: Settings,
    supervisor: Supervisor,
    cache: AnalysisCache,
    analysis_job: Slot<AnalysisJob>,
    cursor: Slot<StreamCursor>,
    metadata_job: Slot<MetadataJob>,
    activity: Slot<Option<Activity>>,
    mpris: Option<MprisHandle>,
}

impl Services {
    pub fn new(settings: &Settings, mpris: Option<MprisHandle>) -> Self {
        Self {
            settings: settings.clone(),
            supervisor: Supervisor::new(),
            cache: Arc::new(Mutex::new(HashMap::new())),
            analysis_job: Slot::new(AnalysisJob::default()),
            cursor: Slot::new(StreamCursor::default()),
            metadata_job: Slot::new(MetadataJob::default()),
            activity: Slot::new(None),
            mpris,
        }
    }

    /// Start the metadata worker and every worker the session starts with.
    pub fn start<E: PlaybackEngine>(&mut self, session: &Session<E>) {
        self.start_metadata();
        let features = session.features();
        self.sync_analysis(session);
        if features.stream {
            self.start_relay();
        }
        if features.discord {
            self.start_presence();
        }
        self.publish_metadata(session);
    }

    pub fn apply<E: PlaybackEngine>(&mut self, effect: Effect, session: &Session<E>) {
        match effect {
            Effect::TrackChanged(id) => {
                debug!(id, "track changed");
                self.restart_failed(session);
                self.sync_analysis(session);
                self.publish_metadata(session);
            }
            Effect::QueueChanged => self.sync_analysis(session),
            Effect::PlaybackChanged(state) => {
                if let Some(m) = &self.mpris {
                    m.set_playback(state);
                }
            }
            Effect::Seeked(pos) => {
                if let Some(m) = &self.mpris {
                    m.seeked(pos);
                }
            }
            Effect::FeatureToggled(feature, on) => self.toggle(feature, on, session),
            Effect::VolumeChanged(_) => {}
            Effect::Finished => {
                if let Some(m) = &self.mpris {
                    m.set_track_metadata(None, None);
                    m.set_playback(PlaybackState::Stopped);
                }
            }
        }
    }

    /// Publish the per-frame values: the relay cursor and the MPRIS position.
    pub fn publish<E: PlaybackEngine>(&self, session: &Session<E>) {
        let next = StreamCursor {
            generation: session.generation(),
            track: session.queue().current_id(),
            position: session.engine().position(),
            paused: session.state() != PlaybackState::Playing,
        };
        if self.cursor.get().as_ref() != Some(&next) {
            self.cursor.set(next);
        }
        if let Some(m) = &self.mpris {
            m.set_position(session.position());
        }
    }

    pub fn lights(&self) -> WorkerLights {
        WorkerLights {
            analysis: self.supervisor.status(WorkerKind::Analysis),
            relay: self.supervisor.status(WorkerKind::Relay),
            presence: self.supervisor.status(WorkerKind::Presence),
        }
    }

    /// Cached analysis of `id`, if the worker got to it.
    pub fn analysis(&self, id: TrackId) -> Option<Arc<Analysis>> {
        self.cache.lock().ok().and_then(|c| c.get(&id).cloned())
    }

    pub fn shutdown(&mut self) {
        self.supervisor.stop_all();
    }

    fn toggle<E: PlaybackEngine>(&mut self, feature: Feature, on: bool, session: &Session<E>) {
        info!(feature = feature.label(), on, "feature toggled");
        match feature {
            Feature::Visualize => self.sync_analysis(session),
            Feature::Stream => {
                if on {
                    self.start_relay();
                } else {
                    self.supervisor.stop(WorkerKind::Relay);
                }
                self.sync_analysis(session);
                self.publish_metadata(session);
            }
            Feature::Discord => {
                if on {
                    self.start_presence();
                } else {
                    self.supervisor.stop(WorkerKind::Presence);
                }
                self.publish_metadata(session);
            }
            Feature::Lyrics | Feature::TranslatedLyrics => {}
        }
    }

    /// Workers that gave up get another try on each track change.
    fn restart_failed<E: PlaybackEngine>(&mut self, session: &Session<E>) {
        let f = session.features();
        if self.supervisor.needs_restart(WorkerKind::Metadata) {
            info!("restarting metadata worker");
            self.start_metadata();
        }
        if f.stream && self.supervisor.needs_restart(WorkerKind::Relay) {
            info!("restarting stream relay");
            self.start_relay();
        }
        if f.discord && self.supervisor.needs_restart(WorkerKind::Presence) {
            info!("restarting discord presence");
            self.start_presence();
        }
        if (f.stream || f.visualize) && self.supervisor.needs_restart(WorkerKind::Analysis) {
            info!("restarting analysis worker");
            self.start_analysis();
        }
    }

    /// Keep the analysis worker running exactly while something reads it.
    fn sync_analysis<E: PlaybackEngine>(&mut self, session: &Session<E>) {
        let f = session.features();
        if !f.stream && !f.visualize {
            self.supervisor.stop(WorkerKind::Analysis);
            self.analysis_job.set(AnalysisJob::default());
            return;
        }

        let lookahead = self.settings.visualizer.lookahead;
        let window = session
            .queue()
            .upcoming(lookahead + 1)
            .into_iter()
            .filter_map(|id| session.catalog().get(id).map(|t| (id, t.path.clone())))
            .collect();
        let job = AnalysisJob {
            window,
            pcm: f.stream,
            spectrum: f.visualize,
        };
        if self.analysis_job.get().as_ref() != Some(&job) {
            self.analysis_job.set(job);
        }
        if !self.supervisor.is_running(WorkerKind::Analysis) {
            self.start_analysis();
        }
    }

    fn publish_metadata<E: PlaybackEngine>(&self, session: &Session<E>) {
        let f = session.features();
        let track = session
            .current_track()
            .filter(|_| !session.is_finished())
            .map(|t| TrackInfo::from_track(t, session.display_duration()));
        self.metadata_job.set(MetadataJob {
            track,
            presence: f.discord,
            relay: f.stream,
        });
    }

    fn start_analysis(&mut self) {
        let job = self.analysis_job.clone();
        let cache = self.cache.clone();
        let params = AnalysisParams {
            sample_rate: self.settings.stream.sample_rate,
            channels: self.settings.stream.channels,
            fps: self.settings.visualizer.fps,
            bands: self.settings.visualizer.bands,
        };
        self.supervisor
            .start(WorkerKind::Analysis, move |ctx| run_analysis(ctx, job, cache, params));
    }

    fn start_relay(&mut self) {
        let cursor = self.cursor.clone();
        let cache = self.cache.clone();
        let cfg = self.settings.stream.clone();
        self.supervisor
            .start(WorkerKind::Relay, move |ctx| run_relay(ctx, cursor, cache, cfg));
    }

    fn start_presence(&mut self) {
        let activity = self.activity.clone();
        let cfg = self.settings.discord.clone();
        self.supervisor
            .start(WorkerKind::Presence, move |ctx| run_presence(ctx, activity, cfg));
    }

    fn start_metadata(&mut self) {
        let jobs = self.metadata_job.clone();
        let sinks = MetadataSinks {
            mpris: self.mpris.clone(),
            presence: self.activity.clone(),
            stream: self.settings.stream.clone(),
            art_dir: self.settings.art_dir(),
        };
        self.supervisor
            .start(WorkerKind::Metadata, move |ctx| run_metadata(ctx, jobs, sinks));
    }
}
