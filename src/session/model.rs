//! The playback session: queue, transport state and the transitions
//! between tracks.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Datelike;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Clip, Track, TrackId};
use crate::config::Settings;
use crate::engine::PlaybackEngine;
use crate::lyrics::Lyrics;

use super::listen::ListenTimer;
use super::prompt::Prompt;
use super::queue::Queue;
use super::scroller::Scroller;
use super::shuffle::shuffled;
use super::state::{
    Effect, Features, Focus, PlaybackState, QueueLoop, RepeatMode, Transition,
};

/// Clips longer than this fade in over their first two seconds.
const FADE_MIN_CLIP: f64 = 5.0;
const FADE_SECONDS: f64 = 2.0;

pub struct Session<E: PlaybackEngine> {
    pub(super) catalog: Catalog,
    pub(super) queue: Queue,
    pub(super) engine: E,

    pub(super) state: PlaybackState,
    pub(super) repeat: RepeatMode,
    pub(super) queue_loop: QueueLoop,
    pub(super) shuffle_radius: i64,
    pub(super) rng: StdRng,

    pub(super) clip_mode: bool,
    /// Active clip of the loaded track.
    pub(super) clip: Option<Clip>,
    /// Full length of the loaded track.
    pub(super) duration: f64,

    pub(super) volume: u8,
    /// Volume saved by mute; `Some` while muted.
    pub(super) muted: Option<u8>,
    pub(super) volume_step: u8,
    pub(super) scrub: f64,

    pub(super) ending: bool,
    pub(super) restarting: bool,

    pub(super) prompt: Option<Prompt>,
    pub(super) focus: Focus,
    pub(super) help: bool,
    pub(super) features: Features,

    pub(super) lyrics: Option<Lyrics>,
    pub(super) translated: Option<Lyrics>,
    pub(super) lyric_view: Scroller,
    pub(super) lyric_follow: bool,

    pub(super) listen: ListenTimer,
    pub(super) missing: Vec<PathBuf>,
    pub(super) message: Option<(String, Instant)>,
    pub(super) message_ttl: Duration,
    /// Bumped on every seek and track change; the relay resyncs on change.
    pub(super) generation: u64,
    pub(super) last_transition: Option<Transition>,
    pub(super) effects: Vec<Effect>,
    pub(super) finished: bool,
}

impl<E: PlaybackEngine> Session<E> {
    /// Build a session over `ids` (in catalog order). The queue is shuffled
    /// per `playback.shuffle_radius`; nothing plays until [`Session::start`].
    pub fn new(catalog: Catalog, ids: Vec<TrackId>, engine: E, settings: &Settings) -> Self {
        Self::with_rng(catalog, ids, engine, settings, StdRng::from_os_rng())
    }

    pub fn with_rng(
        catalog: Catalog,
        ids: Vec<TrackId>,
        engine: E,
        settings: &Settings,
        mut rng: StdRng,
    ) -> Self {
        let p = &settings.playback;
        let f = &settings.features;

        let items = shuffled(&ids, p.shuffle_radius, &mut rng);
        Self {
            catalog,
            queue: Queue::new(ids, items),
            engine,
            state: PlaybackState::Stopped,
            repeat: RepeatMode::None,
            queue_loop: p.queue_loop.into(),
            shuffle_radius: p.shuffle_radius,
            rng,
            clip_mode: p.clip_mode,
            clip: None,
            duration: 0.0,
            volume: p.volume.min(100),
            muted: None,
            volume_step: p.volume_step.max(1),
            scrub: p.scrub_seconds,
            ending: false,
            restarting: false,
            prompt: None,
            focus: Focus::Queue,
            help: false,
            features: Features {
                visualize: f.visualize,
                stream: f.stream,
                discord: f.discord,
                lyrics: f.lyrics,
                translated_lyrics: f.translated_lyrics,
            },
            lyrics: None,
            translated: None,
            lyric_view: Scroller::default(),
            lyric_follow: true,
            listen: ListenTimer::default(),
            missing: Vec::new(),
            message: None,
            message_ttl: Duration::from_secs_f64(settings.ui.message_seconds.max(0.0)),
            generation: 0,
            last_transition: None,
            effects: Vec::new(),
            finished: false,
        }
    }

    /// Load and play the first playable track.
    pub fn start(&mut self) {
        if self.queue.is_empty() {
            self.finish();
            return;
        }
        self.load_current();
    }

    // ---- accessors -------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Hand the catalog back once the session is over.
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn queue_loop(&self) -> QueueLoop {
        self.queue_loop
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn saved_volume(&self) -> Option<u8> {
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted.is_some()
    }

    pub fn clip_mode(&self) -> bool {
        self.clip_mode
    }

    pub fn ending(&self) -> bool {
        self.ending
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn help_visible(&self) -> bool {
        self.help
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Files that could not be played this session.
    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(m, _)| m.as_str())
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current_id().and_then(|id| self.catalog.get(id))
    }

    pub fn lyrics(&self) -> Option<&Lyrics> {
        self.lyrics.as_ref()
    }

    pub fn translated_lyrics(&self) -> Option<&Lyrics> {
        self.translated.as_ref()
    }

    pub fn lyric_view(&self) -> &Scroller {
        &self.lyric_view
    }

    /// Drain side effects produced since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// The clip that bounds playback right now, if clip mode is on.
    pub fn effective_clip(&self) -> Option<Clip> {
        if self.clip_mode { self.clip } else { None }
    }

    /// Position shown to the user: relative to the clip start in clip mode,
    /// and never past the displayed duration.
    pub fn position(&self) -> f64 {
        let raw = self.engine.position();
        match self.effective_clip() {
            Some(c) => (raw - c.start).clamp(0.0, c.len()),
            None if self.duration > 0.0 => raw.clamp(0.0, self.duration),
            None => raw.max(0.0),
        }
    }

    /// Track length, or clip length in clip mode.
    pub fn display_duration(&self) -> f64 {
        match self.effective_clip() {
            Some(c) => c.len(),
            None => self.duration,
        }
    }

    // ---- messages --------------------------------------------------------

    pub(super) fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(message = %text, "status message");
        self.message = Some((text, Instant::now()));
    }

    // ---- layout ----------------------------------------------------------

    /// Tell the session how many rows the queue and lyric panes have.
    pub fn resize(&mut self, queue_rows: usize, lyric_rows: usize) {
        self.queue.resize(queue_rows);
        if lyric_rows != self.lyric_view.window() {
            self.lyric_view.resize(lyric_rows);
        }
    }

    // ---- periodic --------------------------------------------------------

    /// Re-check time-driven conditions: message expiry, clip fade-in, lyric
    /// following and end of track.
    pub fn tick(&mut self) {
        let expired = self
            .message
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= self.message_ttl);
        if expired {
            self.message = None;
        }
        if self.finished || self.state == PlaybackState::Stopped {
            return;
        }

        let raw = self.engine.position();
        self.apply_volume_at(raw);
        self.follow_lyrics(raw);

        if self.state != PlaybackState::Playing {
            return;
        }
        let ended = !self.engine.is_active()
            || match self.effective_clip() {
                Some(c) => raw >= c.end,
                None => self.duration > 0.0 && raw >= self.duration,
            };
        if ended {
            self.on_track_ended();
        }
    }

    fn follow_lyrics(&mut self, raw: f64) {
        if !self.lyric_follow {
            return;
        }
        if let Some(i) = self.lyrics.as_ref().and_then(|l| l.line_at(raw)) {
            self.lyric_view.set_cursor(i);
        }
    }

    /// Push the effective volume to the engine, applying mute and the
    /// clip fade-in at raw position `raw`.
    pub(super) fn apply_volume_at(&mut self, raw: f64) {
        let mut v = f64::from(self.volume) / 100.0;
        if let Some(c) = self.effective_clip() {
            let into = raw - c.start;
            if c.len() > FADE_MIN_CLIP && into < FADE_SECONDS {
                v *= (into / FADE_SECONDS).clamp(0.0, 1.0);
            }
        }
        self.engine.set_volume(v as f32);
    }

    pub(super) fn apply_volume(&mut self) {
        let raw = self.engine.position();
        self.apply_volume_at(raw);
    }

    // ---- transitions -----------------------------------------------------

    /// Natural end of the track or clip.
    pub(super) fn on_track_ended(&mut self) {
        self.last_transition = Some(Transition::TrackEnded);
        self.account_listen();

        if self.ending && !self.restarting {
            info!("ending after this track");
            self.finish();
            return;
        }
        self.restarting = false;

        match self.repeat {
            RepeatMode::Infinite => {
                self.load_current();
                return;
            }
            RepeatMode::Once => {
                self.repeat = RepeatMode::None;
                self.load_current();
                return;
            }
            RepeatMode::None => {}
        }

        if self.step_forward() {
            self.load_current();
        } else {
            self.finish();
        }
    }

    /// Advance one entry, applying the queue-loop policy at the tail.
    /// Returns `false` when the queue is exhausted.
    pub(super) fn step_forward(&mut self) -> bool {
        if self.queue.advance() {
            return true;
        }
        self.wrap_queue()
    }

    /// End-of-queue policy.
    pub(super) fn wrap_queue(&mut self) -> bool {
        match self.queue_loop {
            QueueLoop::Off => false,
            QueueLoop::Repeat => self.queue.set_current(0),
            QueueLoop::Reshuffle => {
                self.new_lap();
                !self.queue.is_empty()
            }
        }
    }

    /// Replace the queue with a freshly shuffled lap of every queued track.
    pub(super) fn new_lap(&mut self) {
        let radius = if self.shuffle_radius == 0 {
            -1
        } else {
            self.shuffle_radius
        };
        let lap = shuffled(self.queue.origin(), radius, &mut self.rng);
        debug!(tracks = lap.len(), "new lap");
        self.queue.replace_with_lap(lap);
        self.effects.push(Effect::QueueChanged);
    }

    /// Move the current track's listening time into the catalog.
    pub(super) fn account_listen(&mut self) {
        let listened = self.listen.take(Instant::now()).as_secs_f64();
        if listened <= 0.0 {
            return;
        }
        let year = chrono::Local::now().year();
        if let Some(track) = self.queue.current_id().and_then(|id| self.catalog.get_mut(id)) {
            track.add_listen_time(year, listened);
        }
    }

    /// Load the track at the queue's current index and start it. Files that
    /// cannot be opened are recorded and skipped.
    pub(super) fn load_current(&mut self) {
        self.restarting = false;
        for _ in 0..self.queue.len().max(1) {
            let Some(id) = self.queue.current_id() else {
                break;
            };
            let Some(track) = self.catalog.get(id) else {
                warn!(id, "queued track missing from catalog");
                if self.step_forward() {
                    continue;
                }
                break;
            };
            let path = track.path.clone();
            let meta_duration = track.meta.duration;
            let clip = track.active_clip();
            let lyric_source = track.lyrics_source().map(Lyrics::parse);
            let translated = track
                .raw_translated_lyrics
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(Lyrics::parse);

            match self.engine.load(&path) {
                Ok(()) => {
                    self.duration = self.engine.duration().or(meta_duration).unwrap_or(0.0);
                    self.clip = clip;
                    self.set_lyrics(lyric_source, translated);
                    self.begin_playback();
                    self.effects.push(Effect::TrackChanged(id));
                    info!(id, path = %path.display(), "now playing");
                    return;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unplayable track");
                    if !self.missing.contains(&path) {
                        self.missing.push(path);
                    }
                    if !self.step_forward() {
                        break;
                    }
                }
            }
        }
        self.notify("nothing playable left in the queue");
        self.finish();
    }

    fn set_lyrics(&mut self, lyrics: Option<Lyrics>, translated: Option<Lyrics>) {
        let len = lyrics.as_ref().map_or(0, Lyrics::len);
        self.lyrics = lyrics;
        self.translated = translated;
        self.lyric_view = Scroller::new(len, self.lyric_view.window());
        self.lyric_follow = true;
        if self.focus == Focus::Lyrics && len == 0 {
            self.focus = Focus::Queue;
        }
    }

    /// Seek to the clip start when needed, then play from a fresh listen
    /// timer.
    fn begin_playback(&mut self) {
        if let Some(c) = self.effective_clip() {
            if let Err(e) = self.engine.seek(c.start) {
                warn!(error = %e, "could not seek to clip start");
            }
        }
        self.apply_volume();
        self.engine.play();
        self.state = PlaybackState::Playing;
        self.listen.start(Instant::now());
        self.generation += 1;
        self.effects.push(Effect::PlaybackChanged(PlaybackState::Playing));
    }

    /// Stop playback and mark the session over.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.account_listen();
        self.engine.stop();
        self.state = PlaybackState::Stopped;
        self.finished = true;
        self.effects.push(Effect::PlaybackChanged(PlaybackState::Stopped));
        self.effects.push(Effect::Finished);
        info!("session finished");
    }

    // ---- transport -------------------------------------------------------

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.engine.pause();
            self.listen.pause(Instant::now());
            self.state = PlaybackState::Paused;
            self.generation += 1;
            self.effects.push(Effect::PlaybackChanged(self.state));
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.engine.resume();
            self.listen.resume(Instant::now());
            self.state = PlaybackState::Playing;
            self.generation += 1;
            self.effects.push(Effect::PlaybackChanged(self.state));
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => {}
        }
    }

    /// Pause and rewind to the start of the track (or clip).
    pub fn stop(&mut self) {
        self.pause();
        self.seek_raw(self.lower_bound());
    }

    pub fn next(&mut self) {
        let at_tail = self.queue.current() + 1 >= self.queue.len();
        if at_tail && self.queue_loop == QueueLoop::Off {
            self.notify("end of queue");
            return;
        }
        self.last_transition = Some(Transition::Skip);
        self.account_listen();
        if self.step_forward() {
            self.load_current();
        }
    }

    pub fn prev(&mut self) {
        if self.queue.current() == 0 {
            if self.queue_loop == QueueLoop::Repeat && self.queue.len() > 1 {
                self.last_transition = Some(Transition::Back);
                self.account_listen();
                self.queue.set_current(self.queue.len() - 1);
                self.load_current();
            } else {
                self.restart();
            }
            return;
        }
        self.last_transition = Some(Transition::Back);
        self.account_listen();
        self.queue.retreat();
        self.load_current();
    }

    /// Replay the current track from its start.
    pub fn restart(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        self.last_transition = Some(Transition::Restart);
        self.account_listen();
        self.seek_raw(self.lower_bound());
        if self.state == PlaybackState::Paused {
            self.engine.resume();
            self.state = PlaybackState::Playing;
            self.effects.push(Effect::PlaybackChanged(self.state));
        }
        self.listen.start(Instant::now());
        self.restarting = true;
    }

    /// Play the queue entry at `pos`.
    pub fn jump_to(&mut self, pos: usize) {
        if pos >= self.queue.len() {
            return;
        }
        self.last_transition = Some(Transition::Jump);
        self.account_listen();
        self.queue.set_current(pos);
        self.load_current();
    }

    pub fn next_lap(&mut self) {
        self.last_transition = Some(Transition::NextLap);
        self.account_listen();
        self.new_lap();
        self.load_current();
    }

    fn lower_bound(&self) -> f64 {
        self.effective_clip().map_or(0.0, |c| c.start)
    }

    fn upper_bound(&self) -> f64 {
        match self.effective_clip() {
            Some(c) => c.end,
            None if self.duration > 0.0 => self.duration,
            None => f64::INFINITY,
        }
    }

    /// Seek to a raw file position, clamped to the track or clip.
    pub(super) fn seek_raw(&mut self, target: f64) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        let (lo, hi) = (self.lower_bound(), self.upper_bound());
        let target = if hi > lo { target.clamp(lo, hi) } else { lo };
        if let Err(e) = self.engine.seek(target) {
            warn!(error = %e, "seek failed");
            self.notify("seek failed");
            return;
        }
        self.generation += 1;
        self.apply_volume_at(target);
        self.effects.push(Effect::Seeked(target - lo));
    }

    pub fn seek_by(&mut self, delta: f64) {
        let raw = self.engine.position();
        self.seek_raw(raw + delta);
    }

    /// Seek to a displayed position (clip-relative in clip mode).
    pub fn seek_to(&mut self, shown: f64) {
        let lo = self.lower_bound();
        self.seek_raw(lo + shown);
    }

    pub fn scrub_forward(&mut self) {
        self.seek_by(self.scrub);
    }

    pub fn scrub_back(&mut self) {
        self.seek_by(-self.scrub);
    }

    // ---- volume ----------------------------------------------------------

    pub fn set_volume(&mut self, v: u8) {
        self.muted = None;
        self.volume = v.min(100);
        self.apply_volume();
        self.effects.push(Effect::VolumeChanged(self.volume));
    }

    /// Change the volume by `delta` steps. A muted session is unmuted first.
    pub fn change_volume(&mut self, delta: i32) {
        let base = self.muted.take().unwrap_or(self.volume);
        let v = (i32::from(base) + delta * i32::from(self.volume_step)).clamp(0, 100);
        self.set_volume(v as u8);
    }

    pub fn toggle_mute(&mut self) {
        match self.muted.take() {
            Some(saved) => self.volume = saved,
            None => {
                self.muted = Some(self.volume);
                self.volume = 0;
            }
        }
        self.apply_volume();
        self.effects.push(Effect::VolumeChanged(self.volume));
    }

    // ---- modes -----------------------------------------------------------

    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.cycle();
        let label = match self.repeat {
            RepeatMode::None => "repeat off",
            other => other.label(),
        };
        self.notify(label);
    }

    pub fn toggle_ending(&mut self) {
        self.ending = !self.ending;
        self.notify(if self.ending {
            "ending after this track"
        } else {
            "ending cancelled"
        });
    }

    /// Switch clip mode. Entering it moves playback inside the clip when the
    /// position is outside its bounds.
    pub fn toggle_clip_mode(&mut self) {
        self.clip_mode = !self.clip_mode;
        if !self.clip_mode {
            self.apply_volume();
            self.notify("clip mode off");
            return;
        }
        match self.clip {
            Some(c) => {
                let raw = self.engine.position();
                if !c.contains(raw) {
                    self.seek_raw(c.start);
                } else {
                    self.apply_volume_at(raw);
                }
                self.notify("clip mode on");
            }
            None => self.notify("clip mode on (no clip for this track)"),
        }
    }
}
