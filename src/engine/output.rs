use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::types::PlaybackEngine;

/// `rodio` backed engine.
///
/// The output stream lives on its own thread for the lifetime of the
/// engine; sinks are connected to its mixer from the caller's thread.
pub struct RodioEngine {
    mixer: Mixer,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    duration: Option<f64>,
    /// Added to the sink position after a fallback seek rebuilt the source.
    offset: f64,
    volume: f32,
    shutdown: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    pub fn open() -> Result<Self> {
        let (mixer_tx, mixer_rx) = mpsc::channel::<std::result::Result<Mixer, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = mixer_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // rodio logs to stderr when the stream is dropped, which would
                // scribble over the TUI.
                stream.log_on_drop(false);
                let _ = mixer_tx.send(Ok(stream.mixer().clone()));

                // Keep the device open until the engine goes away.
                let _ = shutdown_rx.recv();
                debug!("audio output closed");
            })?;

        let mixer = mixer_rx
            .recv()
            .map_err(|_| Error::Playback("audio output thread exited".into()))?
            .map_err(|e| Error::Playback(format!("no audio output device: {e}")))?;

        Ok(Self {
            mixer,
            sink: None,
            path: None,
            duration: None,
            offset: 0.0,
            volume: 1.0,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        })
    }

    /// Build a paused sink for `path` starting `start_at` into the file.
    fn create_sink_at(&self, path: &Path, start_at: Duration) -> Result<(Sink, Option<f64>)> {
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::Playback(format!("{}: {e}", path.display())))?;
        let duration = source.total_duration().map(|d| d.as_secs_f64());

        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.volume);
        sink.pause();
        sink.append(source.skip_duration(start_at));
        Ok((sink, duration))
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.stop();
        let (sink, duration) = self.create_sink_at(path, Duration::ZERO)?;
        self.sink = Some(sink);
        self.path = Some(path.to_path_buf());
        self.duration = duration;
        self.offset = 0.0;
        Ok(())
    }

    fn play(&mut self) {
        if let Some(s) = &self.sink {
            s.play();
        }
    }

    fn pause(&mut self) {
        if let Some(s) = &self.sink {
            s.pause();
        }
    }

    fn resume(&mut self) {
        self.play();
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.path = None;
        self.duration = None;
        self.offset = 0.0;
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        let target = Duration::from_secs_f64(seconds.max(0.0));
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        match sink.try_seek(target) {
            Ok(()) => {
                self.offset = 0.0;
                Ok(())
            }
            Err(e) => {
                // Not every decoder can seek; rebuild the source and skip into it.
                warn!(error = %e, "seek unsupported, rebuilding source");
                let Some(path) = self.path.clone() else {
                    return Ok(());
                };
                let paused = sink.is_paused();
                sink.stop();
                let (new_sink, _) = self.create_sink_at(&path, target)?;
                if !paused {
                    new_sink.play();
                }
                self.sink = Some(new_sink);
                self.offset = target.as_secs_f64();
                Ok(())
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(s) = &self.sink {
            s.set_volume(self.volume);
        }
    }

    fn position(&self) -> f64 {
        self.sink
            .as_ref()
            .map_or(0.0, |s| self.offset + s.get_pos().as_secs_f64())
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn is_active(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty())
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.stop();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}
