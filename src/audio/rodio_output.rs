//! `AudioOutput` backed by a `rodio` sink on the default device.
//!
//! Each loaded track gets a fresh paused `Sink`; its decoder is wrapped in a
//! [`SampleTap`] so the waveform view sees what is being played.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::error::OutputError;

use super::output::{AudioOutput, OutputEvent};
use super::tap::{SampleBuffer, SampleTap};

pub struct RodioOutput {
    stream: OutputStream,
    sink: Option<Sink>,
    source: Option<PathBuf>,
    tap: SampleBuffer,
    volume: f32,
    playing: bool,
    /// Start of the current sink within the track, after a rebuilding seek.
    offset: Duration,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn open(tap: SampleBuffer) -> Result<Self, OutputError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            source: None,
            tap,
            volume: 1.0,
            playing: false,
            offset: Duration::ZERO,
        })
    }

    /// Create a paused `Sink` for `path` that starts playback at `start_at`.
    fn create_sink_at(
        &self,
        path: &Path,
        start_at: Duration,
    ) -> Result<(Sink, Option<Duration>), OutputError> {
        let file = File::open(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|source| OutputError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let total = decoder.total_duration();

        // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
        let source = SampleTap::new(decoder.skip_duration(start_at), self.tap.clone());
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();
        sink.set_volume(self.volume);
        Ok((sink, total))
    }

    /// Rebuild the sink positioned at `position`, keeping the play state.
    fn rebuild_at(&mut self, position: Duration) -> Result<(), OutputError> {
        let path = self.source.clone().ok_or(OutputError::NotLoaded)?;
        let (sink, _) = self.create_sink_at(&path, position)?;
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        if self.playing {
            sink.play();
        }
        self.sink = Some(sink);
        self.offset = position;
        Ok(())
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &Path) -> Result<Option<Duration>, OutputError> {
        // Drop the old source first so a failed load never leaves it playable.
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.source = None;
        self.playing = false;
        self.offset = Duration::ZERO;
        self.tap.clear();

        let (sink, total) = self.create_sink_at(source, Duration::ZERO)?;
        self.sink = Some(sink);
        self.source = Some(source.to_path_buf());
        debug!(path = %source.display(), ?total, "source loaded");
        Ok(total)
    }

    fn start(&mut self) -> Result<(), OutputError> {
        let sink = self.sink.as_ref().ok_or(OutputError::NotLoaded)?;
        if sink.empty() {
            // Finished (or rewound after finishing): re-open from the start.
            self.rebuild_at(Duration::ZERO)?;
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), OutputError> {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.playing = false;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), OutputError> {
        let Some(sink) = &self.sink else {
            return Err(OutputError::NotLoaded);
        };
        if sink.empty() {
            return self.rebuild_at(position);
        }
        match sink.try_seek(position) {
            Ok(()) => {
                self.offset = Duration::ZERO;
                Ok(())
            }
            Err(e) => {
                // Not every decoder can seek in place; fall back to re-opening
                // the file and skipping into it.
                debug!(error = %e, "in-place seek unsupported, rebuilding sink");
                self.rebuild_at(position).map_err(|rebuild| {
                    debug!(error = %rebuild, "rebuilding sink failed");
                    OutputError::Seek(e)
                })
            }
        }
    }

    fn position(&self) -> Duration {
        self.sink
            .as_ref()
            .map(|s| self.offset + s.get_pos())
            .unwrap_or(Duration::ZERO)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        // rodio reports no device errors once a sink is running, only exhaustion.
        if self.playing && self.sink.as_ref().is_some_and(Sink::empty) {
            self.playing = false;
            return Some(OutputEvent::Ended);
        }
        None
    }
}
