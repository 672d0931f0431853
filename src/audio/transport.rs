//! The transport state machine.
//!
//! A `Transport` owns one [`PlaybackSession`] and drives a single output
//! through the shared [`PlaybackResource`]:
//!
//! ```text
//!   Idle --load--> Paused --play--> Playing
//!                    ^                 |
//!                    +-----pause-------+
//! ```
//!
//! Loading while playing resumes playback on the new track. Every observable
//! change is published to subscribers as a [`TransportEvent`].

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::PlaybackSettings;
use crate::error::{ListenerError, TransportError};
use crate::library::Track;

use super::observers::{Observers, Subscription};
use super::output::{AudioOutput, OutputEvent, SharedOutput};
use super::resource::{OutputHandle, PlaybackResource};
use super::session::{
    Direction, FailureKind, PlaybackSession, RepeatMode, TransportEvent, TransportState,
};

const FADE_STEPS: u32 = 20;

pub struct Transport {
    resource: Rc<PlaybackResource>,
    handle: OutputHandle,
    label: String,
    session: PlaybackSession,
    queue: Vec<Track>,
    index: Option<usize>,
    pre_mute_volume: f32,
    default_volume: f32,
    fallback_duration: Duration,
    rng: StdRng,
    yielded: Rc<Cell<bool>>,
    _yield_listener: Subscription,
    events: Observers<TransportEvent>,
}

impl Transport {
    /// Attach `output` to `resource` and start in `Idle` with the configured defaults.
    pub fn new(
        resource: Rc<PlaybackResource>,
        output: SharedOutput,
        label: impl Into<String>,
        settings: &PlaybackSettings,
    ) -> Self {
        let handle = resource.attach(output);

        // Set by the resource when another output takes over; applied on the next tick.
        let yielded = Rc::new(Cell::new(false));
        let id = handle.id();
        let flag = yielded.clone();
        let yield_listener = resource.on_yield(move |notice| {
            if notice.yielded() == Some(id) {
                flag.set(true);
            }
            Ok(())
        });

        let volume = sanitize_volume(settings.volume);
        handle.output().borrow_mut().set_volume(volume);

        Self {
            resource,
            handle,
            label: label.into(),
            session: PlaybackSession {
                volume,
                muted: volume == 0.0,
                shuffle: settings.shuffle,
                repeat: settings.repeat.into(),
                ..PlaybackSession::default()
            },
            queue: Vec::new(),
            index: None,
            pre_mute_volume: volume,
            default_volume: if volume > 0.0 { volume } else { 1.0 },
            fallback_duration: Duration::from_secs(settings.fallback_duration_secs),
            rng: StdRng::from_entropy(),
            yielded,
            _yield_listener: yield_listener,
            events: Observers::new(),
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> TransportState {
        self.session.state()
    }

    #[cfg(test)]
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TransportEvent) -> Result<(), ListenerError> + 'static,
    {
        self.events.subscribe(callback)
    }

    fn publish(&self, event: TransportEvent) {
        self.events.notify(&event);
    }

    fn with_output<R>(&self, f: impl FnOnce(&mut dyn AudioOutput) -> R) -> R {
        let mut output = self.handle.output().borrow_mut();
        f(&mut *output)
    }

    /// Replace the queue with `tracks` and load `tracks[start]`.
    pub fn load_queue(&mut self, tracks: Vec<Track>, start: usize) -> Result<(), TransportError> {
        if tracks.is_empty() {
            self.stop();
            self.queue.clear();
            self.index = None;
            self.session.track = None;
            self.session.duration = Duration::ZERO;
            self.publish(TransportEvent::TrackChanged {
                track: None,
                index: None,
            });
            self.publish(TransportEvent::StateChanged(self.state()));
            return Ok(());
        }
        let start = start.min(tracks.len() - 1);
        self.queue = tracks;
        self.load_index(start)
    }

    /// Load `track`, keeping the queue when it already contains it.
    pub fn load_track(&mut self, track: Track) -> Result<(), TransportError> {
        match self.queue.iter().position(|t| t.id == track.id) {
            Some(i) => self.load_index(i),
            None => {
                self.queue = vec![track];
                self.load_index(0)
            }
        }
    }

    fn load_index(&mut self, index: usize) -> Result<(), TransportError> {
        let track = self.queue[index].clone();
        let resume = self.session.playing;

        self.with_output(|o| {
            if let Err(e) = o.stop() {
                debug!(error = %e, "stop before load failed");
            }
        });
        self.session.playing = false;
        self.session.position = Duration::ZERO;
        self.session.track = Some(track.clone());
        self.index = Some(index);

        let loaded = self.with_output(|o| o.load(&track.source));
        let result = match loaded {
            Ok(decoded) => {
                self.session.duration = track
                    .duration
                    .or(decoded)
                    .unwrap_or(self.fallback_duration);
                info!(title = %track.title, index, "track loaded");
                Ok(())
            }
            Err(source) => {
                self.session.duration = self.fallback_duration;
                warn!(title = %track.title, error = %source, "track failed to load");
                Err(TransportError::LoadFailure {
                    title: track.title.clone(),
                    source,
                })
            }
        };

        self.publish(TransportEvent::TrackChanged {
            track: Some(track),
            index: Some(index),
        });
        self.publish(TransportEvent::PositionChanged(Duration::ZERO));

        match result {
            Ok(()) if resume => self.play(),
            Ok(()) => {
                self.publish(TransportEvent::StateChanged(self.state()));
                Ok(())
            }
            Err(e) => {
                self.publish(TransportEvent::Failed {
                    kind: FailureKind::Load,
                    message: e.to_string(),
                });
                self.publish(TransportEvent::StateChanged(self.state()));
                Err(e)
            }
        }
    }

    /// Claim the playback resource, then start the output.
    ///
    /// A rejected start leaves the state unchanged and is not retried.
    pub fn play(&mut self) -> Result<(), TransportError> {
        if self.session.track.is_none() {
            return Err(TransportError::NothingLoaded);
        }
        self.apply_yield();
        if self.session.playing {
            return Ok(());
        }

        // Any other output is paused before ours starts emitting.
        self.resource.set_active(&self.handle, &self.label);
        self.yielded.set(false);

        match self.with_output(|o| o.start()) {
            Ok(()) => {
                self.session.playing = true;
                debug!(output = %self.handle.id(), "playing");
                self.publish(TransportEvent::StateChanged(TransportState::Playing));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "output refused to start");
                self.resource.clear_active(&self.handle);
                self.publish(TransportEvent::Failed {
                    kind: FailureKind::Rejected,
                    message: e.to_string(),
                });
                Err(TransportError::PlaybackRejected(e))
            }
        }
    }

    pub fn pause(&mut self) {
        self.apply_yield();
        if !self.session.playing {
            return;
        }
        let position = self.with_output(|o| {
            if let Err(e) = o.stop() {
                debug!(error = %e, "pause failed");
            }
            o.position()
        });
        self.session.position = position.min(self.session.duration);
        self.session.playing = false;
        self.publish(TransportEvent::StateChanged(TransportState::Paused));
    }

    pub fn toggle_play(&mut self) -> Result<(), TransportError> {
        self.apply_yield();
        if self.session.playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Pause, rewind and give the playback resource back.
    pub fn stop(&mut self) {
        self.halt();
        self.resource.clear_active(&self.handle);
        self.publish(TransportEvent::StateChanged(self.state()));
        self.publish(TransportEvent::PositionChanged(Duration::ZERO));
    }

    fn halt(&mut self) {
        self.with_output(|o| {
            if let Err(e) = o.stop() {
                debug!(error = %e, "stop failed");
            }
            if let Err(e) = o.seek(Duration::ZERO) {
                debug!(error = %e, "rewind failed");
            }
        });
        self.session.playing = false;
        self.session.position = Duration::ZERO;
    }

    /// Move to `position`, clamped to the current track's duration.
    pub fn seek(&mut self, position: Duration) {
        if self.session.track.is_none() {
            return;
        }
        let target = position.min(self.session.duration);
        if let Err(e) = self.with_output(|o| o.seek(target)) {
            warn!(error = %e, ?target, "seek failed");
        }
        self.session.position = target;
        self.publish(TransportEvent::PositionChanged(target));
    }

    /// Seek relative to the current position by `delta_secs` (may be negative).
    pub fn seek_by(&mut self, delta_secs: i64) {
        let delta = Duration::from_secs(delta_secs.unsigned_abs());
        let target = if delta_secs < 0 {
            self.session.position.saturating_sub(delta)
        } else {
            self.session.position.saturating_add(delta)
        };
        self.seek(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = sanitize_volume(volume);
        if volume == 0.0 {
            if !self.session.muted && self.session.volume > 0.0 {
                self.pre_mute_volume = self.session.volume;
            }
            self.session.muted = true;
        } else {
            self.session.muted = false;
        }
        self.session.volume = volume;
        self.with_output(|o| o.set_volume(volume));
        self.publish(TransportEvent::VolumeChanged {
            volume,
            muted: self.session.muted,
        });
    }

    pub fn toggle_mute(&mut self) {
        if self.session.muted {
            let restore = if self.pre_mute_volume > 0.0 {
                self.pre_mute_volume
            } else {
                self.default_volume
            };
            self.set_volume(restore);
        } else {
            self.pre_mute_volume = self.session.volume;
            self.set_volume(0.0);
        }
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.session.shuffle = shuffle;
        self.publish_modes();
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.session.shuffle);
    }

    pub fn set_repeat(&mut self, repeat: impl Into<RepeatMode>) {
        self.session.repeat = repeat.into();
        self.publish_modes();
    }

    pub fn cycle_repeat(&mut self) {
        self.set_repeat(self.session.repeat.cycled());
    }

    fn publish_modes(&self) {
        self.publish(TransportEvent::ModesChanged {
            shuffle: self.session.shuffle,
            repeat: self.session.repeat,
        });
    }

    /// Move to the next or previous track of the queue.
    ///
    /// `Previous` always steps back modulo the queue length. Past the last
    /// track without wrap-around the session is paused and rewound.
    pub fn advance(&mut self, direction: Direction) -> Result<(), TransportError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let Some(current) = self.index else {
            return self.load_index(0);
        };

        match self.pick_target(current, direction) {
            Some(target) => self.load_index(target),
            None => {
                info!("end of queue");
                self.halt();
                self.resource.clear_active(&self.handle);
                self.publish(TransportEvent::StateChanged(self.state()));
                self.publish(TransportEvent::PositionChanged(Duration::ZERO));
                Ok(())
            }
        }
    }

    fn pick_target(&mut self, current: usize, direction: Direction) -> Option<usize> {
        let len = self.queue.len();
        if self.session.shuffle && len > 1 {
            // Uniform over every index except `current`.
            let pick = self.rng.gen_range(0..len - 1);
            return Some(if pick >= current { pick + 1 } else { pick });
        }

        match direction {
            Direction::Next if current + 1 < len => Some(current + 1),
            Direction::Next if self.session.repeat.wraps() => Some(0),
            Direction::Next => None,
            Direction::Previous => Some((current + len - 1) % len),
        }
    }

    /// React to an event reported by the output.
    pub fn handle_output_event(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::Ended => {
                self.resource.clear_active(&self.handle);
                let result = match (self.session.repeat, self.index) {
                    (RepeatMode::One, Some(i)) => self.load_index(i),
                    _ => self.advance(Direction::Next),
                };
                if let Err(e) = result {
                    warn!(error = %e, "could not continue after track end");
                }
            }
            OutputEvent::Error(message) => {
                warn!(%message, "output error");
                self.session.playing = false;
                self.resource.clear_active(&self.handle);
                self.publish(TransportEvent::Failed {
                    kind: FailureKind::Device,
                    message,
                });
                self.publish(TransportEvent::StateChanged(self.state()));
            }
        }
    }

    /// Fold a pending yield notice into the session.
    ///
    /// The output is stopped again here: the resource could not pause it if
    /// it was borrowed when another output claimed the resource.
    fn apply_yield(&mut self) {
        if !self.yielded.replace(false) || !self.session.playing {
            return;
        }
        debug!(output = %self.handle.id(), "yielded to another output");
        let position = self.with_output(|o| {
            if let Err(e) = o.stop() {
                debug!(error = %e, "stop after yield failed");
            }
            o.position()
        });
        self.session.position = position.min(self.session.duration);
        self.session.playing = false;
        self.publish(TransportEvent::StateChanged(TransportState::Paused));
    }

    /// Called once per refresh: applies yields, drains output events and
    /// refreshes the position.
    pub fn tick(&mut self) {
        self.apply_yield();

        while let Some(event) = self.with_output(|o| o.poll_event()) {
            self.handle_output_event(event);
        }

        if self.session.playing {
            let position = self
                .with_output(|o| o.position())
                .min(self.session.duration);
            let whole_second_changed = position.as_secs() != self.session.position.as_secs();
            self.session.position = position;
            if whole_second_changed {
                self.publish(TransportEvent::PositionChanged(position));
            }
        }
    }

    /// Ramp the volume down over `over`, then stop. The session volume is kept.
    pub fn fade_out(&mut self, over: Duration) {
        if self.session.playing && !over.is_zero() {
            let start = self.session.volume;
            let step = over / FADE_STEPS;
            for i in 1..=FADE_STEPS {
                let t = i as f32 / FADE_STEPS as f32;
                self.with_output(|o| o.set_volume(start * (1.0 - t)));
                thread::sleep(step);
            }
        }
        self.stop();
        let volume = self.session.volume;
        self.with_output(|o| o.set_volume(volume));
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.resource.clear_active(&self.handle);
    }
}

fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
