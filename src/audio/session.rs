//! Playback session state and the small enums the transport is driven by.

use std::time::Duration;

use crate::config::RepeatSetting;
use crate::library::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    Off,
    /// Wrap around to the start of the queue.
    All,
    /// Replay the current track when it ends.
    One,
}

impl RepeatMode {
    /// Whether advancing past the last track wraps to the first.
    pub fn wraps(self) -> bool {
        self == Self::All
    }

    /// `Off -> All -> One -> Off`.
    pub fn cycled(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl From<RepeatSetting> for RepeatMode {
    fn from(s: RepeatSetting) -> Self {
        match s {
            RepeatSetting::Off => Self::Off,
            RepeatSetting::All => Self::All,
            RepeatSetting::One => Self::One,
        }
    }
}

impl From<bool> for RepeatMode {
    fn from(repeat: bool) -> Self {
        if repeat { Self::All } else { Self::Off }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No track loaded.
    #[default]
    Idle,
    /// A track is loaded and paused.
    Paused,
    /// A track is loaded and audible.
    Playing,
}

/// What is audible right now, as seen by one transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub track: Option<Track>,
    /// Offset into `track`; reset whenever the track changes.
    pub position: Duration,
    pub duration: Duration,
    /// 0.0 - 1.0
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub playing: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            track: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat: RepeatMode::Off,
            playing: false,
        }
    }
}

impl PlaybackSession {
    pub fn state(&self) -> TransportState {
        match (&self.track, self.playing) {
            (None, _) => TransportState::Idle,
            (Some(_), false) => TransportState::Paused,
            (Some(_), true) => TransportState::Playing,
        }
    }
}

/// Published to transport subscribers after every observable change.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    TrackChanged {
        track: Option<Track>,
        index: Option<usize>,
    },
    StateChanged(TransportState),
    PositionChanged(Duration),
    VolumeChanged { volume: f32, muted: bool },
    ModesChanged { shuffle: bool, repeat: RepeatMode },
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The source could not be resolved.
    Load,
    /// The device refused to start.
    Rejected,
    /// The device reported an error while playing.
    Device,
}
