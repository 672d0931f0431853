//! Error types shared by the playback core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an audio output backend.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("audio device unavailable: {0}")]
    Device(#[from] rodio::StreamError),
    #[error("seek failed: {0}")]
    Seek(#[from] rodio::source::SeekError),
    #[error("no source loaded")]
    NotLoaded,
    #[error("output refused: {0}")]
    Rejected(String),
}

/// Failures surfaced by the transport to its caller.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The source could not be resolved; the session was reset to a safe default.
    #[error("could not load {title:?}: {source}")]
    LoadFailure {
        title: String,
        #[source]
        source: OutputError,
    },
    /// The output refused to start. Not retried.
    #[error("playback rejected: {0}")]
    PlaybackRejected(#[source] OutputError),
    #[error("no track loaded")]
    NothingLoaded,
}

/// Error type returned by observer callbacks. Logged, never propagated.
pub type ListenerError = Box<dyn std::error::Error>;
