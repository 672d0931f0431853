//! The capability interface the transport drives.
//!
//! Anything that can start, stop and seek a single source can back the
//! transport: the rodio device in production, a scripted double in tests.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::error::OutputError;

/// Asynchronous notifications from an output, drained via [`AudioOutput::poll_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// The loaded source played to its end.
    Ended,
    /// The device failed while playing.
    Error(String),
}

pub trait AudioOutput {
    /// Replace the current source with `source`, paused at position zero.
    ///
    /// Returns the decoded duration when the backend knows it.
    fn load(&mut self, source: &Path) -> Result<Option<Duration>, OutputError>;

    /// Begin (or resume) emitting audio.
    fn start(&mut self) -> Result<(), OutputError>;

    /// Pause output. Must be harmless on an output with nothing loaded.
    fn stop(&mut self) -> Result<(), OutputError>;

    fn seek(&mut self, position: Duration) -> Result<(), OutputError>;

    fn position(&self) -> Duration;

    fn set_volume(&mut self, volume: f32);

    fn poll_event(&mut self) -> Option<OutputEvent>;
}

pub type SharedOutput = Rc<RefCell<dyn AudioOutput>>;
