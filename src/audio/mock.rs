//! Scripted `AudioOutput` for tests.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::error::OutputError;

use super::output::{AudioOutput, OutputEvent};

#[derive(Debug, Default)]
pub struct MockOutput {
    pub loaded: Option<PathBuf>,
    pub running: bool,
    pub position: Duration,
    pub volume: f32,
    pub decoded_duration: Option<Duration>,
    /// Sources whose `load` fails.
    pub broken: HashSet<PathBuf>,
    pub reject_start: bool,
    pub fail_stop: bool,
    pub starts: usize,
    pub stops: usize,
    pub events: VecDeque<OutputEvent>,
}

impl MockOutput {
    pub fn shared() -> Rc<RefCell<MockOutput>> {
        Rc::new(RefCell::new(MockOutput::default()))
    }

    /// Pretend the loaded source played to the end.
    pub fn finish(&mut self) {
        self.running = false;
        self.events.push_back(OutputEvent::Ended);
    }
}

impl AudioOutput for MockOutput {
    fn load(&mut self, source: &Path) -> Result<Option<Duration>, OutputError> {
        self.running = false;
        self.position = Duration::ZERO;
        if self.broken.contains(source) {
            self.loaded = None;
            return Err(OutputError::Open {
                path: source.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.loaded = Some(source.to_path_buf());
        Ok(self.decoded_duration)
    }

    fn start(&mut self) -> Result<(), OutputError> {
        if self.reject_start {
            return Err(OutputError::Rejected("device not ready".into()));
        }
        if self.loaded.is_none() {
            return Err(OutputError::NotLoaded);
        }
        self.running = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), OutputError> {
        self.stops += 1;
        self.running = false;
        if self.fail_stop {
            return Err(OutputError::Rejected("device detached".into()));
        }
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), OutputError> {
        if self.loaded.is_none() {
            return Err(OutputError::NotLoaded);
        }
        self.position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        self.events.pop_front()
    }
}
