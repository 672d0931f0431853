//! Sample tap: copies what rodio is mixing into a bounded buffer the
//! waveform view can read from the UI thread.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{ChannelCount, Sample, SampleRate, Source};

use crate::visualizer::SampleProvider;

/// Samples are handed over in batches to keep the mixer thread off the lock.
const FLUSH_EVERY: usize = 256;

/// Most recent mono samples, shared between the mixer thread and the UI.
#[derive(Clone)]
pub struct SampleBuffer {
    inner: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push_slice(&self, samples: &[f32]) {
        let Ok(mut buf) = self.inner.lock() else {
            return;
        };
        buf.extend(samples.iter().copied());
        let overflow = buf.len().saturating_sub(self.capacity);
        buf.drain(..overflow);
    }

    pub fn clear(&self) {
        if let Ok(mut buf) = self.inner.lock() {
            buf.clear();
        }
    }
}

impl SampleProvider for SampleBuffer {
    fn latest_samples(&self, count: usize) -> Vec<f32> {
        let Ok(buf) = self.inner.lock() else {
            return Vec::new();
        };
        let skip = buf.len().saturating_sub(count);
        buf.iter().skip(skip).copied().collect()
    }
}

/// Pass-through `Source` that records the first channel of every frame.
pub struct SampleTap<S> {
    inner: S,
    buffer: SampleBuffer,
    pending: Vec<f32>,
    channel: u32,
}

impl<S: Source> SampleTap<S> {
    pub fn new(inner: S, buffer: SampleBuffer) -> Self {
        Self {
            inner,
            buffer,
            pending: Vec::with_capacity(FLUSH_EVERY),
            channel: 0,
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.buffer.push_slice(&self.pending);
            self.pending.clear();
        }
    }
}

impl<S: Source> Iterator for SampleTap<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let Some(sample) = self.inner.next() else {
            self.flush();
            return None;
        };

        if self.channel == 0 {
            self.pending.push(sample);
            if self.pending.len() >= FLUSH_EVERY {
                self.flush();
            }
        }
        let channels = u32::from(self.inner.channels()).max(1);
        self.channel = (self.channel + 1) % channels;
        Some(sample)
    }
}

impl<S: Source> Source for SampleTap<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.channel = 0;
        self.pending.clear();
        self.inner.try_seek(pos)
    }
}

impl<S> Drop for SampleTap<S> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            self.buffer.push_slice(&self.pending);
        }
    }
}
