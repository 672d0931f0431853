//! Waveform view of whatever is currently audible.
//!
//! The visualizer only reads samples; it never touches playback state. It is
//! refreshed from the event loop and rendered as a `ratatui` canvas.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Block, Borders, Widget,
        canvas::{Canvas, Line},
    },
};
use tracing::debug;

/// Shown over the baseline while nothing is playing.
pub const IDLE_CAPTION: &str = "nothing playing";

/// Source of recent amplitude samples in `[-1, 1]`, oldest first.
pub trait SampleProvider {
    fn latest_samples(&self, count: usize) -> Vec<f32>;
}

pub struct Visualizer {
    points: usize,
    /// How many raw samples are folded into one trace.
    window: usize,
    trace: Vec<f32>,
    running: bool,
    torn_down: bool,
}

impl Visualizer {
    pub fn new(points: usize, window: usize) -> Self {
        let points = points.max(2);
        Self {
            points,
            window: window.max(points),
            trace: vec![0.0; points],
            running: false,
            torn_down: false,
        }
    }

    /// Pull fresh samples while `playing`; otherwise fall back to the idle baseline.
    pub fn refresh(&mut self, playing: bool, provider: Option<&dyn SampleProvider>) {
        if self.torn_down {
            return;
        }
        match provider {
            Some(provider) if playing => {
                if !self.running {
                    debug!("waveform started");
                }
                self.running = true;
                let samples = provider.latest_samples(self.window);
                self.trace = reduce_peaks(&samples, self.points);
            }
            _ => self.idle(),
        }
    }

    fn idle(&mut self) {
        if self.running {
            debug!("waveform stopped");
        }
        self.running = false;
        self.trace.clear();
        self.trace.resize(self.points, 0.0);
    }

    /// Cancel for good; later refreshes are ignored.
    pub fn teardown(&mut self) {
        self.idle();
        self.torn_down = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn trace(&self) -> &[f32] {
        &self.trace
    }

    pub fn caption(&self) -> Option<&'static str> {
        (!self.running).then_some(IDLE_CAPTION)
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Fold `samples` into `points` buckets, keeping the signed sample with the
/// largest magnitude of each bucket. Empty buckets sit on the baseline.
fn reduce_peaks(samples: &[f32], points: usize) -> Vec<f32> {
    let n = samples.len();
    (0..points)
        .map(|i| {
            let start = i * n / points;
            let end = ((i + 1) * n / points).min(n);
            samples[start..end]
                .iter()
                .copied()
                .filter(|s| s.is_finite())
                .fold(0.0_f32, |peak, s| if s.abs() > peak.abs() { s } else { peak })
                .clamp(-1.0, 1.0)
        })
        .collect()
}

impl Widget for &Visualizer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.points - 1) as f64;
        let caption = self.caption();
        Canvas::default()
            .block(Block::default().borders(Borders::ALL).title(" waveform "))
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                for (i, pair) in self.trace.windows(2).enumerate() {
                    ctx.draw(&Line {
                        x1: i as f64,
                        y1: f64::from(pair[0]),
                        x2: (i + 1) as f64,
                        y2: f64::from(pair[1]),
                        color: Color::Cyan,
                    });
                }
                if let Some(caption) = caption {
                    ctx.print(0.0, 0.5, caption);
                }
            })
            .render(area, buf);
    }
}
