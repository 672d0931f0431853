//! Audio subsystem: the playback core.
//!
//! - `resource`: the single playback resource every output claims before it
//!   may make sound.
//! - `transport`: the transport state machine driving one output.
//! - `output` / `rodio_output`: the capability interface and its rodio backend.
//! - `tap`: sample capture feeding the waveform view.

mod observers;
mod output;
mod resource;
mod rodio_output;
mod session;
mod tap;
mod transport;

#[cfg(test)]
mod mock;

pub use observers::Subscription;
pub use output::SharedOutput;
pub use resource::PlaybackResource;
pub use rodio_output::RodioOutput;
pub use session::{Direction, FailureKind, RepeatMode, TransportEvent, TransportState};
pub use tap::SampleBuffer;
pub use transport::Transport;
