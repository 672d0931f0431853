//! Library scanning: turns a music directory into albums of tracks.
//!
//! The playback core only ever sees the resolved `Album`/`Track` values
//! produced here.

mod display;
mod model;
mod scan;

pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
