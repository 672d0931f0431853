//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the album library, the
//! browsing cursor and the last-known transport snapshot.

mod model;

pub use model::*;
