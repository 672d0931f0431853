//! The single playback resource.
//!
//! Every output that can make sound is attached here. Only one of them may be
//! active (un-paused) at a time: claiming the resource pauses whoever held it
//! and tells every listener to yield before the claimant is recorded.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ListenerError;

use super::observers::{Observers, Subscription};
use super::output::SharedOutput;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OutputId(u64);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// An output registered with a [`PlaybackResource`]. Cheap to clone.
#[derive(Clone)]
pub struct OutputHandle {
    id: OutputId,
    output: SharedOutput,
}

impl OutputHandle {
    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn output(&self) -> &SharedOutput {
        &self.output
    }
}

/// Sent to yield listeners whenever the active output changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YieldNotice {
    /// `by` took the resource; `previous` (if any) has been paused.
    Claimed {
        previous: Option<OutputId>,
        by: OutputId,
        label: String,
    },
    /// Everything was stopped.
    Stopped { previous: Option<OutputId> },
}

impl YieldNotice {
    /// The output that lost the resource, if any.
    pub fn yielded(&self) -> Option<OutputId> {
        match self {
            Self::Claimed { previous, .. } | Self::Stopped { previous } => *previous,
        }
    }
}

struct Active {
    handle: OutputHandle,
    label: String,
}

/// Owns the notion of "what is audible right now".
///
/// Constructed once at bootstrap and shared by reference with every transport.
pub struct PlaybackResource {
    next_id: Cell<u64>,
    active: RefCell<Option<Active>>,
    listeners: Observers<YieldNotice>,
}

impl PlaybackResource {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            active: RefCell::new(None),
            listeners: Observers::new(),
        }
    }

    pub fn attach(&self, output: SharedOutput) -> OutputHandle {
        let id = OutputId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        OutputHandle { id, output }
    }

    pub fn set_active(&self, handle: &OutputHandle, label: &str) {
        let previous = {
            let active = self.active.borrow();
            match active.as_ref() {
                Some(a) if a.handle.id == handle.id => return,
                Some(a) => Some(a.handle.clone()),
                None => None,
            }
        };

        if let Some(prev) = &previous {
            pause_quietly(prev, false);
        }

        self.listeners.notify(&YieldNotice::Claimed {
            previous: previous.as_ref().map(OutputHandle::id),
            by: handle.id,
            label: label.to_string(),
        });

        debug!(output = %handle.id, label, "playback resource claimed");
        *self.active.borrow_mut() = Some(Active {
            handle: handle.clone(),
            label: label.to_string(),
        });
    }

    /// Release the resource if `handle` holds it, e.g. after its source ended.
    pub fn clear_active(&self, handle: &OutputHandle) {
        let mut active = self.active.borrow_mut();
        if active.as_ref().is_some_and(|a| a.handle.id == handle.id) {
            *active = None;
            trace!(output = %handle.id, "playback resource released");
        }
    }

    pub fn on_yield<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&YieldNotice) -> Result<(), ListenerError> + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Pause and rewind the active output, notify everyone and release the resource.
    pub fn stop_all(&self) {
        let previous = self.active.borrow_mut().take();
        if let Some(prev) = &previous {
            pause_quietly(&prev.handle, true);
        }
        self.listeners.notify(&YieldNotice::Stopped {
            previous: previous.as_ref().map(|a| a.handle.id),
        });
    }

    pub fn is_active(&self, id: OutputId) -> bool {
        self.active
            .borrow()
            .as_ref()
            .is_some_and(|a| a.handle.id == id)
    }

    pub fn active_label(&self) -> Option<String> {
        self.active.borrow().as_ref().map(|a| a.label.clone())
    }
}

impl Default for PlaybackResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Pause `handle`, tolerating dead devices and outputs that are busy elsewhere.
///
/// A busy output stays audible until its transport applies the yield notice,
/// which stops it again on the next control call or tick.
fn pause_quietly(handle: &OutputHandle, rewind: bool) {
    let Ok(mut output) = handle.output.try_borrow_mut() else {
        debug!(output = %handle.id, "resource conflict: output busy, not paused");
        return;
    };
    if let Err(e) = output.stop() {
        debug!(output = %handle.id, error = %e, "ignoring pause failure");
    }
    if rewind {
        if let Err(e) = output.seek(Duration::ZERO) {
            debug!(output = %handle.id, error = %e, "ignoring rewind failure");
        }
    }
}
