//! A small single-threaded observer registry.
//!
//! Callbacks are cloned out of the registry before being invoked, so a
//! callback may subscribe, unsubscribe or call back into its owner.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::error::ListenerError;

type Callback<T> = Rc<dyn Fn(&T) -> Result<(), ListenerError>>;
type Slots<T> = RefCell<Vec<(u64, Callback<T>)>>;

pub struct Observers<T> {
    next_id: Cell<u64>,
    slots: Rc<Slots<T>>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            slots: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) -> Result<(), ListenerError> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.slots.borrow_mut().push((id, Rc::new(callback)));

        let slots: Weak<Slots<T>> = Rc::downgrade(&self.slots);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(slots) = slots.upgrade() {
                    slots.borrow_mut().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Invoke every callback with `value`. Failures are logged and skipped.
    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .slots
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            if let Err(e) = cb(value) {
                warn!(error = %e, "listener failed");
            }
        }
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregistration handle returned by `subscribe`/`on_yield`.
///
/// Dropping it removes the callback.
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
