//! 事件通道：一对多的同步通知
//!
//! Observers hold an `Rc` to their callback; registration identity is the
//! pointer, so registering the same `Rc` twice is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

pub type Callback<T> = Rc<dyn Fn(&T)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    UnknownCallback { channel: String },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::UnknownCallback { channel } => {
                write!(f, "unknown callback for channel \"{}\"", channel)
            }
        }
    }
}

impl std::error::Error for EventError {}

pub struct EventChannel<T> {
    name: &'static str,
    callbacks: RefCell<Vec<Callback<T>>>,
}

impl<T> EventChannel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    pub fn register(&self, callback: &Callback<T>) {
        let mut callbacks = self.callbacks.borrow_mut();
        if callbacks.iter().any(|c| Rc::ptr_eq(c, callback)) {
            return;
        }
        callbacks.push(Rc::clone(callback));
    }

    pub fn unregister(&self, callback: &Callback<T>) -> Result<(), EventError> {
        let mut callbacks = self.callbacks.borrow_mut();
        let index = callbacks
            .iter()
            .position(|c| Rc::ptr_eq(c, callback))
            .ok_or_else(|| EventError::UnknownCallback {
                channel: self.name.to_string(),
            })?;
        callbacks.remove(index);
        Ok(())
    }

    /// Invokes every registered callback in registration order.
    ///
    /// The list is snapshotted first; registrations made by a callback take
    /// effect on the next dispatch. A panicking callback is logged and the
    /// remaining callbacks still run.
    pub fn dispatch(&self, payload: &T) {
        let snapshot: Vec<Callback<T>> = self.callbacks.borrow().clone();
        for callback in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(payload)));
            if result.is_err() {
                tracing::error!(channel = self.name, "event callback panicked");
            }
        }
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("callbacks", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
