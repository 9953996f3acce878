//! Synchronous named-event emitter.
//!
//! Dispatch iterates a snapshot of the listener set taken when `emit` starts,
//! so a listener may register, remove or emit re-entrantly:
//!   - a listener added during dispatch runs from the next `emit` on;
//!   - a listener removed during dispatch still runs in the current one.
//!
//! The registry is never borrowed while a listener runs. Listener errors
//! propagate out of `emit` unchanged and stop the remaining invocations.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use tracing::trace;

use crate::config::{EmitterOptions, default_max_listeners};
use crate::error::{EmitterError, EmitterResult};
use crate::leak::{self, LeakWarning};
use crate::listener::Listener;
use crate::payloads::{Arg, ERROR_EVENT, NEW_LISTENER_EVENT, REMOVE_LISTENER_EVENT};
use crate::registry::{Placement, Registry};

/// Receives unhandled `"error"` dispatches in place of the default re-raise.
pub type ErrorHook = Arc<dyn Fn(&Emitter, EmitterError) -> EmitterResult<()> + Send + Sync>;

/// Receives leak diagnostics in addition to the `tracing` warning.
pub type LeakHook = Arc<dyn Fn(&LeakWarning) + Send + Sync>;

/// Named-event listener registry and dispatch engine.
#[derive(Default)]
pub struct Emitter {
    registry: RefCell<Registry>,
    max_listeners: Cell<Option<usize>>,
    error_hook: RefCell<Option<ErrorHook>>,
    leak_hook: RefCell<Option<LeakHook>>,
}

impl Emitter {
    /// Create an empty emitter that follows the process-wide listener limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty emitter configured from `options`.
    #[must_use]
    pub fn with_options(options: &EmitterOptions) -> Self {
        let emitter = Self::new();
        emitter.max_listeners.set(options.max_listeners);
        emitter
    }

    /// Append `listener` to the set for `event`.
    ///
    /// `"newListener"` listeners are notified first, with the unwrapped
    /// listener, so the new listener never observes its own registration.
    ///
    /// # Errors
    ///
    /// Propagates failures raised by `"newListener"` listeners; the listener
    /// is not registered in that case.
    pub fn add_listener(&self, event: &str, listener: Listener) -> EmitterResult<&Self> {
        self.register(event, listener, Placement::Append)
    }

    /// Alias for [`Emitter::add_listener`].
    ///
    /// # Errors
    ///
    /// See [`Emitter::add_listener`].
    pub fn on(&self, event: &str, listener: Listener) -> EmitterResult<&Self> {
        self.add_listener(event, listener)
    }

    /// Insert `listener` at the front of the set for `event`.
    ///
    /// # Errors
    ///
    /// See [`Emitter::add_listener`].
    pub fn prepend_listener(&self, event: &str, listener: Listener) -> EmitterResult<&Self> {
        self.register(event, listener, Placement::Prepend)
    }

    /// Append a wrapper that removes itself and runs `listener` at most once.
    ///
    /// The wrapper can be removed through the original `listener` handle.
    ///
    /// # Errors
    ///
    /// See [`Emitter::add_listener`].
    pub fn once(&self, event: &str, listener: Listener) -> EmitterResult<&Self> {
        self.register(event, Listener::once(event, listener), Placement::Append)
    }

    /// Like [`Emitter::once`], but inserts the wrapper at the front.
    ///
    /// # Errors
    ///
    /// See [`Emitter::add_listener`].
    pub fn prepend_once_listener(&self, event: &str, listener: Listener) -> EmitterResult<&Self> {
        self.register(event, Listener::once(event, listener), Placement::Prepend)
    }

    /// Remove one registration of `listener` from `event`, scanning from the
    /// most recent entry. Does nothing if no entry matches.
    ///
    /// After the removal, `"removeListener"` listeners are notified with the
    /// original listener identity.
    ///
    /// # Errors
    ///
    /// Propagates failures raised by `"removeListener"` listeners; the
    /// removal itself has already happened.
    pub fn remove_listener(&self, event: &str, listener: &Listener) -> EmitterResult<&Self> {
        let removed = self.registry.borrow_mut().remove(event, listener);
        let Some(removed) = removed else {
            return Ok(self);
        };
        trace!(event, "listener removed");

        if self.has_listeners(REMOVE_LISTENER_EVENT) {
            self.emit(
                REMOVE_LISTENER_EVENT,
                &[Arg::from(event), Arg::from(removed.unwrapped().clone())],
            )?;
        }
        Ok(self)
    }

    /// Alias for [`Emitter::remove_listener`].
    ///
    /// # Errors
    ///
    /// See [`Emitter::remove_listener`].
    pub fn off(&self, event: &str, listener: &Listener) -> EmitterResult<&Self> {
        self.remove_listener(event, listener)
    }

    /// Remove every listener of `event`, or of every event when `None`.
    ///
    /// While `"removeListener"` listeners exist, each entry is removed
    /// individually, most recent first, so every removal is observed;
    /// `"removeListener"` listeners themselves go last.
    ///
    /// # Errors
    ///
    /// Propagates failures raised by `"removeListener"` listeners.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> EmitterResult<&Self> {
        if !self.has_listeners(REMOVE_LISTENER_EVENT) {
            let mut registry = self.registry.borrow_mut();
            match event {
                Some(event) => registry.clear_event(event),
                None => registry.clear(),
            }
            return Ok(self);
        }

        let Some(event) = event else {
            let names = self.registry.borrow().event_names();
            for name in names.iter().filter(|name| *name != REMOVE_LISTENER_EVENT) {
                self.remove_all_listeners(Some(name.as_str()))?;
            }
            self.remove_all_listeners(Some(REMOVE_LISTENER_EVENT))?;
            self.registry.borrow_mut().clear();
            return Ok(self);
        };

        let entries = self.registry.borrow().snapshot(event).unwrap_or_default();
        for entry in entries.iter().rev() {
            self.remove_listener(event, entry)?;
        }
        self.registry.borrow_mut().clear_event(event);
        Ok(self)
    }

    /// Override the listener limit for this emitter; `0` means unlimited.
    pub fn set_max_listeners(&self, limit: usize) -> &Self {
        self.max_listeners.set(Some(limit));
        self
    }

    /// Effective listener limit: the instance override, else the process-wide
    /// default.
    #[must_use]
    pub fn max_listeners(&self) -> usize {
        self.max_listeners
            .get()
            .unwrap_or_else(default_max_listeners)
    }

    /// Copy of the listeners registered for `event`, in dispatch order.
    ///
    /// Once-wrappers are returned as registered; see [`Listener::original`].
    #[must_use]
    pub fn listeners(&self, event: &str) -> Vec<Listener> {
        self.registry.borrow().snapshot(event).unwrap_or_default()
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.borrow().len(event)
    }

    /// Events with at least one listener, in first-registration order.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.registry.borrow().event_names()
    }

    /// Route unhandled `"error"` dispatches to `hook` instead of returning
    /// them from `emit`.
    pub fn set_error_hook<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Self, EmitterError) -> EmitterResult<()> + Send + Sync + 'static,
    {
        *self.error_hook.borrow_mut() = Some(Arc::new(hook));
        self
    }

    /// Restore the default escalation for unhandled `"error"` dispatches.
    pub fn clear_error_hook(&self) -> &Self {
        *self.error_hook.borrow_mut() = None;
        self
    }

    /// Forward leak diagnostics to `hook`.
    pub fn set_leak_hook<F>(&self, hook: F) -> &Self
    where
        F: Fn(&LeakWarning) + Send + Sync + 'static,
    {
        *self.leak_hook.borrow_mut() = Some(Arc::new(hook));
        self
    }

    /// Invoke every listener registered for `event` with `args`.
    ///
    /// Returns `Ok(true)` if the event had listeners and `Ok(false)` if not.
    ///
    /// # Errors
    ///
    /// - The first listener failure, unchanged; later listeners do not run.
    /// - For `"error"` without listeners and without an error hook:
    ///   [`EmitterError::Unhandled`] when the first argument is a structured
    ///   error, else [`EmitterError::UnhandledSignal`].
    pub fn emit(&self, event: &str, args: &[Arg]) -> EmitterResult<bool> {
        let snapshot = self.registry.borrow().snapshot(event);
        let Some(snapshot) = snapshot else {
            if event == ERROR_EVENT {
                return self.escalate(args);
            }
            return Ok(false);
        };

        trace!(
            event,
            listeners = snapshot.len(),
            args = args.len(),
            "dispatching event"
        );
        for listener in &snapshot {
            listener.call(self, args)?;
        }
        Ok(true)
    }

    fn register(
        &self,
        event: &str,
        listener: Listener,
        placement: Placement,
    ) -> EmitterResult<&Self> {
        if self.has_listeners(NEW_LISTENER_EVENT) {
            self.emit(
                NEW_LISTENER_EVENT,
                &[Arg::from(event), Arg::from(listener.unwrapped().clone())],
            )?;
        }

        let limit = self.max_listeners();
        let warning = {
            let mut registry = self.registry.borrow_mut();
            let set = registry.insert(event, listener, placement);
            leak::inspect(event, set, limit)
        };
        trace!(event, ?placement, "listener registered");

        if let Some(warning) = warning {
            let hook = self.leak_hook.borrow().clone();
            if let Some(hook) = hook {
                hook(&warning);
            }
        }
        Ok(self)
    }

    fn escalate(&self, args: &[Arg]) -> EmitterResult<bool> {
        let err = EmitterError::unhandled(args);
        let hook = self.error_hook.borrow().clone();
        match hook {
            Some(hook) => {
                hook(self, err)?;
                Ok(false)
            }
            None => Err(err),
        }
    }

    fn has_listeners(&self, event: &str) -> bool {
        self.registry.borrow().contains(event)
    }
}

impl Debug for Emitter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Emitter")
            .field("events", &self.event_names())
            .field("max_listeners", &self.max_listeners())
            .finish_non_exhaustive()
    }
}

/// Number of listeners `emitter` has registered for `event`.
#[must_use]
pub fn listener_count(emitter: &Emitter, event: &str) -> usize {
    emitter.listener_count(event)
}
