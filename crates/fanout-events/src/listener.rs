//! Listener handles and the fire-once wrapper.
//!
//! A [`Listener`] is a reference-counted handle; clones share identity, and
//! identity (not closure equality) is what removal matches on. Handles built
//! by [`Emitter::once`] record the listener they wrap so callers can remove
//! or inspect them through the original handle.
//!
//! Callbacks are `Send + Sync` even though an [`Emitter`] is used from one
//! thread: listeners travel inside [`Arg`] payloads and therefore inside
//! [`EmitterError`](crate::EmitterError), which must stay convertible into a
//! [`BoxError`](crate::BoxError) so nested emitter failures can be forwarded.

use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::emitter::Emitter;
use crate::error::EmitterResult;
use crate::payloads::Arg;

type Callback = dyn Fn(&Emitter, &[Arg]) -> EmitterResult<()> + Send + Sync;

struct ListenerInner {
    callback: Box<Callback>,
    origin: Option<Listener>,
}

/// Cloneable handle around a listener callback.
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

impl Listener {
    /// Wrap `callback` in a new handle with its own identity.
    ///
    /// The callback receives the emitter that dispatched the event, so it can
    /// register, remove or emit re-entrantly.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Emitter, &[Arg]) -> EmitterResult<()> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ListenerInner {
                callback: Box::new(callback),
                origin: None,
            }),
        }
    }

    /// Build a wrapper that unregisters itself from `event` before running
    /// `original`, and runs `original` at most once.
    pub(crate) fn once(event: &str, original: Self) -> Self {
        let event = event.to_owned();
        let inner = Arc::new_cyclic(|me: &Weak<ListenerInner>| {
            let me = me.clone();
            let target = original.clone();
            let fired = AtomicBool::new(false);
            ListenerInner {
                origin: Some(original),
                callback: Box::new(move |emitter: &Emitter, args: &[Arg]| {
                    if let Some(inner) = me.upgrade() {
                        emitter.remove_listener(&event, &Self { inner })?;
                    }
                    if fired.swap(true, Ordering::AcqRel) {
                        return Ok(());
                    }
                    target.call(emitter, args)
                }),
            }
        });
        Self { inner }
    }

    /// Invoke the callback with the supplied arguments.
    ///
    /// # Errors
    ///
    /// Returns whatever error the callback reports.
    pub fn call(&self, emitter: &Emitter, args: &[Arg]) -> EmitterResult<()> {
        (self.inner.callback)(emitter, args)
    }

    /// The caller-supplied listener this handle wraps, for once-wrappers.
    #[must_use]
    pub fn original(&self) -> Option<&Self> {
        self.inner.origin.as_ref()
    }

    /// The caller-supplied listener: the wrapped one, or this handle itself.
    #[must_use]
    pub fn unwrapped(&self) -> &Self {
        self.original().unwrap_or(self)
    }

    /// Whether this handle was built by `once`.
    #[must_use]
    pub fn is_once(&self) -> bool {
        self.inner.origin.is_some()
    }

    /// Identity comparison between two handles.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this registry entry should be removed for `target`: either the
    /// same handle, or a wrapper around it.
    #[must_use]
    pub fn matches(&self, target: &Self) -> bool {
        self.ptr_eq(target) || self.original().is_some_and(|origin| origin.ptr_eq(target))
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl Debug for Listener {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Listener")
            .field("id", &Arc::as_ptr(&self.inner))
            .field("once", &self.is_once())
            .finish()
    }
}
