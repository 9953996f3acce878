//! Dispatch argument payloads and reserved event names.

use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SignalError;
use crate::listener::Listener;

/// Reserved event dispatched before a listener is appended.
///
/// Arguments: the event name and the unwrapped listener being registered.
pub const NEW_LISTENER_EVENT: &str = "newListener";

/// Reserved event dispatched after a listener was removed.
///
/// Arguments: the event name and the original listener identity.
pub const REMOVE_LISTENER_EVENT: &str = "removeListener";

/// Reserved event that escalates when nobody listens for it.
pub const ERROR_EVENT: &str = "error";

/// A single argument passed through a dispatch.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Plain data.
    Value(Value),
    /// A listener handle, as carried by the registration notifications.
    Listener(Listener),
    /// A structured error, as carried by `"error"` events.
    Error(SignalError),
}

impl Arg {
    /// Wrap an error value for an `"error"` dispatch.
    pub fn error(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Error(Arc::new(err))
    }

    /// Borrow the JSON payload, if this argument is plain data.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the string payload, if this argument is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Read an integer payload, if this argument is a JSON integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Borrow the listener handle, if this argument carries one.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    /// Borrow the structured error, if this argument carries one.
    #[must_use]
    pub const fn as_error(&self) -> Option<&SignalError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Listener> for Arg {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

impl From<SignalError> for Arg {
    fn from(err: SignalError) -> Self {
        Self::Error(err)
    }
}

macro_rules! arg_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_json!(bool, i32, i64, u32, u64, usize, f64, String, &str);

/// Build an argument slice from values convertible into [`Arg`].
///
/// ```
/// use fanout_events::{Arg, args};
///
/// let list: Vec<Arg> = args![1, "two", true];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($value)),+]
    };
}
