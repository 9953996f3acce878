//! Emitter error primitives.
//!
//! # Design
//!
//! - Constant error messages; context travels in structured fields.
//! - Listener failures propagate out of `emit` unchanged, so listeners can
//!   forward nested emitter errors with `?`.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::payloads::Arg;

/// Shared structured error carried as an `"error"` event payload.
pub type SignalError = Arc<dyn StdError + Send + Sync + 'static>;

/// Boxed error reported by a failing listener.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result wrapper for emitter operations.
pub type EmitterResult<T> = Result<T, EmitterError>;

/// Errors raised by emitter operations and listener invocations.
#[derive(Debug, Error)]
pub enum EmitterError {
    /// Caller supplied a value that failed validation.
    #[error("invalid argument")]
    InvalidArgument {
        /// Argument or option that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// An `"error"` event carrying a structured error had no listeners.
    #[error("unhandled error event")]
    Unhandled {
        /// Error value passed to `emit`.
        source: SignalError,
    },
    /// An `"error"` event without a structured error payload had no listeners.
    #[error("uncaught, unspecified error event")]
    UnhandledSignal {
        /// First argument passed to `emit`, if any.
        payload: Option<Arg>,
    },
    /// A listener reported a failure of its own.
    #[error("listener failed")]
    ListenerFailed {
        /// Underlying listener error.
        source: BoxError,
    },
}

impl EmitterError {
    /// Wrap a listener's own failure so it can be returned from the callback.
    pub fn listener(source: impl Into<BoxError>) -> Self {
        Self::ListenerFailed {
            source: source.into(),
        }
    }

    pub(crate) fn invalid_argument(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidArgument {
            field,
            reason,
            value,
        }
    }

    /// Build the escalation error for an `"error"` dispatch nobody handled.
    pub(crate) fn unhandled(args: &[Arg]) -> Self {
        match args.first() {
            Some(Arg::Error(source)) => Self::Unhandled {
                source: Arc::clone(source),
            },
            payload => Self::UnhandledSignal {
                payload: payload.cloned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;

    #[test]
    fn unhandled_keeps_structured_error_as_source() {
        let original: SignalError = Arc::new(io::Error::other("disk gone"));
        let err = EmitterError::unhandled(&[Arg::Error(Arc::clone(&original))]);

        let EmitterError::Unhandled { source } = &err else {
            panic!("expected Unhandled, got {err:?}");
        };
        assert!(Arc::ptr_eq(source, &original));
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("disk gone".to_string())
        );
    }

    #[test]
    fn unhandled_wraps_plain_payload() {
        let err = EmitterError::unhandled(&[Arg::from("boom")]);
        assert!(matches!(
            &err,
            EmitterError::UnhandledSignal { payload: Some(Arg::Value(value)) } if *value == json!("boom")
        ));
        assert_eq!(err.to_string(), "uncaught, unspecified error event");

        let empty = EmitterError::unhandled(&[]);
        assert!(matches!(empty, EmitterError::UnhandledSignal { payload: None }));
    }

    #[test]
    fn listener_helper_preserves_source() {
        let err = EmitterError::listener(io::Error::other("nope"));
        assert!(matches!(err, EmitterError::ListenerFailed { .. }));
        assert_eq!(err.to_string(), "listener failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_argument_exposes_fields() {
        let err = EmitterError::invalid_argument("max_listeners", "negative", Some("-1".into()));
        assert!(matches!(
            err,
            EmitterError::InvalidArgument {
                field: "max_listeners",
                reason: "negative",
                value: Some(ref v),
            } if v == "-1"
        ));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn errors_and_payloads_cross_threads() {
        assert_send_sync::<EmitterError>();
        assert_send_sync::<Arg>();
        assert_send_sync::<crate::Listener>();
    }

    #[test]
    fn nested_emitter_error_boxes_as_listener_failure() {
        let nested = EmitterError::unhandled(&[Arg::from(crate::Listener::new(|_, _| Ok(())))]);
        let err = EmitterError::listener(nested);
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("uncaught, unspecified error event".to_string())
        );
    }
}
