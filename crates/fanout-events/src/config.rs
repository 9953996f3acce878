//! Listener-limit configuration.
//!
//! # Design
//! - One process-wide default, read by every emitter without its own limit.
//!   [`set_default_max_listeners`] is the only writer.
//! - Untyped limits (JSON documents) are validated here; typed setters take
//!   `usize`, which cannot be negative.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::{EmitterError, EmitterResult};

/// Initial process-wide listener limit.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Limit value that disables leak detection.
pub const UNLIMITED: usize = 0;

static PROCESS_MAX_LISTENERS: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_LISTENERS);

/// Current process-wide listener limit.
#[must_use]
pub fn default_max_listeners() -> usize {
    PROCESS_MAX_LISTENERS.load(Ordering::Relaxed)
}

/// Replace the process-wide listener limit; `0` means unlimited.
///
/// Emitters with their own limit are unaffected.
pub fn set_default_max_listeners(limit: usize) {
    PROCESS_MAX_LISTENERS.store(limit, Ordering::Relaxed);
}

/// Validate an untyped listener limit.
///
/// # Errors
///
/// Returns [`EmitterError::InvalidArgument`] unless `value` is a non-negative
/// integer.
pub fn parse_max_listeners(value: &Value) -> EmitterResult<usize> {
    let invalid = |reason| {
        EmitterError::invalid_argument("max_listeners", reason, Some(value.to_string()))
    };

    let Value::Number(number) = value else {
        return Err(invalid("must be a number"));
    };
    if let Some(limit) = number.as_u64() {
        return usize::try_from(limit).map_err(|_| invalid("out of range"));
    }
    if number.as_i64().is_some() {
        return Err(invalid("must not be negative"));
    }
    match number.as_f64() {
        Some(float) if float < 0.0 => Err(invalid("must not be negative")),
        _ => Err(invalid("must be an integer")),
    }
}

/// Construction options for an [`Emitter`](crate::Emitter).
///
/// Deserialising validates `max_listeners` through [`parse_max_listeners`],
/// so serde input and [`EmitterOptions::from_json`] reject the same values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterOptions {
    /// Instance listener limit; `None` follows the process-wide default.
    #[serde(deserialize_with = "deserialize_max_listeners")]
    pub max_listeners: Option<usize>,
}

impl EmitterOptions {
    /// Read options from a JSON document such as `{"max_listeners": 25}`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] if the document is not an
    /// object, carries unknown keys, or holds an invalid limit.
    pub fn from_json(document: &Value) -> EmitterResult<Self> {
        if !document.is_object() {
            return Err(EmitterError::invalid_argument(
                "options",
                "must be an object",
                Some(document.to_string()),
            ));
        }
        Self::deserialize(document).map_err(|err| {
            EmitterError::invalid_argument("options", "rejected", Some(err.to_string()))
        })
    }
}

fn deserialize_max_listeners<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_max_listeners(&value).map(Some).map_err(|err| match err {
            EmitterError::InvalidArgument { field, reason, .. } => {
                <D::Error as de::Error>::custom(format_args!("{field} {reason}"))
            }
            other => <D::Error as de::Error>::custom(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reason_of(result: EmitterResult<usize>) -> &'static str {
        match result {
            Err(EmitterError::InvalidArgument { reason, .. }) => reason,
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn parse_accepts_non_negative_integers() {
        assert_eq!(parse_max_listeners(&json!(0)).ok(), Some(0));
        assert_eq!(parse_max_listeners(&json!(25)).ok(), Some(25));
    }

    #[test]
    fn parse_rejects_invalid_limits() {
        assert_eq!(reason_of(parse_max_listeners(&json!(-1))), "must not be negative");
        assert_eq!(reason_of(parse_max_listeners(&json!(-0.5))), "must not be negative");
        assert_eq!(reason_of(parse_max_listeners(&json!(2.5))), "must be an integer");
        assert_eq!(reason_of(parse_max_listeners(&json!("10"))), "must be a number");
        assert_eq!(reason_of(parse_max_listeners(&Value::Null)), "must be a number");
    }

    fn rejected_detail(result: EmitterResult<EmitterOptions>) -> String {
        match result {
            Err(EmitterError::InvalidArgument {
                field: "options",
                value: Some(detail),
                ..
            }) => detail,
            other => panic!("expected options InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn options_from_json_validates_limit() {
        assert_eq!(
            EmitterOptions::from_json(&json!({"max_listeners": 3})).ok(),
            Some(EmitterOptions {
                max_listeners: Some(3)
            })
        );
        assert_eq!(
            EmitterOptions::from_json(&json!({})).ok(),
            Some(EmitterOptions::default())
        );
        assert_eq!(
            EmitterOptions::from_json(&json!({"max_listeners": null})).ok(),
            Some(EmitterOptions::default())
        );
        assert!(
            rejected_detail(EmitterOptions::from_json(&json!({"max_listeners": -4})))
                .contains("max_listeners must not be negative")
        );
        assert!(
            rejected_detail(EmitterOptions::from_json(&json!({"max_listeners": 1.5})))
                .contains("max_listeners must be an integer")
        );
        assert!(
            rejected_detail(EmitterOptions::from_json(&json!({"limit": 4})))
                .contains("unknown field")
        );
    }

    #[test]
    fn options_from_json_requires_object() {
        match EmitterOptions::from_json(&json!([1])) {
            Err(EmitterError::InvalidArgument {
                field: "options",
                reason: "must be an object",
                ..
            }) => {}
            other => panic!("expected object rejection, got {other:?}"),
        }
    }

    #[test]
    fn options_deserialize_with_serde() -> Result<(), serde_json::Error> {
        let options: EmitterOptions = serde_json::from_value(json!({"max_listeners": 0}))?;
        assert_eq!(options.max_listeners, Some(UNLIMITED));
        let options: EmitterOptions = serde_json::from_str("{}")?;
        assert_eq!(options.max_listeners, None);
        Ok(())
    }

    #[test]
    fn serde_rejects_limits_that_parse_rejects() {
        for (input, reason) in [
            (json!({"max_listeners": -1}), "must not be negative"),
            (json!({"max_listeners": 2.5}), "must be an integer"),
            (json!({"max_listeners": "10"}), "must be a number"),
        ] {
            let Err(err) = serde_json::from_value::<EmitterOptions>(input) else {
                panic!("expected {reason} to be rejected");
            };
            assert_eq!(err.to_string(), format!("max_listeners {reason}"));
        }
    }
}
