//! Listener leak detection.

use std::fmt::{self, Display, Formatter};

use tracing::warn;

use crate::config::UNLIMITED;
use crate::registry::ListenerSet;

/// Diagnostic produced when an event's listener count exceeds its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakWarning {
    /// Event whose listener set grew past the limit.
    pub event: String,
    /// Listener count after the registration that crossed the limit.
    pub count: usize,
    /// Effective limit at the time of the registration.
    pub limit: usize,
}

impl Display for LeakWarning {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "possible listener leak detected: {} '{}' listeners added (limit {}); use set_max_listeners to raise the limit",
            self.count, self.event, self.limit
        )
    }
}

/// Check `set` after a registration and warn at most once per set.
pub(crate) fn inspect(event: &str, set: &mut ListenerSet, limit: usize) -> Option<LeakWarning> {
    if limit == UNLIMITED || set.warned() || set.len() <= limit {
        return None;
    }
    set.mark_warned();
    let warning = LeakWarning {
        event: event.to_owned(),
        count: set.len(),
        limit,
    };
    warn!(
        event = %warning.event,
        count = warning.count,
        limit = warning.limit,
        "possible listener leak detected"
    );
    Some(warning)
}
