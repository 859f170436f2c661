//! Injectable wall clock for timestamping persisted records.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Returns the current time. Shared by the submitter and listener.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// A clock frozen at `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}
