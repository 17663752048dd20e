//! # Sync Throttle
//!
//! Writing the status hash back to the ApiEndpoints triggers another watch
//! event for it. A changed hash always syncs; an unchanged one only syncs once
//! the minimum interval has passed since the last sync.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whether a resync is due
///
/// A resource that was never synchronized is always due.
#[must_use]
pub fn should_sync(
    last_hash: Option<&str>,
    current_hash: &str,
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> bool {
    if last_hash != Some(current_hash) {
        return true;
    }
    match last_sync {
        None => true,
        Some(last) => elapsed(last, now) >= min_interval,
    }
}

/// Time left until an unchanged resource is due again
#[must_use]
pub fn time_until_due(
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> Duration {
    match last_sync {
        None => Duration::ZERO,
        Some(last) => min_interval.saturating_sub(elapsed(last, now)),
    }
}

// A last sync in the future (clock skew) counts as just now.
fn elapsed(last: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - last).to_std().unwrap_or(Duration::ZERO)
}
