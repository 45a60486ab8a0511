//! Clock source and token expiry arithmetic.

use chrono::{DateTime, Duration, Utc};

/// Wall-clock source used for issuance and expiry bookkeeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Absolute expiry of something issued at `now` that lives `lifetime_secs`.
///
/// Saturates at [`DateTime::<Utc>::MAX_UTC`] instead of overflowing.
pub fn compute_expiry(now: DateTime<Utc>, lifetime_secs: u64) -> DateTime<Utc> {
    i64::try_from(lifetime_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
