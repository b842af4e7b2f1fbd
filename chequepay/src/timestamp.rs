//! Wall-clock values used by invoices and cheques.
//!
//! Invoices carry their creation time and expiry in Unix seconds, and a quote
//! reports the resulting expiry as an RFC 3339 string. Cheque timeouts are
//! POSIX milliseconds and are compared against [`now_millis`].

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

/// A Unix timestamp in seconds since 1970-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Adds a number of seconds, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add_secs(self, secs: u64) -> Option<Self> {
        match self.0.checked_add(secs) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Renders the timestamp as RFC 3339 UTC with millisecond precision,
    /// e.g. `2023-11-14T23:13:20.000Z`.
    ///
    /// Returns `None` when the value is past the range chrono can represent.
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        let secs = i64::try_from(self.0).ok()?;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Returns the current time in POSIX milliseconds.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch,
/// which should never happen on properly configured systems.
#[must_use]
pub fn now_millis() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("SystemTime before UNIX epoch?!?");
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
