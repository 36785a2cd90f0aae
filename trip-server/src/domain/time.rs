//! Instants as nanosecond timestamps.
//!
//! Route schedules, booking times and review times are all carried as
//! integer nanoseconds since the Unix epoch. [`Timestamp`] wraps that
//! integer and converts to `chrono` types for display and arithmetic.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An instant, in nanoseconds since 1970-01-01T00:00:00Z.
///
/// # Examples
///
/// ```
/// use trip_server::domain::Timestamp;
///
/// let t = Timestamp::from_nanos(1_700_000_000_000_000_000);
/// assert_eq!(t.to_string(), "2023-11-14T22:13:20Z");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The epoch. Routes with an empty schedule sort as departing here.
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from a chrono UTC datetime, saturating outside the i64 range
    /// (roughly years 1677..2262).
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        match dt.timestamp_nanos_opt() {
            Some(nanos) => Self(nanos),
            None if dt.timestamp() < 0 => Self(i64::MIN),
            None => Self(i64::MAX),
        }
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    /// Shift by a chrono duration, saturating.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let nanos = duration.num_nanoseconds().unwrap_or(if duration < Duration::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        Self(self.0.saturating_add(nanos))
    }

    /// Signed duration from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration::nanoseconds(self.0.saturating_sub(earlier.0))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_datetime()
                .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
        )
    }
}
