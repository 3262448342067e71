use chrono::{Local, NaiveDate, NaiveDateTime};

/// Format used for every timestamp written to a row.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Last-post timestamp given to high priority posts. Far enough in the past
/// that the scheduler picks them first.
pub const HIGH_PRIORITY_TIMESTAMP: &str = "2020-01-01 00:00:00";

/// Last-post timestamp given to posts that wait for manual review. Far enough
/// in the future that the scheduler never picks them on its own.
pub const HELD_TIMESTAMP: &str = "2030-01-01 00:00:00";

/// A source of local wall-clock time.
///
/// Row timestamps are derived from the time a submission is processed. This
/// abstraction allows the real clock to be swapped for a fixed one in tests.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveDateTime};
/// use formpost::Clock;
///
/// struct FixedTime;
/// impl Clock for FixedTime {
///     fn now(&self) -> NaiveDateTime {
///         NaiveDate::from_ymd_opt(2024, 1, 2)
///             .and_then(|d| d.and_hms_opt(12, 0, 0))
///             .unwrap()
///     }
/// }
///
/// assert_eq!(FixedTime.now().to_string(), "2024-01-02 12:00:00");
/// ```
pub trait Clock {
    /// Returns the current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The process-local system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Pins the clock to midnight of the given day, or to the Unix epoch when
    /// the date is invalid.
    pub fn at_midnight(year: i32, month: u32, day: u32) -> Self {
        let at = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
