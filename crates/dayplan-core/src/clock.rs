//! Civil clock model.
//!
//! All placement math runs on integer minutes since local midnight of the
//! target date. Timestamps only appear at the boundary, through [`Clock`].
//!
//! The UTC offset of the local zone is supplied by an [`OffsetPolicy`]. The
//! default [`SeasonalOffset`] is a fixed policy with two offsets switching on
//! day-of-year ordinals; it is not a DST table and can be swapped out.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Minutes in one civil day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Supplies the local zone's UTC offset for a calendar date.
pub trait OffsetPolicy: Send + Sync {
    /// Offset east of UTC, in minutes, that applies on `date`.
    fn offset_minutes(&self, date: NaiveDate) -> i64;
}

/// Two fixed offsets selected by day-of-year.
///
/// Summer applies on ordinals in `[summer_start_ordinal, summer_end_ordinal)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOffset {
    #[serde(default = "default_standard_minutes")]
    pub standard_minutes: i64,
    #[serde(default = "default_summer_minutes")]
    pub summer_minutes: i64,
    #[serde(default = "default_summer_start")]
    pub summer_start_ordinal: u32,
    #[serde(default = "default_summer_end")]
    pub summer_end_ordinal: u32,
}

fn default_standard_minutes() -> i64 {
    60
}
fn default_summer_minutes() -> i64 {
    120
}
fn default_summer_start() -> u32 {
    88
}
fn default_summer_end() -> u32 {
    300
}

impl Default for SeasonalOffset {
    fn default() -> Self {
        Self {
            standard_minutes: default_standard_minutes(),
            summer_minutes: default_summer_minutes(),
            summer_start_ordinal: default_summer_start(),
            summer_end_ordinal: default_summer_end(),
        }
    }
}

impl SeasonalOffset {
    pub fn is_summer(&self, date: NaiveDate) -> bool {
        let ordinal = date.ordinal();
        ordinal >= self.summer_start_ordinal && ordinal < self.summer_end_ordinal
    }
}

impl OffsetPolicy for SeasonalOffset {
    fn offset_minutes(&self, date: NaiveDate) -> i64 {
        if self.is_summer(date) {
            self.summer_minutes
        } else {
            self.standard_minutes
        }
    }
}

/// A single offset for every date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOffset(pub i64);

impl OffsetPolicy for FixedOffset {
    fn offset_minutes(&self, _date: NaiveDate) -> i64 {
        self.0
    }
}

/// Converts between day-local minutes and absolute timestamps.
#[derive(Clone)]
pub struct Clock {
    policy: Arc<dyn OffsetPolicy>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock").finish_non_exhaustive()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(SeasonalOffset::default())
    }
}

impl Clock {
    pub fn new(policy: impl OffsetPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn offset_minutes(&self, date: NaiveDate) -> i64 {
        self.policy.offset_minutes(date)
    }

    /// Absolute instant of `minute` past local midnight of `date`.
    ///
    /// Minutes outside `0..1440` roll onto neighbouring dates, and the offset
    /// of the rolled date is used. `to_absolute(d, 1440 + 360)` is 06:00 on
    /// the day after `d`.
    pub fn to_absolute(&self, date: NaiveDate, minute: i64) -> DateTime<Utc> {
        let day_shift = minute.div_euclid(MINUTES_PER_DAY);
        let minute_of_day = minute.rem_euclid(MINUTES_PER_DAY);
        let local_date = date + Duration::days(day_shift);
        let local_midnight = local_date.and_time(NaiveTime::MIN);
        let naive_utc = local_midnight + Duration::minutes(minute_of_day - self.offset_minutes(local_date));
        Utc.from_utc_datetime(&naive_utc)
    }

    /// Minutes from local midnight of `date` to `instant`, rounded down.
    ///
    /// Negative before the day starts, `>= 1440` after it ends.
    pub fn local_minute(&self, date: NaiveDate, instant: DateTime<Utc>) -> i64 {
        let midnight = self.to_absolute(date, 0);
        (instant - midnight).num_seconds().div_euclid(60)
    }

    /// Like [`Clock::local_minute`] but rounded up to the next whole minute.
    pub fn local_minute_ceil(&self, date: NaiveDate, instant: DateTime<Utc>) -> i64 {
        let midnight = self.to_absolute(date, 0);
        let seconds = (instant - midnight).num_seconds();
        seconds.div_euclid(60) + i64::from(seconds.rem_euclid(60) != 0)
    }

    /// UTC `[start, end)` of the local day `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.to_absolute(date, 0), self.to_absolute(date, MINUTES_PER_DAY))
    }

    /// Local calendar date at `now`: the date whose [`Clock::day_bounds`]
    /// contain `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let utc_date = now.date_naive();
        let candidate = (now + Duration::minutes(self.offset_minutes(utc_date))).date_naive();
        // The UTC date's offset can differ from the local date's near a switch.
        if now < self.to_absolute(candidate, 0) {
            candidate - Duration::days(1)
        } else if now >= self.to_absolute(candidate, MINUTES_PER_DAY) {
            candidate + Duration::days(1)
        } else {
            candidate
        }
    }
}

/// Formats a minute-of-day as `HH:MM`.
pub fn format_minute(minute: i64) -> String {
    let m = minute.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Parses `HH:MM` into minutes since midnight.
pub fn parse_minute(raw: &str) -> Option<i64> {
    let (h, m) = raw.trim().split_once(':')?;
    let hour: i64 = h.parse().ok()?;
    let minute: i64 = m.parse().ok()?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Serde adapter storing minute-of-day fields as `"HH:MM"` strings.
pub mod hhmm {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(minute: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_minute(*minute))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_minute(&raw)
            .ok_or_else(|| de::Error::custom(format!("expected HH:MM, got '{raw}'")))
    }
}
