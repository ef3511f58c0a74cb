//! Civil calendar values, the fixed timezone table and the DST heuristic.
//!
//! The device clock runs on UTC once network time is set.  Everything the
//! door logic compares (sunrise, sunset, "now") is first shifted into the
//! configured zone with [`DateTime::in_timezone`], so all comparisons are
//! made in one frame.
//!
//! ```text
//!   ClockPort::now() (UTC) ──in_timezone("EST")──▶ local DateTime
//!                                 │
//!                  offset(-5) + is_dst(date) ? 1 : 0
//! ```
//!
//! Calendar math (weekday, ordinal day, epoch seconds) is proleptic
//! Gregorian via `chrono`, with Monday = 0 and 1 January = day 1.

use core::cmp::Ordering;
use core::fmt;

use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;

// ───────────────────────────────────────────────────────────────
// Free calendar functions
// ───────────────────────────────────────────────────────────────

/// Weekday index (Monday = 0 … Sunday = 6), or `None` for an invalid date.
pub fn day_of_week(year: i32, month: u8, day: u8) -> Option<u8> {
    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day))
        .map(|d| d.weekday().num_days_from_monday() as u8)
}

/// Ordinal day within the year (1 January = 1), or `None` for an invalid date.
pub fn day_of_year(year: i32, month: u8, day: u8) -> Option<u16> {
    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)).map(|d| d.ordinal() as u16)
}

// ───────────────────────────────────────────────────────────────
// Date
// ───────────────────────────────────────────────────────────────

/// A calendar date with its weekday and ordinal day.
///
/// Weekday and ordinal are normally derived; [`Date::with_ordinals`]
/// accepts them verbatim (e.g. when read back from storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    civil: NaiveDate,
    weekday: u8,
    yearday: u16,
}

impl Date {
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)).map(Self::from_naive)
    }

    /// Build a date with caller-supplied weekday/ordinal.  The civil part is
    /// still validated; the ordinals only have to be in range.
    pub fn with_ordinals(year: i32, month: u8, day: u8, weekday: u8, yearday: u16) -> Option<Self> {
        if weekday > 6 || !(1..=366).contains(&yearday) {
            return None;
        }
        let civil = NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day))?;
        Some(Self {
            civil,
            weekday,
            yearday,
        })
    }

    pub(crate) fn from_naive(civil: NaiveDate) -> Self {
        Self {
            civil,
            weekday: civil.weekday().num_days_from_monday() as u8,
            yearday: civil.ordinal() as u16,
        }
    }

    pub fn year(&self) -> i32 {
        self.civil.year()
    }

    pub fn month(&self) -> u8 {
        self.civil.month() as u8
    }

    pub fn day(&self) -> u8 {
        self.civil.day() as u8
    }

    /// Monday = 0 … Sunday = 6.
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    /// 1-based day of the year.
    pub fn yearday(&self) -> u16 {
        self.yearday
    }

    fn days_since_epoch(&self) -> i64 {
        i64::from(self.civil.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Time of day.  An absent field is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Time {
    hour: u8,
    minute: u8,
    second: u8,
}

impl Time {
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        (hour < 24 && minute < 60 && second < 60).then_some(Self {
            hour,
            minute,
            second,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    fn secs_of_day(&self) -> i64 {
        i64::from(self.hour) * SECS_PER_HOUR + i64::from(self.minute) * 60 + i64::from(self.second)
    }
}

// ───────────────────────────────────────────────────────────────
// DateTime
// ───────────────────────────────────────────────────────────────

/// Calendar date plus time of day.
///
/// Equality is field-wise (calendar identity).  Temporal ordering goes
/// through [`DateTime::unix_seconds`]; see [`DateTime::cmp_instant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    date: Date,
    time: Time,
}

/// Field overrides for [`DateTime::with_fields_replaced`].  `None` keeps
/// the original value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldOverrides {
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub weekday: Option<u8>,
    pub yearday: Option<u16>,
}

impl DateTime {
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        Some(Self {
            date: Date::new(year, month, day)?,
            time: Time::new(hour, minute, second)?,
        })
    }

    pub fn from_parts(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    /// Convert epoch seconds (UTC) back into calendar fields.
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        let naive = chrono::DateTime::from_timestamp(secs, 0)?.naive_utc();
        Some(Self::from_naive(naive))
    }

    pub(crate) fn from_naive(naive: chrono::NaiveDateTime) -> Self {
        Self {
            date: Date::from_naive(naive.date()),
            time: Time {
                hour: naive.hour() as u8,
                minute: naive.minute() as u8,
                second: naive.second() as u8,
            },
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn hour(&self) -> u8 {
        self.time.hour
    }

    pub fn minute(&self) -> u8 {
        self.time.minute
    }

    /// Seconds since 1970-01-01T00:00:00, treating the fields as UTC.
    pub fn unix_seconds(&self) -> i64 {
        self.date.days_since_epoch() * SECS_PER_DAY + self.time.secs_of_day()
    }

    /// Shift into the named zone: base offset, plus one hour when the zone
    /// observes DST and [`is_dst`] holds for this (pre-shift) date.
    /// Unknown zone names shift by zero.
    pub fn in_timezone(&self, tz: &str) -> Self {
        let offset = i64::from(effective_offset(tz, self));
        Self::from_unix_seconds(self.unix_seconds() + offset * SECS_PER_HOUR).unwrap_or(*self)
    }

    pub fn cmp_instant(&self, other: &Self) -> Ordering {
        self.unix_seconds().cmp(&other.unix_seconds())
    }

    pub fn precedes(&self, other: &Self) -> bool {
        self.cmp_instant(other).is_lt()
    }

    pub fn follows(&self, other: &Self) -> bool {
        self.cmp_instant(other).is_gt()
    }

    /// Copy with the given fields replaced.  Weekday and ordinal day are
    /// re-derived when the civil date changes, unless overridden too.
    /// Returns `None` if the result is not a valid date/time.
    pub fn with_fields_replaced(&self, o: FieldOverrides) -> Option<Self> {
        let year = o.year.unwrap_or(self.date.year());
        let month = o.month.unwrap_or(self.date.month());
        let day = o.day.unwrap_or(self.date.day());
        let civil_changed = o.year.is_some() || o.month.is_some() || o.day.is_some();

        let derived = Date::new(year, month, day)?;
        let (base_weekday, base_yearday) = if civil_changed {
            (derived.weekday, derived.yearday)
        } else {
            (self.date.weekday, self.date.yearday)
        };
        let date = Date::with_ordinals(
            year,
            month,
            day,
            o.weekday.unwrap_or(base_weekday),
            o.yearday.unwrap_or(base_yearday),
        )?;
        let time = Time::new(
            o.hour.unwrap_or(self.time.hour),
            o.minute.unwrap_or(self.time.minute),
            o.second.unwrap_or(self.time.second),
        )?;
        Some(Self { date, time })
    }

    /// Persisted form: only non-zero fields are present.
    pub fn to_sparse_map(&self) -> SparseDateTime {
        fn nz<T: PartialEq + Default>(v: T) -> Option<T> {
            (v != T::default()).then_some(v)
        }
        SparseDateTime {
            year: nz(self.date.year()),
            month: nz(self.date.month()),
            day: nz(self.date.day()),
            hour: nz(self.time.hour),
            minute: nz(self.time.minute),
            second: nz(self.time.second),
            dow: nz(self.date.weekday),
            doy: nz(self.date.yearday),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{:02}:{:02}:{:02}",
            self.date, self.time.hour, self.time.minute, self.time.second
        )
    }
}

/// Sparse, explicitly optional persisted shape of a [`DateTime`].
///
/// ```json
/// {"year": 2024, "month": 3, "day": 21, "hour": 6, "minute": 3, "dow": 3, "doy": 81}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SparseDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dow: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doy: Option<u16>,
}

impl SparseDateTime {
    /// Rebuild the value.  Year, month and day are required; absent time
    /// fields are zero; absent weekday/ordinal are derived.
    pub fn to_date_time(&self) -> Option<DateTime> {
        let (year, month, day) = (self.year?, self.month?, self.day?);
        let derived = Date::new(year, month, day)?;
        let date = Date::with_ordinals(
            year,
            month,
            day,
            self.dow.unwrap_or(derived.weekday),
            self.doy.unwrap_or(derived.yearday),
        )?;
        let time = Time::new(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )?;
        Some(DateTime::from_parts(date, time))
    }
}

// ───────────────────────────────────────────────────────────────
// Timezones + DST
// ───────────────────────────────────────────────────────────────

/// The fixed set of supported zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timezone {
    Pacific,
    Mountain,
    Arizona,
    Central,
    Eastern,
    Atlantic,
}

impl Timezone {
    pub const ALL: [Self; 6] = [
        Self::Pacific,
        Self::Mountain,
        Self::Arizona,
        Self::Central,
        Self::Eastern,
        Self::Atlantic,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tz| tz.code() == code)
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Pacific => "PST",
            Self::Mountain => "MST",
            Self::Arizona => "AMT",
            Self::Central => "CST",
            Self::Eastern => "EST",
            Self::Atlantic => "AST",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pacific => "Pacific time",
            Self::Mountain => "Mountain time",
            Self::Arizona => "Arizona time",
            Self::Central => "Central time",
            Self::Eastern => "Eastern time",
            Self::Atlantic => "Atlantic time",
        }
    }

    /// Standard-time offset from UTC in hours.
    pub const fn offset_hours(self) -> i8 {
        match self {
            Self::Pacific => -8,
            Self::Mountain | Self::Arizona => -7,
            Self::Central => -6,
            Self::Eastern => -5,
            Self::Atlantic => -4,
        }
    }

    /// Arizona stays on standard time all year.
    pub const fn observes_dst(self) -> bool {
        !matches!(self, Self::Arizona)
    }
}

/// Standard offset for a zone code; unknown codes are 0.
pub fn tz_to_offset(code: &str) -> i8 {
    Timezone::from_code(code).map_or(0, Timezone::offset_hours)
}

/// Offset in effect at `at`: the standard offset plus the DST hour when
/// the zone observes it and [`is_dst`] holds.
pub fn effective_offset(code: &str, at: &DateTime) -> i8 {
    match Timezone::from_code(code) {
        Some(tz) if tz.observes_dst() && is_dst(&at.date()) => tz.offset_hours() + 1,
        Some(tz) => tz.offset_hours(),
        None => 0,
    }
}

/// Approximate US daylight-saving rule.
///
/// Not zone-database accurate: around the March and November changeovers
/// the weekday test can be off by up to a week.  Kept as-is because the
/// door schedule only needs hour-level agreement with local clocks.
pub fn is_dst(date: &Date) -> bool {
    let month = date.month();
    let slack = i16::from(date.day()) - i16::from(date.weekday());
    match month {
        m if !(3..=11).contains(&m) => false,
        3 => slack >= 8,
        11 => slack <= 0,
        _ => true,
    }
}
