//! Sunrise / sunset calculator.
//!
//! Classic almanac approximation (civil zenith 90.83333°), good to a few
//! minutes away from the poles.  Both passes share the same steps and
//! differ only in the anchor hour (06:00 for rise, 18:00 for set) and the
//! branch of the hour angle.
//!
//! Inputs are clamped, never rejected: latitude to [-90, 90], longitude to
//! [-180, 180], timezone offset to [-12, 14].  Where the sun stays above
//! or below the horizon all day the computation returns a [`SolarError`]
//! instead of a made-up time.

use core::fmt;

use crate::app::ports::ClockPort;
use crate::calendar::{DateTime, FieldOverrides};

/// Sun below horizon at civil sunrise/sunset (refraction + solar radius).
pub const CIVIL_ZENITH_DEG: f64 = 90.83333;

const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;
const MIN_TZ_OFFSET: f64 = -12.0;
const MAX_TZ_OFFSET: f64 = 14.0;

/// Sunrise and sunset for one date, in the requested local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunSchedule {
    pub sunrise: DateTime,
    pub sunset: DateTime,
}

impl SunSchedule {
    /// Date the schedule belongs to (cache key).
    pub fn date(&self) -> crate::calendar::Date {
        self.sunrise.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarError {
    /// Sun never rises on this date at this latitude.
    PolarNight,
    /// Sun never sets on this date at this latitude.
    PolarDay,
    /// A coordinate or offset was NaN.
    InvalidInput,
}

impl fmt::Display for SolarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolarNight => write!(f, "polar night: sun does not rise"),
            Self::PolarDay => write!(f, "polar day: sun does not set"),
            Self::InvalidInput => write!(f, "invalid coordinates"),
        }
    }
}

#[derive(Clone, Copy)]
enum Event {
    Rise,
    Set,
}

impl Event {
    const fn anchor_hour(self) -> f64 {
        match self {
            Self::Rise => 6.0,
            Self::Set => 18.0,
        }
    }
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Local time of the event as fractional hours in `[0, 24)`.
fn event_hours(
    event: Event,
    day_of_year: f64,
    latitude: f64,
    longitude_hour: f64,
    tz_offset: f64,
) -> Result<f64, SolarError> {
    let approx = day_of_year + (event.anchor_hour() - longitude_hour) / 24.0;

    let mean_anomaly = 0.9856 * approx - 3.289;

    let true_long = (mean_anomaly
        + 1.916 * sin_deg(mean_anomaly)
        + 0.020 * sin_deg(2.0 * mean_anomaly)
        + 282.634)
        .rem_euclid(360.0);

    let mut right_ascension = (0.91764 * true_long.to_radians().tan())
        .atan()
        .to_degrees()
        .rem_euclid(360.0);
    // Same 90° quadrant as the true longitude.
    let long_quadrant = (true_long / 90.0).floor() * 90.0;
    let ra_quadrant = (right_ascension / 90.0).floor() * 90.0;
    right_ascension += long_quadrant - ra_quadrant;
    let right_ascension = right_ascension / 15.0;

    let sin_dec = 0.39782 * sin_deg(true_long);
    let cos_dec = sin_dec.asin().cos();

    let cos_h = (cos_deg(CIVIL_ZENITH_DEG) - sin_dec * sin_deg(latitude))
        / (cos_dec * cos_deg(latitude));
    if cos_h.is_nan() {
        return Err(SolarError::InvalidInput);
    }
    if cos_h > 1.0 {
        return Err(SolarError::PolarNight);
    }
    if cos_h < -1.0 {
        return Err(SolarError::PolarDay);
    }

    let hour_angle = match event {
        Event::Rise => (360.0 - cos_h.acos().to_degrees()) / 15.0,
        Event::Set => cos_h.acos().to_degrees() / 15.0,
    };

    let mean_time = hour_angle + right_ascension - 0.06571 * approx - 6.622;
    let utc = (mean_time - longitude_hour).rem_euclid(24.0);
    let local = (utc + tz_offset).rem_euclid(24.0);
    // rem_euclid can round up to exactly 24.0 for tiny negatives.
    Ok(if local >= 24.0 { 0.0 } else { local })
}

/// Fractional hours → (hour, minute), truncating.
fn split_hours(local: f64) -> (u8, u8) {
    let hour = local.floor();
    let minute = ((local - hour) * 60.0).floor();
    (hour.clamp(0.0, 23.0) as u8, minute.clamp(0.0, 59.0) as u8)
}

/// Compute sunrise and sunset for `date` at the given place.
///
/// The result carries `date` with only hour and minute replaced.
pub fn sun_times(
    date: &DateTime,
    latitude: f64,
    longitude: f64,
    tz_offset: f64,
) -> Result<SunSchedule, SolarError> {
    if latitude.is_nan() || longitude.is_nan() || tz_offset.is_nan() {
        return Err(SolarError::InvalidInput);
    }
    let latitude = latitude.clamp(MIN_LATITUDE, MAX_LATITUDE);
    let longitude = longitude.clamp(MIN_LONGITUDE, MAX_LONGITUDE);
    let tz_offset = tz_offset.clamp(MIN_TZ_OFFSET, MAX_TZ_OFFSET);

    let doy = f64::from(date.date().yearday());
    let longitude_hour = longitude / 15.0;

    let rise = event_hours(Event::Rise, doy, latitude, longitude_hour, tz_offset)?;
    let set = event_hours(Event::Set, doy, latitude, longitude_hour, tz_offset)?;

    let at = |(hour, minute): (u8, u8)| {
        date.with_fields_replaced(FieldOverrides {
            hour: Some(hour),
            minute: Some(minute),
            ..FieldOverrides::default()
        })
        .ok_or(SolarError::InvalidInput)
    };

    Ok(SunSchedule {
        sunrise: at(split_hours(rise))?,
        sunset: at(split_hours(set))?,
    })
}

/// [`sun_times`] with the date defaulting to the clock's "now".
pub fn sun_times_or_now<C: ClockPort>(
    date: Option<DateTime>,
    clock: &C,
    latitude: f64,
    longitude: f64,
    tz_offset: f64,
) -> Result<SunSchedule, SolarError> {
    let date = date.unwrap_or_else(|| clock.now());
    sun_times(&date, latitude, longitude, tz_offset)
}
