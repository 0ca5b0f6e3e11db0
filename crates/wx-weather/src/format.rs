//! Display formatting for readings, dates and hours.

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::TemperatureUnit;

const KMH_TO_MPH: f64 = 0.621371;

/// Round to the nearest integer with halves going up (`-2.5` becomes `-2`).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Celsius reading shown as a whole number in `unit`.
pub fn fmt_temp(celsius: f64, unit: TemperatureUnit) -> i64 {
    round_half_up(unit.convert(celsius))
}

/// km/h reading shown in the wind unit paired with `unit`.
pub fn fmt_wind(kmh: f64, unit: TemperatureUnit) -> i64 {
    match unit {
        TemperatureUnit::Celsius => round_half_up(kmh),
        TemperatureUnit::Fahrenheit => round_half_up(kmh * KMH_TO_MPH),
    }
}

/// Short weekday name, e.g. "Mon".
pub fn fmt_weekday(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Zero-padded local hour, e.g. "07".
pub fn fmt_hour(time: NaiveDateTime) -> String {
    time.format("%H").to_string()
}
