use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use wx_core::NetworkError;

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Preference slot holding the unit.
    pub const PREFERENCE_KEY: &'static str = "wx.unit";

    /// Value stored in the preference slot.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "C" | "c" => Some(Self::Celsius),
            "F" | "f" => Some(Self::Fahrenheit),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Wind speed unit paired with the temperature unit
    pub fn wind_unit(self) -> &'static str {
        match self {
            Self::Celsius => "km/h",
            Self::Fahrenheit => "mph",
        }
    }

    /// Convert a Celsius reading into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "°{}", self.as_key())
    }
}

/// WMO weather interpretation code as reported by Open-Meteo
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherCode(pub i32);

impl WeatherCode {
    /// Human-readable description, `"—"` for codes outside the table.
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Fog",
            48 => "Rime fog",
            51 => "Drizzle light",
            53 => "Drizzle",
            55 => "Drizzle heavy",
            61 => "Rain light",
            63 => "Rain",
            65 => "Rain heavy",
            66 => "Freezing rain light",
            67 => "Freezing rain",
            71 => "Snow light",
            73 => "Snow",
            75 => "Snow heavy",
            77 => "Snow grains",
            80 => "Rain showers light",
            81 => "Rain showers",
            82 => "Rain showers heavy",
            85 => "Snow showers light",
            86 => "Snow showers heavy",
            95 => "Thunderstorm",
            96 => "Thunder w/ hail",
            99 => "Thunder w/ heavy hail",
            _ => "—",
        }
    }

    /// Emoji icon; clear sky distinguishes day and night.
    pub fn icon(self, is_day: bool) -> &'static str {
        match self.0 {
            0 if is_day => "☀️",
            0 => "🌙",
            1 => "🌤️",
            2 => "⛅️",
            3 => "☁️",
            45 | 48 => "🌫️",
            51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82 => "🌧️",
            66 | 67 => "🌧️❄️",
            71 | 73 | 75 | 77 | 85 | 86 => "🌨️",
            95 | 96 | 99 => "⛈️",
            _ => "•",
        }
    }
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// °C
    pub temperature: f64,
    /// °C
    pub apparent_temperature: f64,
    /// km/h
    pub wind_speed: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    pub weather_code: WeatherCode,
    pub is_day: bool,
    /// Local time of the observation
    pub time: NaiveDateTime,
}

/// One day of the daily forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub weather_code: WeatherCode,
    pub min_temp: f64,
    pub max_temp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    /// °C
    pub temperature: f64,
}

/// Hourly temperatures in time order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub points: Vec<HourlyPoint>,
}

impl HourlySeries {
    /// Up to `len` samples starting at the first one at or after `from`.
    ///
    /// Falls back to the start of the series when every sample is older.
    pub fn window_from(&self, from: NaiveDateTime, len: usize) -> &[HourlyPoint] {
        let start = self
            .points
            .iter()
            .position(|p| p.time >= from)
            .unwrap_or(0);
        let end = (start + len).min(self.points.len());
        &self.points[start..end]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything one forecast request returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub current: WeatherSnapshot,
    pub daily: Vec<DailyForecast>,
    pub hourly: HourlySeries,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unsupported,
}

/// Weather lookup errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("No place matches {0:?}")]
    PlaceNotFound(String),
}
