//! Open-Meteo forecast client.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use wx_core::{NetworkError, ReqwestErrorExt};

use crate::types::{
    Coordinates, DailyForecast, Forecast, HourlyPoint, HourlySeries, WeatherCode, WeatherError,
    WeatherSnapshot,
};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,wind_speed_10m,weather_code,is_day";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";
const HOURLY_FIELDS: &str = "temperature_2m";

/// `timezone=auto` timestamps come back as local time without seconds.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    weather_code: i32,
    is_day: u8,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|e| {
            WeatherError::from(NetworkError::InvalidResponse(format!(
                "bad timestamp {:?}: {}",
                raw, e
            )))
        })
}

fn parse_date(raw: &str) -> Result<NaiveDate, WeatherError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| {
            WeatherError::from(NetworkError::InvalidResponse(format!(
                "bad date {:?}: {}",
                raw, e
            )))
        })
}

impl ForecastResponse {
    fn into_forecast(self) -> Result<Forecast, WeatherError> {
        let c = self.current;
        let current = WeatherSnapshot {
            temperature: c.temperature_2m,
            apparent_temperature: c.apparent_temperature,
            wind_speed: c.wind_speed_10m,
            humidity: c.relative_humidity_2m,
            weather_code: WeatherCode(c.weather_code),
            is_day: c.is_day != 0,
            time: parse_time(&c.time)?,
        };

        // Days with any missing value are skipped, like null hourly samples.
        let d = self.daily;
        let daily = d
            .time
            .iter()
            .zip(&d.weather_code)
            .zip(&d.temperature_2m_min)
            .zip(&d.temperature_2m_max)
            .filter_map(|(((date, code), min), max)| Some((date, (*code)?, (*min)?, (*max)?)))
            .map(|(date, code, min_temp, max_temp)| {
                Ok(DailyForecast {
                    date: parse_date(date)?,
                    weather_code: WeatherCode(code),
                    min_temp,
                    max_temp,
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        let points = self
            .hourly
            .time
            .iter()
            .zip(&self.hourly.temperature_2m)
            .filter_map(|(time, temp)| temp.map(|t| (time, t)))
            .map(|(time, temperature)| {
                Ok(HourlyPoint {
                    time: parse_time(time)?,
                    temperature,
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(Forecast {
            current,
            daily,
            hourly: HourlySeries { points },
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
}

impl WeatherProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions, the daily forecast and hourly temperatures.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, at: Coordinates) -> Result<Forecast, WeatherError> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current={}&daily={}&hourly={}&timezone=auto",
            self.base_url, at.latitude, at.longitude, CURRENT_FIELDS, DAILY_FIELDS, HOURLY_FIELDS,
        );

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse(format!("forecast response: {}", e)))?;

        let forecast = body.into_forecast()?;
        tracing::info!(
            "Fetched forecast: {} days, {} hourly samples",
            forecast.daily.len(),
            forecast.hourly.len()
        );
        Ok(forecast)
    }
}
