//! Forward and reverse geocoding against the Open-Meteo geocoding API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use wx_core::{NetworkError, ReqwestErrorExt};

use crate::types::{Place, WeatherError};

const USER_AGENT: &str = concat!("wx/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country_code: Option<String>,
}

impl GeocodingResult {
    fn into_place(self) -> Place {
        let name = match self.country_code {
            Some(cc) => format!("{}, {}", self.name, cc),
            None => self.name,
        };
        Place {
            name,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    language: String,
}

impl GeocodingClient {
    pub fn new(base_url: &str, timeout: Duration, language: &str) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        })
    }

    /// Resolve a place name to its best match, named "{name}, {country_code}".
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> Result<Place, WeatherError> {
        let url = format!(
            "{}/search?name={}&count=1&language={}&format=json",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.language),
        );

        let body = self.get(&url).await?;
        let place = body
            .results
            .into_iter()
            .next()
            .map(GeocodingResult::into_place)
            .ok_or_else(|| WeatherError::PlaceNotFound(query.to_string()))?;

        tracing::info!("Geocoded {:?} to {}", query, place.name);
        Ok(place)
    }

    /// Name the place at the given coordinates.
    /// Returns `None` on any failure; the caller falls back to a generic name.
    #[instrument(skip(self), level = "info")]
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Option<Place> {
        let url = format!(
            "{}/reverse?latitude={}&longitude={}&count=1&language={}&format=json",
            self.base_url,
            latitude,
            longitude,
            urlencoding::encode(&self.language),
        );

        let body = match self.get(&url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode failed: {}", e);
                return None;
            }
        };

        let place = body.results.into_iter().next()?.into_place();
        tracing::info!("Reverse geocoded to: {}", place.name);
        Some(place)
    }

    async fn get(&self, url: &str) -> Result<GeocodingResponse, WeatherError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
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

        let body = response.json().await.map_err(|e| {
            NetworkError::InvalidResponse(format!("geocoding response: {}", e))
        })?;
        Ok(body)
    }
}
