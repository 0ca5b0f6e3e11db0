//! Last fetched forecast, kept so unit changes re-render without a fetch.

use crate::types::Forecast;

#[derive(Debug, Default)]
pub struct WeatherCache {
    data: Option<Forecast>,
    place_name: String,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached pair wholesale.
    pub fn update(&mut self, data: Forecast, place_name: impl Into<String>) {
        self.data = Some(data);
        self.place_name = place_name.into();
    }

    pub fn get(&self) -> Option<(&Forecast, &str)> {
        self.data.as_ref().map(|d| (d, self.place_name.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }
}
