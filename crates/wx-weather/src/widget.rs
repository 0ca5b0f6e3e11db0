//! The weather card: event handlers, status line and rendered view.
//!
//! Every public async method is one user event (search submit, location
//! request). Events run one at a time; a fetch replaces the cached forecast
//! wholesale and re-renders.

use std::fmt;

use wx_core::PreferenceStore;

use crate::cache::WeatherCache;
use crate::chart::{render_chart, ChartFrame, Surface};
use crate::format::{fmt_temp, fmt_weekday, fmt_wind, round_half_up};
use crate::geocode::GeocodingClient;
use crate::location::LocationSource;
use crate::provider::WeatherProvider;
use crate::types::{
    Coordinates, Forecast, HourlyPoint, LocationError, TemperatureUnit, WeatherError,
};

pub const MSG_TYPE_CITY: &str = "Type a city name.";
pub const MSG_SEARCHING: &str = "Searching…";
pub const MSG_CITY_NOT_FOUND: &str = "City not found.";
pub const MSG_LOCATING: &str = "Getting your location…";
pub const MSG_GEO_UNSUPPORTED: &str = "Geolocation not supported.";
pub const MSG_PERMISSION_DENIED: &str = "Permission denied. Search a city instead.";
pub const MSG_WEATHER_UNAVAILABLE: &str = "Weather unavailable.";

/// Name used when reverse geocoding gives nothing.
pub const FALLBACK_PLACE_NAME: &str = "My location";

const DAILY_DAYS: usize = 3;
const CHART_HOURS: usize = 24;

/// Status line under the search box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    /// Rendered as an error
    pub bad: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub weekday: String,
    pub icon: &'static str,
    pub description: &'static str,
    pub min: i64,
    pub max: i64,
}

/// The card as shown to the user, in the current unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub place: String,
    pub description: &'static str,
    pub icon: &'static str,
    pub unit: TemperatureUnit,
    pub temperature: i64,
    pub feels_like: i64,
    pub wind: i64,
    pub wind_unit: &'static str,
    pub humidity: i64,
    pub daily: Vec<DayRow>,
    /// Next 24 hours in °C, for the chart
    pub hourly: Vec<HourlyPoint>,
}

impl WeatherView {
    fn build(forecast: &Forecast, place: &str, unit: TemperatureUnit) -> Self {
        let c = &forecast.current;

        let daily = forecast
            .daily
            .iter()
            .take(DAILY_DAYS)
            .map(|d| DayRow {
                weekday: fmt_weekday(d.date),
                icon: d.weather_code.icon(true),
                description: d.weather_code.description(),
                min: fmt_temp(d.min_temp, unit),
                max: fmt_temp(d.max_temp, unit),
            })
            .collect();

        Self {
            place: place.to_string(),
            description: c.weather_code.description(),
            icon: c.weather_code.icon(c.is_day),
            unit,
            temperature: fmt_temp(c.temperature, unit),
            feels_like: fmt_temp(c.apparent_temperature, unit),
            wind: fmt_wind(c.wind_speed, unit),
            wind_unit: unit.wind_unit(),
            humidity: round_half_up(c.humidity),
            daily,
            hourly: forecast.hourly.window_from(c.time, CHART_HOURS).to_vec(),
        }
    }
}

impl fmt::Display for WeatherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.place)?;
        writeln!(f, "{}  {}", self.icon, self.description)?;
        writeln!(
            f,
            "{}{} (feels like {}{})",
            self.temperature, self.unit, self.feels_like, self.unit
        )?;
        writeln!(
            f,
            "Wind {} {}  Humidity {}%",
            self.wind, self.wind_unit, self.humidity
        )?;
        for day in &self.daily {
            write!(
                f,
                "\n{:<4} {}  {:<22} {}° / {}°",
                day.weekday, day.icon, day.description, day.min, day.max
            )?;
        }
        Ok(())
    }
}

pub struct WeatherWidget<L: LocationSource> {
    geocoder: GeocodingClient,
    provider: WeatherProvider,
    location: L,
    prefs: PreferenceStore,
    unit: TemperatureUnit,
    cache: WeatherCache,
    view: Option<WeatherView>,
    status: Status,
}

impl<L: LocationSource> WeatherWidget<L> {
    /// Build the widget, restoring the saved unit (Celsius when unset).
    pub fn new(
        geocoder: GeocodingClient,
        provider: WeatherProvider,
        location: L,
        prefs: PreferenceStore,
    ) -> Self {
        let unit = prefs
            .get(TemperatureUnit::PREFERENCE_KEY)
            .and_then(|v| TemperatureUnit::from_key(&v))
            .unwrap_or_default();
        tracing::debug!("Restored unit preference: {}", unit);

        Self {
            geocoder,
            provider,
            location,
            prefs,
            unit,
            cache: WeatherCache::new(),
            view: None,
            status: Status::default(),
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn view(&self) -> Option<&WeatherView> {
        self.view.as_ref()
    }

    /// Label of the unit toggle, e.g. "Unit: °C".
    pub fn unit_label(&self) -> String {
        format!("Unit: {}", self.unit)
    }

    fn tip(&mut self, message: &str, bad: bool) {
        self.status = Status {
            message: message.to_string(),
            bad,
        };
    }

    /// Search for a city and show its weather.
    pub async fn search(&mut self, query: &str) {
        let name = query.trim();
        if name.is_empty() {
            return self.tip(MSG_TYPE_CITY, false);
        }

        self.tip(MSG_SEARCHING, false);
        if let Err(e) = self.search_and_load(name).await {
            tracing::warn!("Search for {:?} failed: {}", name, e);
            self.tip(MSG_CITY_NOT_FOUND, true);
        }
    }

    /// Show the weather at the device location.
    pub async fn locate(&mut self) {
        self.tip(MSG_LOCATING, false);

        let coords = match self.location.current_location().await {
            Ok(c) => c,
            Err(LocationError::Unsupported) => return self.tip(MSG_GEO_UNSUPPORTED, true),
            Err(e) => {
                tracing::debug!("Location request failed: {}", e);
                return self.tip(MSG_PERMISSION_DENIED, true);
            }
        };

        let name = self.place_name_at(coords).await;
        if let Err(e) = self.load_weather(coords, &name).await {
            tracing::warn!("Weather for device location failed: {}", e);
            self.tip(MSG_WEATHER_UNAVAILABLE, true);
        }
    }

    /// Like [`locate`](Self::locate), but never touches the status line on failure.
    pub async fn auto_locate(&mut self) {
        let coords = match self.location.current_location().await {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Auto-location skipped: {}", e);
                return;
            }
        };

        let name = self.place_name_at(coords).await;
        if let Err(e) = self.load_weather(coords, &name).await {
            tracing::debug!("Auto-location fetch failed: {}", e);
        }
    }

    /// Flip °C/°F, persist it and re-render from the cached forecast.
    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.set_unit(self.unit.toggled());
        self.unit
    }

    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
        if let Err(e) = self
            .prefs
            .set(TemperatureUnit::PREFERENCE_KEY, unit.as_key())
        {
            tracing::warn!("Failed to save unit preference: {}", e);
        }
        self.render_all();
    }

    /// Draw the hourly chart for the current view, if there is one.
    pub fn draw_chart<S: Surface + ?Sized>(&self, surface: &mut S) -> Option<ChartFrame> {
        let view = self.view.as_ref()?;
        if view.hourly.is_empty() {
            return None;
        }
        Some(render_chart(surface, &view.hourly, self.unit))
    }

    async fn search_and_load(&mut self, name: &str) -> Result<(), WeatherError> {
        let place = self.geocoder.search(name).await?;
        self.load_weather(place.coordinates(), &place.name).await
    }

    async fn place_name_at(&self, coords: Coordinates) -> String {
        self.geocoder
            .reverse(coords.latitude, coords.longitude)
            .await
            .map(|p| p.name)
            .unwrap_or_else(|| FALLBACK_PLACE_NAME.to_string())
    }

    async fn load_weather(
        &mut self,
        coords: Coordinates,
        place_name: &str,
    ) -> Result<(), WeatherError> {
        let forecast = self.provider.fetch(coords).await?;
        self.cache.update(forecast, place_name);
        self.render_all();
        self.tip("", false);
        Ok(())
    }

    fn render_all(&mut self) {
        self.view = self
            .cache
            .get()
            .map(|(forecast, place)| WeatherView::build(forecast, place, self.unit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::RecordingSurface;
    use crate::location::ConfiguredLocation;
    use crate::provider::tests::forecast_body;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn widget(
        server: &MockServer,
        location: ConfiguredLocation,
        dir: &TempDir,
    ) -> WeatherWidget<ConfiguredLocation> {
        let timeout = Duration::from_secs(5);
        WeatherWidget::new(
            GeocodingClient::new(&server.uri(), timeout, "en").unwrap(),
            WeatherProvider::new(&server.uri(), timeout).unwrap(),
            location,
            PreferenceStore::new(dir.path().join("preferences.json")),
        )
    }

    async fn mount_search(server: &MockServer, results: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": results })),
            )
            .mount(server)
            .await;
    }

    fn novi_sad() -> serde_json::Value {
        serde_json::json!([
            {"name": "Novi Sad", "latitude": 45.25, "longitude": 19.84, "country_code": "RS"}
        ])
    }

    #[tokio::test]
    async fn test_search_renders_card() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_search(&server, novi_sad()).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        w.search("  Novi Sad ").await;

        assert_eq!(w.status(), &Status::default());
        let view = w.view().unwrap();
        assert_eq!(view.place, "Novi Sad, RS");
        assert_eq!(view.description, "Overcast");
        assert_eq!(view.temperature, 7);
        assert_eq!(view.feels_like, 5);
        assert_eq!(view.wind, 13);
        assert_eq!(view.wind_unit, "km/h");
        assert_eq!(view.humidity, 81);

        assert_eq!(view.daily.len(), 3);
        assert_eq!(view.daily[0].weekday, "Fri");
        assert_eq!((view.daily[1].min, view.daily[1].max), (6, 11));
        assert_eq!(view.daily[1].description, "Rain light");

        // current time is 05:15, so the chart starts at 06:00
        assert_eq!(view.hourly.len(), 24);
        assert_eq!(view.hourly[0].temperature, 8.0);

        let rendered = view.to_string();
        assert!(rendered.starts_with("Novi Sad, RS\n"));
        assert!(rendered.contains("7°C (feels like 5°C)"));
    }

    #[tokio::test]
    async fn test_empty_results_report_city_not_found() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_search(&server, serde_json::json!([])).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(0)
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        w.search("Atlantis").await;

        assert_eq!(w.status().message, MSG_CITY_NOT_FOUND);
        assert!(w.status().bad);
        assert!(w.view().is_none());
    }

    #[tokio::test]
    async fn test_forecast_failure_also_reports_city_not_found() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_search(&server, novi_sad()).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        w.search("Novi Sad").await;

        assert_eq!(w.status().message, MSG_CITY_NOT_FOUND);
        assert!(w.view().is_none());
    }

    #[tokio::test]
    async fn test_blank_query_asks_for_city() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        w.search("   ").await;

        assert_eq!(w.status().message, MSG_TYPE_CITY);
        assert!(!w.status().bad);
    }

    #[tokio::test]
    async fn test_unit_toggle_rerenders_without_fetching() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_search(&server, novi_sad()).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        w.search("Novi Sad").await;
        let celsius = w.view().cloned().unwrap();

        assert_eq!(w.toggle_unit(), TemperatureUnit::Fahrenheit);
        let fahrenheit = w.view().cloned().unwrap();
        assert_eq!(fahrenheit.temperature, 45);
        assert_eq!(fahrenheit.wind, 8);
        assert_eq!(fahrenheit.wind_unit, "mph");
        assert_eq!(fahrenheit.hourly, celsius.hourly);
        assert_eq!(w.unit_label(), "Unit: °F");

        assert_eq!(w.toggle_unit(), TemperatureUnit::Celsius);
        assert_eq!(w.view(), Some(&celsius));
        // `expect(1)` on the forecast mock is verified when the server drops
    }

    #[tokio::test]
    async fn test_unit_preference_persists() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        assert_eq!(w.unit(), TemperatureUnit::Celsius);
        w.toggle_unit();
        assert!(w.view().is_none());

        let restored = widget(&server, ConfiguredLocation::default(), &dir);
        assert_eq!(restored.unit(), TemperatureUnit::Fahrenheit);
        assert_eq!(
            PreferenceStore::new(dir.path().join("preferences.json"))
                .get("wx.unit")
                .as_deref(),
            Some("F")
        );
    }

    #[tokio::test]
    async fn test_locate_uses_reverse_name() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Belgrade", "latitude": 44.8, "longitude": 20.46, "country_code": "RS"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::new(true, Some((44.8, 20.46))), &dir);
        w.locate().await;

        assert_eq!(w.status(), &Status::default());
        assert_eq!(w.view().unwrap().place, "Belgrade, RS");
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_generic_name() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::new(true, Some((44.8, 20.46))), &dir);
        w.locate().await;

        assert_eq!(w.view().unwrap().place, FALLBACK_PLACE_NAME);
    }

    #[tokio::test]
    async fn test_locate_errors() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let mut unsupported = widget(&server, ConfiguredLocation::new(true, None), &dir);
        unsupported.locate().await;
        assert_eq!(unsupported.status().message, MSG_GEO_UNSUPPORTED);
        assert!(unsupported.status().bad);

        let mut denied = widget(&server, ConfiguredLocation::new(false, Some((1.0, 2.0))), &dir);
        denied.locate().await;
        assert_eq!(denied.status().message, MSG_PERMISSION_DENIED);
        assert!(denied.status().bad);
    }

    #[tokio::test]
    async fn test_locate_forecast_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::new(true, Some((1.0, 2.0))), &dir);
        w.locate().await;

        assert_eq!(w.status().message, MSG_WEATHER_UNAVAILABLE);
        assert!(w.view().is_none());
    }

    #[tokio::test]
    async fn test_auto_locate_failures_are_silent() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut no_location = widget(&server, ConfiguredLocation::new(true, None), &dir);
        no_location.auto_locate().await;
        assert_eq!(no_location.status(), &Status::default());

        let mut failing = widget(&server, ConfiguredLocation::new(true, Some((1.0, 2.0))), &dir);
        failing.auto_locate().await;
        assert_eq!(failing.status(), &Status::default());
        assert!(failing.view().is_none());
    }

    #[tokio::test]
    async fn test_draw_chart_after_search() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_search(&server, novi_sad()).await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;

        let mut w = widget(&server, ConfiguredLocation::default(), &dir);
        let mut surface = RecordingSurface::new(600, 220);
        assert!(w.draw_chart(&mut surface).is_none());

        w.search("Novi Sad").await;
        let frame = w.draw_chart(&mut surface).unwrap();

        assert_eq!(frame.points.len(), 24);
        assert_eq!(surface.hour_labels().len(), 8);
        assert_eq!(surface.hour_labels()[0], "06");
    }
}
