//! Weather lookup for wx
//!
//! Resolves places via Open-Meteo geocoding, fetches current and forecast
//! weather, and renders the card text plus the hourly temperature chart.

pub mod cache;
pub mod chart;
pub mod format;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;
pub mod widget;

pub use cache::WeatherCache;
pub use chart::{render_chart, BackendSurface, ChartFrame, RecordingSurface, Rgb, Surface};
pub use geocode::GeocodingClient;
pub use location::{ConfiguredLocation, LocationSource};
pub use provider::WeatherProvider;
pub use types::*;
pub use widget::{Status, WeatherView, WeatherWidget};
