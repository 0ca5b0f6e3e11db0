use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and preferences.json
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Open-Meteo endpoints and request settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Chart surface size
    #[serde(default)]
    pub chart: ChartConfig,

    /// Device location stand-in
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the geocoding API (search and reverse lookups)
    pub geocoding_url: String,

    /// Base URL of the forecast API
    pub forecast_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Language for place names
    pub language: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            forecast_url: "https://api.open-meteo.com/v1".to_string(),
            timeout_secs: 10,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl ChartConfig {
    /// Chart margins: left 36 + right 12, top 10 + bottom 28.
    pub const MARGIN_WIDTH: u32 = 48;
    pub const MARGIN_HEIGHT: u32 = 38;
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 220,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// When false, location requests are refused as if permission was denied
    #[serde(default = "default_location_enabled")]
    pub enabled: bool,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,
}

fn default_location_enabled() -> bool {
    true
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: default_location_enabled(),
            latitude: None,
            longitude: None,
        }
    }
}

impl LocationConfig {
    /// Configured coordinates, if both halves are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wx")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            api: ApiConfig::default(),
            chart: ChartConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&default_config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !path.exists() {
            let config = Self {
                config_dir,
                ..Self::default()
            };
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.config_dir = config_dir;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult), AppError> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.api.geocoding_url, "api.geocoding_url", &mut result);
        validate_url(&self.api.forecast_url, "api.forecast_url", &mut result);

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        } else if self.api.timeout_secs > 120 {
            result.add_warning("api.timeout_secs", "Timeout is unusually long (>120s)");
        }

        if self.api.language.trim().is_empty() {
            result.add_error("api.language", "Language must not be empty");
        }

        if self.chart.width <= ChartConfig::MARGIN_WIDTH {
            result.add_error(
                "chart.width",
                format!("Chart width must be greater than {}", ChartConfig::MARGIN_WIDTH),
            );
        } else if self.chart.width > 10000 {
            result.add_warning("chart.width", "Chart width is unusually large (>10000)");
        }

        if self.chart.height <= ChartConfig::MARGIN_HEIGHT {
            result.add_error(
                "chart.height",
                format!("Chart height must be greater than {}", ChartConfig::MARGIN_HEIGHT),
            );
        } else if self.chart.height > 10000 {
            result.add_warning("chart.height", "Chart height is unusually large (>10000)");
        }

        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                result.add_error("location.latitude", "Latitude must be within -90..=90");
            }
        }
        if let Some(lon) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                result.add_error("location.longitude", "Longitude must be within -180..=180");
            }
        }
        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            result.add_warning(
                "location",
                "Only one of latitude/longitude is set; location will be unavailable",
            );
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Path of the unit preference file
    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir.join("preferences.json")
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.api.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.forecast_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.api.geocoding_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_chart_dimensions() {
        let mut config = Config::default();
        config.chart.height = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "chart.height"));
    }

    #[test]
    fn test_chart_must_leave_room_inside_margins() {
        let mut config = Config::default();
        config.chart.width = 10;
        config.chart.height = 20;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "chart.width"));
        assert!(result.errors.iter().any(|e| e.field == "chart.height"));

        config.chart.width = ChartConfig::MARGIN_WIDTH;
        config.chart.height = ChartConfig::MARGIN_HEIGHT + 1;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "chart.width"));
        assert!(!result.errors.iter().any(|e| e.field == "chart.height"));
    }

    #[test]
    fn test_out_of_range_latitude() {
        let mut config = Config::default();
        config.location.latitude = Some(123.0);
        config.location.longitude = Some(10.0);
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));
    }

    #[test]
    fn test_half_configured_location_is_warning() {
        let mut config = Config::default();
        config.location.latitude = Some(45.0);
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "location"));
        assert_eq!(config.location.coordinates(), None);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wx").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path().join("wx"));
        assert_eq!(config.chart.width, 600);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[location]\nlatitude = 44.8\nlongitude = 20.46\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.location.coordinates(), Some((44.8, 20.46)));
        assert!(config.location.enabled);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chart]\nwidth = 0\nheight = 100\n").unwrap();

        let err = Config::load_validated(Some(&path)).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid(_))));
        assert!(err.to_string().contains("chart.width"));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chart\nwidth = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
