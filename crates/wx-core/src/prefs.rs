//! Small key-value preference store backed by a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, ConfigError};

/// File-backed string slots, e.g. `wx.unit = "F"`.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a slot. A missing or unreadable file reads as empty.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                tracing::warn!("Ignoring unreadable preferences at {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Write a slot, keeping every other key in the file.
    pub fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut map = self.read_all().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&map)
            .map_err(|e| ConfigError::Preferences(e.to_string()))?;
        fs::write(&self.path, json)?;

        tracing::debug!("Stored preference {} = {}", key, value);
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigError::Preferences(e.to_string()).into())
    }
}
