use crate::error::AppError;
use firebase_auth::FirebaseConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `firebase.api_key`
pub const API_KEY_ENV: &str = "FIREBASE_API_KEY";

/// App configuration, read from `config.toml` in the app data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub firebase: FirebaseConfig,
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Readiness budget before a recording starts
    pub ready_timeout_ms: u64,
    /// How long leaving the camera screen waits for a recording to be saved
    pub shutdown_grace_ms: u64,
    /// JPEG quality in `[0, 1]`
    pub photo_quality: f32,
    pub max_recording_secs: Option<u64>,
    pub mute_recording: bool,
    /// Preview warm-up of the desktop virtual camera
    pub virtual_warmup_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 900,
            shutdown_grace_ms: 3000,
            photo_quality: 1.0,
            max_recording_secs: None,
            mute_recording: false,
            virtual_warmup_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Key holding the captured media list
    pub media_key: String,
    /// Key holding the signed-in user
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_key: media_gallery::DEFAULT_MEDIA_KEY.to_string(),
            session_key: "authSession".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(s)?)
    }

    /// Read the config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Load the app config. Errors are logged and the defaults are used.
    pub fn load() -> Self {
        let path = crate::filesystem::config_path();
        let config = Self::load_from(&path).unwrap_or_else(|e| {
            log::error!("Failed to read {:?}: {}", path, e);
            Self::default()
        });
        config.with_env_override(std::env::var(API_KEY_ENV).ok())
    }

    fn with_env_override(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            log::debug!("Using Firebase API key from {}", API_KEY_ENV);
            self.firebase.api_key = key;
        }
        self
    }
}
