//! Device session and settings.
//!
//! Explicit state the engine is constructed with: server URL, bearer token,
//! and the settings file that persists the watermark. Lifecycle is
//! `init → used by every pass → cleared on logout`; nothing here lives in a
//! process-wide static.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::protocol::DEFAULT_WATERMARK;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    last_sync_time: Option<String>,
}

/// Watermark persistence: one small JSON file per device, outside the
/// record store.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    path: PathBuf,
}

impl DeviceSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DeviceSettings { path: path.into() }
    }

    /// The stored watermark, or the epoch default when absent — a brand-new
    /// device pulls the full remote history.
    pub fn watermark(&self) -> Result<String, SyncError> {
        Ok(self
            .read()?
            .last_sync_time
            .unwrap_or_else(|| DEFAULT_WATERMARK.to_string()))
    }

    pub fn set_watermark(&self, value: &str) -> Result<(), SyncError> {
        let mut file = self.read()?;
        file.last_sync_time = Some(value.to_string());
        self.write(&file)
    }

    pub fn clear_watermark(&self) -> Result<(), SyncError> {
        let mut file = self.read()?;
        file.last_sync_time = None;
        self.write(&file)
    }

    fn read(&self) -> Result<SettingsFile, SyncError> {
        if !self.path.exists() {
            return Ok(SettingsFile::default());
        }
        let raw =
            fs::read_to_string(&self.path).map_err(|err| SyncError::Settings(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| SyncError::Settings(err.to_string()))
    }

    fn write(&self, file: &SettingsFile) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| SyncError::Settings(err.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(file)
            .map_err(|err| SyncError::Settings(err.to_string()))?;
        fs::write(&self.path, raw).map_err(|err| SyncError::Settings(err.to_string()))
    }
}

/// Authenticated device session, passed into the engine constructor.
#[derive(Debug, Clone)]
pub struct Session {
    server_url: String,
    token: Option<String>,
    settings: DeviceSettings,
}

impl Session {
    pub fn new(server_url: impl Into<String>, settings: DeviceSettings) -> Self {
        Session {
            server_url: server_url.into(),
            token: None,
            settings,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn login(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// The bearer credential, or an auth error when nobody is logged in.
    pub fn token(&self) -> Result<&str, SyncError> {
        self.token
            .as_deref()
            .ok_or_else(|| SyncError::Auth("no active session".to_string()))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn watermark(&self) -> Result<String, SyncError> {
        self.settings.watermark()
    }

    pub fn set_watermark(&self, value: &str) -> Result<(), SyncError> {
        self.settings.set_watermark(value)
    }

    /// Drop the credential and the watermark. The next login starts from a
    /// full pull.
    pub fn logout(&mut self) -> Result<(), SyncError> {
        self.token = None;
        self.settings.clear_watermark()
    }
}
