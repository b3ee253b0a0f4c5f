//! # Configuration
//!
//! Client settings loaded from a TOML file. Every section has defaults, so
//! an empty file (or no file at all) gives a client pointed at a local
//! service with a 1280×720 front-facing camera.
//!
//! ```toml
//! [client]
//! name = "Kiosk1"
//!
//! [service]
//! base_url = "http://localhost:8000"
//! api_prefix = "/api/v1"
//! # timeout_secs = 30
//!
//! [camera]
//! width = 1280
//! height = 720
//! facing = "user"
//! audio = false
//! jpeg_quality = 92
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: ClientConfig = load_config("config/kiosk.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

impl ClientConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Name used to prefix log lines (e.g. "Kiosk1")
    #[serde(default = "default_client_name")]
    pub name: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: default_client_name(),
        }
    }
}

/// Where the verification service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service origin, e.g. "http://localhost:8000"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Versioned API path joined between origin and `/verify`
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Request timeout. `None` waits for the service indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: None,
        }
    }
}

impl ServiceConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full URL of the verification endpoint.
    pub fn verify_url(&self) -> String {
        let prefix = self.api_prefix.trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };
        format!("{}{}/verify", self.base_url.trim_end_matches('/'), prefix)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    User,
    Environment,
}

/// Camera constraints, fixed when the device is activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub audio: bool,
    /// Quality of the lossy still encoding used by capture (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            facing: Facing::User,
            audio: false,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_client_name() -> String {
    "FaceVerify".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_jpeg_quality() -> u8 {
    92
}
