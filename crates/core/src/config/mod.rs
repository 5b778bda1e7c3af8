use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EncodeSettings, Result, ToolkitError};

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

/// Base URL of the public Roblox friends API.
pub const ROBLOX_FRIENDS_BASE_URL: &str = "https://friends.roblox.com";

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub montage: MontageConfig,
}

impl AppConfig {
    /// Defaults with the server port taken from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            montage: MontageConfig::default(),
        })
    }
}

/// Settings for the friend lookup web service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            api_base_url: ROBLOX_FRIENDS_BASE_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::with_port_value(std::env::var("PORT").ok().as_deref())
    }

    /// Builds the default configuration, overriding the port with `value`
    /// when one is supplied.
    pub fn with_port_value(value: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = value {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ToolkitError::Config(format!("PORT must be an integer, got `{raw}`")))?;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// File names used by the montage helper, relative to its base directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MontageConfig {
    pub video_file: String,
    pub audio_file: String,
    pub filters_file: String,
    pub output_file: String,
    pub encoder: EncodeSettings,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            video_file: "gameplay.mp4".to_string(),
            audio_file: "audio.mp3".to_string(),
            filters_file: "filters_pro.txt".to_string(),
            output_file: "bedwars_montage_pro.mp4".to_string(),
            encoder: EncodeSettings::default(),
        }
    }
}
