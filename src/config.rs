//! Process configuration. Everything comes from the environment, is read once
//! at startup, and travels as an immutable value from there on -- handlers
//! never touch `std::env`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Default cap on a decoded canvas snapshot
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Origins the browser frontend is served from in production
pub const PROD_ORIGINS: [&str; 2] = ["http://localhost:3000", "https://mathcanvas.app"];

/// Deployment mode. Switches the CORS allow-list and the default log
/// verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub env: RunMode,
    /// Credential for the vision model. Absence does not abort startup; the
    /// analysis route is disabled instead.
    pub gemini_api_key: Option<String>,
    pub max_image_bytes: usize,
}

impl Settings {
    /// Read `HOST`, `PORT`, `ENV`, `GEMINI_API_KEY` and `MAX_IMAGE_BYTES`
    /// from the process environment, with defaults for all but the key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("env", "prod")?
            .set_default("max_image_bytes", DEFAULT_MAX_IMAGE_BYTES as i64)?
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default `RUST_LOG`-style filter for the mode
    pub fn default_log_filter(&self) -> &'static str {
        match self.env {
            RunMode::Dev => "debug",
            RunMode::Prod => "info",
        }
    }

    /// Limit for the JSON body extractor. The data URL inflates the image by
    /// 4/3, plus envelope overhead, so the cap is half again the image limit.
    pub fn json_body_limit(&self) -> usize {
        self.max_image_bytes + self.max_image_bytes / 2
    }
}
