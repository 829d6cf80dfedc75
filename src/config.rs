use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub upload: UploadConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/predict".to_string(),
            timeout_secs: 60,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest image accepted for upload, in bytes.
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Typst color literal used for headings and emphasis.
    pub accent: String,
    pub page_numbers: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Kiwi Leaf Disease Report".to_string(),
            accent: "#047857".to_string(),
            page_numbers: false,
        }
    }
}

impl Config {
    /// The defaults bundled into the binary from `default_config.toml`.
    pub fn compiled_default() -> Self {
        Self::from_toml(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if not found.
    ///
    /// A file that exists but fails to parse is reported and ignored.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::compiled_default()
            }),
            Err(_) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::compiled_default()
            }
        }
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
