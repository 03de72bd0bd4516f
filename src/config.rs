use std::time::Duration;

use url::Url;

/// Request timeout for one upload. OCR on large photos is slow server-side.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(130);

pub const PROCESS_IMAGE_PATH: &str = "api/v1/process-image";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API base URL is not set; export API_BASE_URL or pass --base-url")]
    MissingBaseUrl,
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("API base URL must use http or https, got {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: Url,
    pub endpoint: Url,
    pub timeout: Duration,
}

impl Config {
    pub fn new(base_url: Option<&str>) -> Result<Self, ConfigError> {
        let raw = base_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let mut base_url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        // `join` replaces the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let endpoint = base_url
            .join(PROCESS_IMAGE_PATH)
            .map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self {
            base_url,
            endpoint,
            timeout: UPLOAD_TIMEOUT,
        })
    }
}
