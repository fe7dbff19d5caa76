use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::GatewayError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_CACHE_VERSION: &str = "v1";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Root the `api/...` paths are resolved against. Always ends with `/`.
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` lets requests run until the server answers.
    pub request_timeout: Option<Duration>,
}

impl GatewaySettings {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| GatewayError::InvalidUrl(err.to_string()))
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, GatewayError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|err| GatewayError::InvalidUrl(format!("{raw}: {err}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineSettings {
    pub enabled: bool,
    pub cache_version: String,
    pub cache_dir: PathBuf,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            cache_dir: PathBuf::from(".cne-console-cache"),
        }
    }
}
