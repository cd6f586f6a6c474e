use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::HttpOptions;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml). When the
/// section is absent no retries are performed and the first segment failure
/// fails the download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per segment (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/sfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfetchConfig {
    /// Number of parallel segments per download.
    pub segment_count: usize,
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Hard cap on a whole request in seconds (0 = unlimited).
    pub request_timeout_secs: u64,
    /// When true, the first segment failure aborts in-flight siblings instead
    /// of letting them run to completion behind the barrier.
    #[serde(default)]
    pub cancel_on_failure: bool,
    /// Optional retry policy; absent means no retries.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for SfetchConfig {
    fn default() -> Self {
        Self {
            segment_count: 10,
            connect_timeout_secs: 30,
            request_timeout_secs: 3600,
            cancel_on_failure: false,
            retry: None,
        }
    }
}

impl SfetchConfig {
    /// HTTP settings shared by the probe and every segment GET.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: match self.request_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// Retry policy, `None` when the `[retry]` section is absent.
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.as_ref().map(|r| RetryPolicy {
            max_attempts: r.max_attempts,
            base_delay: Duration::from_secs_f64(r.base_delay_secs),
            max_delay: Duration::from_secs(r.max_delay_secs),
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
