//! Sync configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration, populated once at startup and passed down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root of the on-disk caches (`web/` and `season/` live under it).
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Base of the ESPN site API (without a trailing slash).
    #[serde(default = "default_espn_base_url")]
    pub espn_base_url: String,

    /// Directory for CSV / snapshot output when no explicit path is given.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// HTTP fetch behaviour.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// HTTP fetch and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Scale of the quadratic backoff: attempt i+1 waits roughly
    /// `backoff_base_ms * (i+1)^2`.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_cache_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".season-sync").join("cache")
}

fn default_espn_base_url() -> String {
    "https://site.api.espn.com/apis/site/v2/sports".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    concat!("season-sync/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            espn_base_url: default_espn_base_url(),
            output_dir: default_output_dir(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl SyncConfig {
    /// Where raw HTTP responses are cached.
    pub fn web_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("web")
    }

    /// Where completed seasons are cached.
    pub fn season_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("season")
    }
}
