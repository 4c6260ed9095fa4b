//! Configuration loader: merges .env, config.toml, and environment variables.

use std::path::{Path, PathBuf};

use common::{Error, SyncConfig};

fn parse_positive_u32(raw: &str, env_name: &str) -> Result<u32, Error> {
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::Config(format!("{env_name} must be an integer > 0"))),
    }
}

fn parse_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn validate_config(config: &SyncConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.cache_dir.as_os_str().is_empty() {
        issues.push("cache_dir must not be empty".into());
    }
    if config.output_dir.as_os_str().is_empty() {
        issues.push("output_dir must not be empty".into());
    }
    let base = config.espn_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        issues.push("espn_base_url must start with http:// or https://".into());
    }
    if config.fetch.max_attempts == 0 {
        issues.push("fetch.max_attempts must be > 0".into());
    }
    if config.fetch.request_timeout_secs == Some(0) {
        issues.push("fetch.request_timeout_secs must be > 0 when set".into());
    }
    if config.fetch.user_agent.trim().is_empty() {
        issues.push("fetch.user_agent must not be empty".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply `SEASON_SYNC_*` overrides using `lookup` to read variables.
fn apply_env_overrides(
    config: &mut SyncConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), Error> {
    if let Some(dir) = lookup("SEASON_SYNC_CACHE_DIR") {
        config.cache_dir = PathBuf::from(dir);
    }
    if let Some(url) = lookup("SEASON_SYNC_ESPN_BASE_URL") {
        config.espn_base_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(dir) = lookup("SEASON_SYNC_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(raw) = lookup("SEASON_SYNC_MAX_ATTEMPTS") {
        config.fetch.max_attempts = parse_positive_u32(&raw, "SEASON_SYNC_MAX_ATTEMPTS")?;
    }
    if let Some(raw) = lookup("SEASON_SYNC_BACKOFF_BASE_MS") {
        config.fetch.backoff_base_ms = parse_u64(&raw, "SEASON_SYNC_BACKOFF_BASE_MS")?;
    }
    if let Some(raw) = lookup("SEASON_SYNC_REQUEST_TIMEOUT_SECS") {
        config.fetch.request_timeout_secs = if raw.trim().is_empty() {
            None
        } else {
            Some(parse_u64(&raw, "SEASON_SYNC_REQUEST_TIMEOUT_SECS")?)
        };
    }
    Ok(())
}

fn load_from(config_path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<SyncConfig, Error> {
    let mut config = SyncConfig::default();

    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    }

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load sync configuration from .env, an optional config.toml, and the
/// environment (highest priority).
pub fn load_config() -> Result<SyncConfig, Error> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    load_from(Path::new("config.toml"), |name| std::env::var(name).ok())
}
