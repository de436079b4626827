pub use cf_core::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    warn_on_issues(&config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./clipforge.toml", "~/.config/clipforge/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    warn_on_issues(&config);
    Ok(config)
}

/// Apply `DB_PATH`, `VIDEO_STORAGE_PATH`, `MAX_VIDEO_SIZE`,
/// `MAX_VIDEO_DURATION` and `MIN_VIDEO_DURATION` from the process
/// environment.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` as the environment.
///
/// Empty values are ignored. Numeric values that fail to parse are logged
/// and ignored, leaving the file or default value in place.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = get("DB_PATH") {
        config.database.path = PathBuf::from(path);
    }
    if let Some(path) = get("VIDEO_STORAGE_PATH") {
        config.storage.root = PathBuf::from(path);
    }
    if let Some(bytes) = get("MAX_VIDEO_SIZE").and_then(|v| parse_number("MAX_VIDEO_SIZE", &v)) {
        config.policy.max_upload_bytes = bytes;
    }
    if let Some(secs) =
        get("MAX_VIDEO_DURATION").and_then(|v| parse_number("MAX_VIDEO_DURATION", &v))
    {
        config.policy.max_duration_secs = secs;
    }
    if let Some(secs) =
        get("MIN_VIDEO_DURATION").and_then(|v| parse_number("MIN_VIDEO_DURATION", &v))
    {
        config.policy.min_duration_secs = secs;
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value, "ignoring non-numeric environment override");
            None
        }
    }
}

fn warn_on_issues(config: &Config) {
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
}
