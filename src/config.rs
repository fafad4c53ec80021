use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, MAX_INTERVAL};
use crate::report::ReportMarkup;

pub const DEFAULT_CMC_BASE_URL: &str = "https://pro-api.coinmarketcap.com";

const CONFIG_DIR_NAME: &str = "quotebot";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub cmc_api_key: Option<String>,
    pub cmc_base_url: String,
    pub report_markup: ReportMarkup,
    pub cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    cmc_api_key: Option<String>,
    cmc_base_url: Option<String>,
    report_markup: Option<String>,
    cache_ttl_secs: Option<u64>,
    cache_sweep_secs: Option<u64>,
}

impl AppConfig {
    #[cfg(test)]
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Loads `explicit_path` if given, otherwise the discovered default path.
    /// Environment variables (and `.env`) override file values.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?;

        dotenvy::dotenv().ok();

        let file_api_key = file_config
            .as_ref()
            .and_then(|cfg| cfg.cmc_api_key.as_ref())
            .and_then(|value| non_empty(value).map(ToOwned::to_owned));
        let file_base_url = file_config
            .as_ref()
            .and_then(|cfg| cfg.cmc_base_url.as_ref())
            .and_then(|value| non_empty(value).map(ToOwned::to_owned));

        let file_markup = file_config
            .as_ref()
            .and_then(|cfg| cfg.report_markup.as_deref());
        let report_markup = match file_markup {
            Some(value) => ReportMarkup::from_str(value)
                .map_err(|reason| config_error(&config_path, "report_markup", &reason))?,
            None => ReportMarkup::default(),
        };
        let cache_ttl = parse_seconds(
            file_config.as_ref().and_then(|cfg| cfg.cache_ttl_secs),
            DEFAULT_TTL,
            &config_path,
            "cache_ttl_secs",
        )?;
        let cache_sweep_interval = parse_seconds(
            file_config.as_ref().and_then(|cfg| cfg.cache_sweep_secs),
            DEFAULT_SWEEP_INTERVAL,
            &config_path,
            "cache_sweep_secs",
        )?;

        Ok(Self {
            config_path,
            cmc_api_key: env_non_empty("CMC_PRO_API_KEY").or(file_api_key),
            cmc_base_url: env_non_empty("CMC_BASE_URL")
                .or(file_base_url)
                .unwrap_or_else(|| DEFAULT_CMC_BASE_URL.to_string()),
            report_markup,
            cache_ttl,
            cache_sweep_interval,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        anyhow!("Failed to resolve config path: HOME directory is unavailable")
    })?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text).map(Some).map_err(|err| {
        anyhow!(
            "Failed to load config {}: {err}",
            config_path.display()
        )
    })
}

fn parse_seconds(
    value: Option<u64>,
    default: Duration,
    config_path: &Path,
    key_path: &str,
) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(0) => Err(config_error(config_path, key_path, "must be at least 1")),
        Some(secs) if secs > MAX_INTERVAL.as_secs() => Err(config_error(
            config_path,
            key_path,
            &format!("must be at most {}", MAX_INTERVAL.as_secs()),
        )),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
