use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub paths: Option<PathsCfg>,
    pub remap: Option<RemapCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathsCfg {
    pub data_path: Option<String>,   // directory with users/products/interactions.csv
    pub output_path: Option<String>, // directory for ratings.csv and the id maps
}

#[derive(Debug, Default, Deserialize)]
pub struct RemapCfg {
    /// "keep" (default), "drop", or "fail"
    pub unmapped: Option<String>,
    /// Single ASCII character; outputs are always comma-separated.
    pub delimiter: Option<String>,
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: UserConfig =
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Pick a required directory: env value first, then config. Neither has a default.
pub fn require_dir(
    env_name: &str,
    env_value: Option<&str>,
    cfg_value: Option<&str>,
) -> anyhow::Result<PathBuf> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| cfg_value.filter(|v| !v.trim().is_empty()))
        .map(|v| expand_home(v.trim()))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "{} is not set (export {} or set it under [paths] in config.toml)",
                env_name,
                env_name
            )
        })
}

/// Pick an optional setting: env value when set, else config, else `default`.
pub fn pick_setting(env_value: Option<&str>, cfg_value: Option<&str>, default: &str) -> String {
    env_value.or(cfg_value).unwrap_or(default).to_string()
}

pub fn parse_delimiter(s: &str) -> anyhow::Result<u8> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ if s == "\\t" => Ok(b'\t'),
        _ => anyhow::bail!("delimiter must be a single ASCII character, got '{}'", s),
    }
}
