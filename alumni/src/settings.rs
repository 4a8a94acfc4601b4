use std::{
    env, fs,
    path::{Path, PathBuf},
};

use config::{Config, File};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::proxy::{DEFAULT_PRIMARY_URL, DEFAULT_SECONDARY_URL, Endpoints};
use crate::cli::Args;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_api_url: Option<String>,
}

const CONFIG_FILE_NAME: &str = env!("CARGO_PKG_NAME");

/// Older deployments configured the primary backend under this name.
const PUBLIC_API_URL_VAR: &str = "NEXT_PUBLIC_API_URL";

// Function to get the XDG_CONFIG_HOME path
fn get_xdg_config_path() -> Option<PathBuf> {
    // First check XDG_CONFIG_HOME environment variable
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }

    // If XDG_CONFIG_HOME is not set, fall back to $HOME/.config
    if let Ok(home) = env::var("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }

    None
}

pub fn config_dir() -> Option<PathBuf> {
    get_xdg_config_path().map(|xdg_config| xdg_config.join(CONFIG_FILE_NAME))
}

pub fn load_settings_from(config_path: &Path) -> anyhow::Result<Settings> {
    if !config_path.exists() {
        return Ok(Settings::default());
    }

    Config::builder()
        .add_source(File::from(config_path).required(false))
        .build()?
        .try_deserialize()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize config file {}: {}",
                config_path.display(),
                e
            )
        })
}

pub fn load_settings() -> anyhow::Result<Settings> {
    match config_dir() {
        Some(dir) => load_settings_from(&dir.join("config.toml")),
        None => Ok(Settings::default()),
    }
}

pub fn write_settings_to(config_path: &Path, settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, toml::to_string_pretty(settings)?)?;
    debug!("settings written to {}", config_path.display());
    Ok(())
}

pub fn write_settings(settings: &Settings) -> anyhow::Result<()> {
    let dir = config_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?;
    write_settings_to(&dir.join("config.toml"), settings)
}

/// Fills backend URLs missing from the command line and environment, first
/// from the legacy public URL variable, then from the config file.
pub fn merge_settings_with_args(
    args: &Args,
    settings: &Settings,
    public_api_url: Option<String>,
) -> Args {
    let mut new_args = args.clone();

    let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());

    if blank(&new_args.api_url) {
        new_args.api_url = public_api_url.filter(|v| !v.trim().is_empty());
    }
    if blank(&new_args.api_url) {
        new_args.api_url = settings.api_url.clone();
    }
    if blank(&new_args.network_api_url) {
        new_args.network_api_url = settings.network_api_url.clone();
    }

    debug!("merged config: {:?}", new_args);

    new_args
}

pub fn load_merged_args(args: &Args) -> anyhow::Result<Args> {
    let settings = load_settings()?;
    Ok(merge_settings_with_args(
        args,
        &settings,
        env::var(PUBLIC_API_URL_VAR).ok(),
    ))
}

pub fn endpoints(args: &Args) -> Endpoints {
    let pick = |value: &Option<String>, default: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    Endpoints::new(
        &pick(&args.api_url, DEFAULT_PRIMARY_URL),
        &pick(&args.network_api_url, DEFAULT_SECONDARY_URL),
    )
}
