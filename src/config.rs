//! API connection configuration.
//!
//! Values resolve in a fixed order: command-line flag, then the INI config
//! file (`[Zabbix API]` section), then a hard error. The result is one
//! immutable struct handed to every component; nothing reads the config
//! file after startup.

use std::env;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

const CONFIG_SECTION: &str = "Zabbix API";
const DEFAULT_CONFIG_FILE: &str = ".zabbix-api.conf";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API User not set")]
    MissingUsername,
    #[error("API Password not set")]
    MissingPassword,
    #[error("API URL is not set")]
    MissingUrl,
    #[error("invalid truth value: {0:?}")]
    InvalidBool(String),
}

/// Resolved API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub username: String,
    pub password: String,
    pub api_url: String,
    /// Validate TLS certificates (disabled by `no_verify`).
    pub verify_tls: bool,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_url: Option<String>,
    /// Set when `--no-verify` was passed on the command line.
    pub no_verify: bool,
}

/// Default config file location: `$HOME/.zabbix-api.conf`.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| Path::new(&home).join(DEFAULT_CONFIG_FILE))
}

/// Parse the usual truthy/falsy word set into a boolean.
pub fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "false" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool(value.to_string())),
    }
}

impl ApiConfig {
    /// Resolve the configuration from an optional INI file plus overrides.
    ///
    /// A missing or unreadable config file is not fatal by itself; missing
    /// required values after merging are.
    pub fn resolve(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut username = None;
        let mut password = None;
        let mut api_url = None;
        let mut no_verify = false;

        if let Some(path) = config_file {
            match Ini::load_from_file(path) {
                Ok(file) => {
                    if let Some(section) = file.section(Some(CONFIG_SECTION)) {
                        username = section.get("username").map(str::to_string);
                        password = section.get("password").map(str::to_string);
                        api_url = section.get("api").map(str::to_string);
                        if let Some(raw) = section.get("no_verify") {
                            no_verify = parse_bool(raw)?;
                        }
                    } else {
                        tracing::warn!(
                            "config file {} has no [{}] section",
                            path.display(),
                            CONFIG_SECTION
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!("could not read config file {}: {}", path.display(), err);
                }
            }
        }

        if let Some(u) = &overrides.username {
            username = Some(u.clone());
        }
        if let Some(p) = &overrides.password {
            password = Some(p.clone());
        }
        if let Some(a) = &overrides.api_url {
            api_url = Some(a.clone());
        }
        if overrides.no_verify {
            no_verify = true;
        }

        let username = username
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingUsername)?;
        let password = password
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingPassword)?;
        let api_url = api_url
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        Ok(ApiConfig {
            username,
            password,
            api_url,
            verify_tls: !no_verify,
        })
    }
}
