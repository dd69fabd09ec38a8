//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.keystone/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Identity pools are never compiled in: each environment declares its own
//! `[profiles.<name>]` table and one of them is selected at startup.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::identity::CognitoSettings;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KeystoneConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_profile: Option<String>,
    pub language: Option<String>,
    pub data_dir: Option<String>,
    pub translations_file: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    pub region: Option<String>,
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    pub identity_pool_id: Option<String>,
    pub mandatory_sign_in: Option<bool>,
    pub endpoint: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityProfile {
    pub name: String,
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub identity_pool_id: Option<String>,
    pub mandatory_sign_in: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub profile: IdentityProfile,
    pub language: Option<String>,
    pub data_dir: PathBuf,
    pub translations_file: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl ResolvedConfig {
    pub fn cognito_settings(&self) -> CognitoSettings {
        CognitoSettings {
            region: self.profile.region.clone(),
            user_pool_id: self.profile.user_pool_id.clone(),
            client_id: self.profile.client_id.clone(),
            endpoint: self.profile.endpoint.clone(),
            mandatory_sign_in: self.profile.mandatory_sign_in,
            request_timeout: self.request_timeout,
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(crate::core::store::STORE_FILE)
    }
}

/// CLI-level overrides (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub profile: Option<String>,
    pub language: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    UnknownProfile(String),
    MissingField { profile: String, field: &'static str },
    NoDataDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::UnknownProfile(name) => {
                write!(f, "identity profile '{name}' is not defined under [profiles]")
            }
            ConfigError::MissingField { profile, field } => {
                write!(f, "identity profile '{profile}' is missing '{field}'")
            }
            ConfigError::NoDataDir => write!(f, "could not determine a data directory"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.keystone`.
pub fn keystone_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".keystone"))
}

/// Returns the path to `~/.keystone/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    keystone_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.keystone/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `KeystoneConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<KeystoneConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(KeystoneConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(KeystoneConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<KeystoneConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: KeystoneConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Keystone Configuration
# All settings are optional except the identity profile you run with.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_profile = "default"        # Or KEYSTONE_PROFILE / --profile
# language = "en"                    # Or KEYSTONE_LANGUAGE / --language
# data_dir = "~/.keystone"           # Or KEYSTONE_DATA_DIR
# translations_file = "translations.json"   # Path relative to data_dir
# request_timeout_secs = 15

# [profiles.default]
# region = "us-west-2"
# user_pool_id = "us-west-2_XXXXXXXXX"
# client_id = "xxxxxxxxxxxxxxxxxxxxxxxxxx"
# identity_pool_id = "us-west-2:00000000-0000-0000-0000-000000000000"
# mandatory_sign_in = true
# endpoint = "http://localhost:9229" # Or KEYSTONE_IDENTITY_ENDPOINT

# [profiles.prod]
# region = "us-west-2"
# user_pool_id = "us-west-2_YYYYYYYYY"
# client_id = "yyyyyyyyyyyyyyyyyyyyyyyyyy"
# mandatory_sign_in = false
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Expands a leading `~/` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn required(
    value: &Option<String>,
    profile: &str,
    field: &'static str,
) -> Result<String, ConfigError> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            profile: profile.to_string(),
            field,
        })
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &KeystoneConfig, cli: &Overrides) -> Result<ResolvedConfig, ConfigError> {
    // Profile: CLI → env → config → default
    let profile_name = cli
        .profile
        .clone()
        .or_else(|| std::env::var("KEYSTONE_PROFILE").ok())
        .or_else(|| config.general.default_profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let raw = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| ConfigError::UnknownProfile(profile_name.clone()))?;

    // Endpoint: env → profile
    let endpoint = std::env::var("KEYSTONE_IDENTITY_ENDPOINT")
        .ok()
        .or_else(|| raw.endpoint.clone());

    let region = match &endpoint {
        // A custom endpoint does not need a region to build its URL.
        Some(_) => raw.region.clone().unwrap_or_default(),
        None => required(&raw.region, &profile_name, "region")?,
    };

    let profile = IdentityProfile {
        user_pool_id: required(&raw.user_pool_id, &profile_name, "user_pool_id")?,
        client_id: required(&raw.client_id, &profile_name, "client_id")?,
        identity_pool_id: raw.identity_pool_id.clone(),
        mandatory_sign_in: raw.mandatory_sign_in.unwrap_or(true),
        endpoint,
        region,
        name: profile_name,
    };

    // Language: CLI → env → config (None = whatever the store remembers, else first language)
    let language = cli
        .language
        .clone()
        .or_else(|| std::env::var("KEYSTONE_LANGUAGE").ok())
        .or_else(|| config.general.language.clone());

    // Data dir: env → config → ~/.keystone
    let data_dir = std::env::var("KEYSTONE_DATA_DIR")
        .ok()
        .or_else(|| config.general.data_dir.clone())
        .map(|raw| expand_home(&raw))
        .or_else(keystone_dir)
        .ok_or(ConfigError::NoDataDir)?;

    let translations_file = config.general.translations_file.as_ref().map(|file| {
        let path = expand_home(file);
        if path.is_absolute() {
            path
        } else {
            data_dir.join(path)
        }
    });

    Ok(ResolvedConfig {
        profile,
        language,
        translations_file,
        request_timeout: Duration::from_secs(
            config
                .general
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        data_dir,
    })
}
