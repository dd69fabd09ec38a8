//! # Persisted Store
//!
//! A small JSON document at `<data_dir>/store.json` that survives restarts:
//! user preferences plus free-form entries screens may stash.
//!
//! Restoration runs off the UI thread; until it reports back, the app keeps
//! its "restored" gate closed and shows the loading view. A missing or
//! unreadable file restores to defaults so the gate always opens.
//!
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const STORE_VERSION: u32 = 1;
pub const STORE_FILE: &str = "store.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Preferences {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            preferences: Preferences::default(),
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {e}"),
            StoreError::Serialize(e) => write!(f, "store serialization error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Loads the store, falling back to defaults on any problem.
pub fn restore(path: &Path) -> StoreState {
    match try_restore(path) {
        Ok(Some(state)) => {
            info!("Restored store from {}", path.display());
            state
        }
        Ok(None) => {
            debug!("No store at {}, starting fresh", path.display());
            StoreState::default()
        }
        Err(e) => {
            warn!("Ignoring unreadable store {}: {}", path.display(), e);
            StoreState::default()
        }
    }
}

fn try_restore(path: &Path) -> Result<Option<StoreState>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(StoreError::Io)?;
    let mut state: StoreState = serde_json::from_str(&json).map_err(StoreError::Serialize)?;
    if state.version != STORE_VERSION {
        warn!(
            "Store version {} differs from {}, keeping readable fields",
            state.version, STORE_VERSION
        );
        state.version = STORE_VERSION;
    }
    Ok(Some(state))
}

pub fn persist(path: &Path, state: &StoreState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::Io)?;
    }
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;
    fs::write(&tmp_path, json).map_err(StoreError::Io)?;
    fs::rename(&tmp_path, path).map_err(StoreError::Io)?;
    debug!("Store saved to {}", path.display());
    Ok(())
}
