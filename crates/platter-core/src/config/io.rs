//! YAML configuration I/O
//!
//! Generic helpers shared by every binary: read a config file into any
//! deserializable type, falling back to defaults when missing or invalid,
//! and write one back, creating parent directories as needed.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a YAML config, falling back to `T::default()` on any problem
///
/// A broken file is never fatal: the error is logged and defaults win, so a
/// bad edit cannot keep the player from starting.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("[CONFIG] {:?} not found, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_yaml::from_str::<T>(&raw) {
            Ok(config) => {
                log::info!("[CONFIG] loaded {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("[CONFIG] {:?} failed to parse ({}), using defaults", path, e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("[CONFIG] {:?} unreadable ({}), using defaults", path, e);
            T::default()
        }
    }
}

/// Write a config as YAML, creating parent directories first
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("serializing config")?;
    std::fs::write(path, yaml).with_context(|| format!("writing {:?}", path))?;

    log::info!("[CONFIG] saved {:?}", path);
    Ok(())
}
