//! Path management for casegate configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/casegate/     # Config directory (dirs::config_dir)
//! └── config.toml         # Gate configuration
//! ```

use casegate_core::{CasegateError, Result};
use std::path::PathBuf;

pub struct CasegatePaths;

impl CasegatePaths {
    const APP_DIR: &'static str = "casegate";
    const CONFIG_FILE: &'static str = "config.toml";

    /// Returns the casegate configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/casegate/`)
    /// - `Err(CasegateError::Config)`: The platform has no config directory
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or_else(|| CasegateError::config("Cannot find the user config directory"))
    }

    /// Returns the default path of `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(Self::CONFIG_FILE))
    }
}
