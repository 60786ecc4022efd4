//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the gate configuration
//! from the configuration file (~/.config/casegate/config.toml).

use crate::paths::CasegatePaths;
use casegate_core::config::GateConfig;
use casegate_core::{CasegateError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Overrides the backend URL from the environment.
pub const ENV_BACKEND_URL: &str = "CASEGATE_BACKEND_URL";
/// Overrides the backend anon key from the environment.
pub const ENV_ANON_KEY: &str = "CASEGATE_ANON_KEY";

/// Configuration service that loads and caches the gate configuration.
///
/// A missing file yields the defaults. Environment overrides are applied on
/// every load.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<GateConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService for the default config path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(CasegatePaths::config_file()?))
    }

    /// Creates a ConfigService for an explicit config path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<GateConfig> {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = Self::load_config(&self.path)?;

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    /// Writes `config` to the config path, creating parent directories.
    pub fn save(&self, config: &GateConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        self.invalidate_cache();
        tracing::info!("[ConfigService] Saved config to {}", self.path.display());
        Ok(())
    }

    fn load_config(path: &Path) -> Result<GateConfig> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<GateConfig>(&content).map_err(|e| {
                CasegateError::config(format!("Invalid config {}: {}", path.display(), e))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "[ConfigService] No config at {}, using defaults",
                    path.display()
                );
                GateConfig::default()
            }
            Err(err) => return Err(err.into()),
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Applies environment overrides through `lookup`.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
        config.backend.url = url;
    }
    if let Some(key) = lookup(ENV_ANON_KEY).filter(|v| !v.is_empty()) {
        config.backend.anon_key = key;
    }
}
