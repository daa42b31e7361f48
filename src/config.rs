use crate::error::{Result, SemaphoreError};
use crate::locking::acquisition::{AcquireOptions, DEFAULT_TIMEOUT_SECS};
use crate::locking::timeout::{LockTimeoutResolution, LockTimeoutResolver, LockTimeoutValue};
use crate::paths::locking::default_locks_root;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "semaphore.toml";

/// Environment variable overriding the configured lock timeout.
pub const TIMEOUT_ENV_VAR: &str = "SEMAPHORE_LOCK_TIMEOUT";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SemaphoreConfig {
    #[serde(default)]
    pub locking: LockingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockingConfig {
    /// Directory holding lock files; a temp-dir location when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Milliseconds between attempts; 0 fails immediately when contended.
    #[serde(default)]
    pub poll_interval_ms: u64,

    /// Polling budget: whole seconds or "infinite"; "0" waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<LockTimeoutValue>,

    #[serde(default)]
    pub delete_on_release: bool,
}

impl LockingConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_locks_root)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }

    pub fn timeout(&self) -> LockTimeoutValue {
        self.timeout.unwrap_or(LockTimeoutValue::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Applies the environment > config > default precedence to the timeout.
    pub fn resolve_timeout(&self, env_override: Option<&str>) -> Result<LockTimeoutResolution> {
        LockTimeoutResolver::new(
            env_override,
            self.timeout,
            LockTimeoutValue::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .resolve()
        .map_err(|e| SemaphoreError::ConfigError(e.to_string()))
    }

    pub fn acquire_options(&self, timeout: LockTimeoutValue) -> AcquireOptions {
        AcquireOptions {
            poll_interval: self.poll_interval(),
            timeout,
            delete_on_release: self.delete_on_release,
        }
    }
}

impl SemaphoreConfig {
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            log::debug!("Config file not found at {config_path:?}, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: SemaphoreConfig = toml::from_str(&contents).map_err(|e| {
            SemaphoreError::ConfigError(format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))
        })?;

        log::debug!("Loaded config from {config_path:?}");
        Ok(config)
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| SemaphoreError::ConfigError(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, contents)?;
        log::debug!("Saved config to {config_path:?}");
        Ok(())
    }
}
