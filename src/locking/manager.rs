// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::{SemaphoreConfig, TIMEOUT_ENV_VAR};
use crate::error::{Result, SemaphoreError};
use crate::locking::acquisition::AcquireOptions;
use crate::locking::handle::ResourceLock;
use crate::platform::{FsLockDirectory, LockDirectory};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Hands out [`ResourceLock`]s backed by one validated lock directory.
#[derive(Debug, Clone)]
pub struct LockManager {
    directory: Arc<dyn LockDirectory>,
    defaults: AcquireOptions,
}

impl LockManager {
    /// Validates that `directory` is writable and readable.
    pub fn new(directory: Arc<dyn LockDirectory>) -> Result<Self> {
        let root = directory.root().display().to_string();
        if !directory.is_writable() {
            return Err(SemaphoreError::DirectoryNotWritable(root));
        }
        if !directory.is_readable() {
            return Err(SemaphoreError::DirectoryNotReadable(root));
        }

        debug!("Lock manager using directory {root}");
        Ok(Self {
            directory,
            defaults: AcquireOptions::default(),
        })
    }

    pub fn with_default_directory<P: Into<PathBuf>>(root: P) -> Result<Self> {
        Self::new(Arc::new(FsLockDirectory::new(root)))
    }

    /// Builds a manager from configuration, creating the lock directory when
    /// missing and honouring the timeout override in the environment.
    pub fn from_config(config: &SemaphoreConfig) -> Result<Self> {
        let env_override = std::env::var(TIMEOUT_ENV_VAR).ok();
        Self::from_config_with_env(config, env_override.as_deref())
    }

    pub(crate) fn from_config_with_env(
        config: &SemaphoreConfig,
        env_override: Option<&str>,
    ) -> Result<Self> {
        let directory = FsLockDirectory::new(config.locking.directory());
        directory.ensure_exists()?;

        let resolution = config.locking.resolve_timeout(env_override)?;
        info!(
            "Lock timeout {} (from {})",
            resolution.value, resolution.source
        );

        let defaults = config.locking.acquire_options(resolution.value);
        Ok(Self::new(Arc::new(directory))?.with_defaults(defaults))
    }

    /// Replaces the options used by [`LockManager::obtain_lock_with_defaults`].
    pub fn with_defaults(mut self, defaults: AcquireOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn directory(&self) -> &dyn LockDirectory {
        self.directory.as_ref()
    }

    pub fn defaults(&self) -> &AcquireOptions {
        &self.defaults
    }

    pub fn obtain_lock(&self, identifier: &str, options: &AcquireOptions) -> Result<ResourceLock> {
        ResourceLock::acquire(self.directory.as_ref(), identifier, options)
    }

    pub fn obtain_lock_with_defaults(&self, identifier: &str) -> Result<ResourceLock> {
        self.obtain_lock(identifier, &self.defaults)
    }
}
