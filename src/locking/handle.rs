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

use crate::error::{Result, SemaphoreError};
use crate::locking::acquisition::{self, AcquireOptions};
use crate::locking::exit_hooks::{self, ExitHookId};
use crate::locking::identifier::ResourceIdentifier;
use crate::locking::timestamp;
use crate::platform::LockDirectory;
use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::time::Instant;

/// Exclusive, cross-process lock on a named resource.
///
/// A `ResourceLock` only exists in the locked state: [`ResourceLock::acquire`]
/// either returns a held lock or an error. The lock is released by
/// [`ResourceLock::release`], when the value is dropped, or at process exit
/// once [`ResourceLock::enable_auto_release`] has been called.
#[derive(Debug)]
pub struct ResourceLock {
    state: Arc<LockState>,
    last_timestamp: Option<f64>,
    acquired_timestamp: f64,
}

/// Part of the lock shared with the exit hook.
///
/// `held` only guards the release path. It is created after the file lock is
/// obtained and is never held while waiting for another process.
#[derive(Debug)]
struct LockState {
    identifier: ResourceIdentifier,
    path: PathBuf,
    acquired_at: Instant,
    held: Mutex<HeldFile>,
}

#[derive(Debug)]
struct HeldFile {
    file: Option<File>,
    delete_on_release: bool,
    exit_hook: Option<ExitHookId>,
}

impl ResourceLock {
    /// Acquires the lock for `identifier` inside `directory`.
    ///
    /// The identifier is validated before the filesystem is touched. On
    /// success the previous holder's timestamp is available through
    /// [`ResourceLock::last_timestamp`] and the lock file holds the time of
    /// this acquisition.
    pub fn acquire(
        directory: &dyn LockDirectory,
        identifier: &str,
        options: &AcquireOptions,
    ) -> Result<Self> {
        let identifier = ResourceIdentifier::parse(identifier)?;
        let path = directory.resolve(&identifier.lock_file_name());
        let mut file = acquisition::lock_exclusive(&identifier, &path, options)?;
        let acquired_at = Instant::now();

        let (last_timestamp, acquired_timestamp) = match stamp(&mut file) {
            Ok(stamps) => stamps,
            Err(source) => {
                if let Err(err) = file.unlock() {
                    warn!("Failed to unlock {} after write failure: {err}", path.display());
                }
                return Err(SemaphoreError::LockFileUnavailable { path, source });
            }
        };

        debug!(
            "Locked {identifier} at {} (previous holder: {})",
            timestamp::format(acquired_timestamp),
            last_timestamp
                .map(timestamp::format)
                .unwrap_or_else(|| "none".to_string())
        );

        let mut lock = Self {
            state: Arc::new(LockState {
                identifier,
                path,
                acquired_at,
                held: Mutex::new(HeldFile {
                    file: Some(file),
                    delete_on_release: false,
                    exit_hook: None,
                }),
            }),
            last_timestamp,
            acquired_timestamp,
        };
        if options.delete_on_release {
            lock.enable_delete_on_release();
        }
        Ok(lock)
    }

    pub fn identifier(&self) -> &ResourceIdentifier {
        &self.state.identifier
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Timestamp written by the previous holder, `None` on first-ever use.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Timestamp this holder wrote into the lock file.
    pub fn acquired_timestamp(&self) -> f64 {
        self.acquired_timestamp
    }

    pub fn is_locked(&self) -> bool {
        self.state.held().file.is_some()
    }

    /// Returns true when there is no previous timestamp, or when at least
    /// `seconds` have passed since the previous holder acquired the lock.
    pub fn check_elapsed_time(&self, seconds: f64) -> bool {
        match self.last_timestamp {
            None => true,
            Some(last) => timestamp::now() - last >= seconds,
        }
    }

    /// Removes the lock file when the lock is released.
    pub fn enable_delete_on_release(&mut self) {
        self.state.held().delete_on_release = true;
    }

    /// Releases the lock at process exit if it is still held then.
    ///
    /// The exit hook is withdrawn as soon as the lock is released by other
    /// means. Calling this on a released lock does nothing.
    pub fn enable_auto_release(&mut self) {
        let mut held = self.state.held();
        if held.file.is_none() || held.exit_hook.is_some() {
            return;
        }

        let state: Weak<LockState> = Arc::downgrade(&self.state);
        held.exit_hook = Some(exit_hooks::register(move || {
            if let Some(state) = state.upgrade()
                && let Err(err) = state.release_at_exit()
            {
                warn!("Auto-release failed: {err}");
            }
        }));
        debug!("Auto-release enabled for {}", self.state.identifier);
    }

    /// Unlocks the resource. Calling this on a released lock does nothing.
    pub fn release(&mut self) -> Result<()> {
        self.state.release()
    }
}

impl Drop for ResourceLock {
    fn drop(&mut self) {
        if let Err(err) = self.state.release() {
            warn!(
                "Failed to release {} during drop: {err}",
                self.state.path.display()
            );
        }
    }
}

impl LockState {
    fn held(&self) -> MutexGuard<'_, HeldFile> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) -> Result<()> {
        self.release_held(self.held())
    }

    /// Release path of the exit hook. If another thread is releasing at the
    /// same moment, that release is left to finish on its own.
    fn release_at_exit(&self) -> Result<()> {
        match self.held.try_lock() {
            Ok(held) => self.release_held(held),
            Err(TryLockError::Poisoned(poisoned)) => self.release_held(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                debug!("Release of {} already in progress at exit", self.identifier);
                Ok(())
            }
        }
    }

    fn release_held(&self, mut held: MutexGuard<'_, HeldFile>) -> Result<()> {
        let Some(file) = held.file.take() else {
            return Ok(());
        };
        if let Some(id) = held.exit_hook.take() {
            exit_hooks::unregister(id);
        }

        // Closing the descriptor drops the OS lock even when unlock reports an error
        let unlocked = file.unlock();
        drop(file);
        if let Err(err) = unlocked {
            warn!(
                "Failed to release lock for {} ({}): {err}",
                self.identifier,
                self.path.display()
            );
            return Err(SemaphoreError::UnlockFailed {
                resource: self.identifier.to_string(),
                details: err.to_string(),
            });
        }

        debug!(
            "Released lock for {} after {:.3}s",
            self.identifier,
            self.acquired_at.elapsed().as_secs_f64()
        );

        if held.delete_on_release {
            remove_lock_file(&self.path);
        }
        Ok(())
    }
}

/// Reads the previous timestamp and records the current one.
fn stamp(file: &mut File) -> io::Result<(Option<f64>, f64)> {
    let previous = timestamp::read_previous(file)?;
    let current = timestamp::now();
    timestamp::write_current(file, current)?;
    Ok((previous, current))
}

/// Best-effort removal; failures are logged and never surfaced.
fn remove_lock_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed lock file {}", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!("Failed to remove lock file {}: {err}", path.display()),
    }
}
