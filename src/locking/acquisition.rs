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
use crate::locking::identifier::ResourceIdentifier;
use crate::locking::timeout::LockTimeoutValue;
use log::debug;
use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Default polling budget, in seconds, when a poll interval is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Policy applied while acquiring a resource lock.
///
/// Without a poll interval (or with a zero interval) acquisition makes a
/// single attempt and fails immediately when the resource is held elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    pub poll_interval: Option<Duration>,
    pub timeout: LockTimeoutValue,
    pub delete_on_release: bool,
}

impl AcquireOptions {
    pub fn non_blocking() -> Self {
        Self {
            poll_interval: None,
            timeout: LockTimeoutValue::from_secs(DEFAULT_TIMEOUT_SECS),
            delete_on_release: false,
        }
    }

    pub fn polling(interval: Duration, timeout: LockTimeoutValue) -> Self {
        Self {
            poll_interval: Some(interval),
            timeout,
            delete_on_release: false,
        }
    }

    pub fn with_delete_on_release(mut self, enabled: bool) -> Self {
        self.delete_on_release = enabled;
        self
    }

    /// Effective sleep between attempts; `None` means a single attempt.
    pub fn effective_poll_interval(&self) -> Option<Duration> {
        self.poll_interval.filter(|interval| !interval.is_zero())
    }

    pub fn is_blocking(&self) -> bool {
        self.effective_poll_interval().is_some()
    }
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self::non_blocking()
    }
}

/// Opens the lock file and takes an exclusive advisory lock on it according
/// to `options`. The file is dropped, and thereby closed, on every error path.
pub(crate) fn lock_exclusive(
    identifier: &ResourceIdentifier,
    lock_path: &Path,
    options: &AcquireOptions,
) -> Result<File> {
    let file = open_lock_file(lock_path).map_err(|source| SemaphoreError::LockFileUnavailable {
        path: lock_path.to_path_buf(),
        source,
    })?;

    let poll_interval = options.effective_poll_interval();
    let limit = options.timeout.limit();
    let acquisition_start = Instant::now();
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        match try_lock(&file) {
            Ok(()) => {
                debug!(
                    "Acquired lock for {identifier} after {attempts} attempt(s) in {:.3}s",
                    acquisition_start.elapsed().as_secs_f64()
                );
                return Ok(file);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                let Some(interval) = poll_interval else {
                    debug!("Lock for {identifier} is held elsewhere; not waiting");
                    return Err(SemaphoreError::ConcurrentRequestBlocked {
                        resource: identifier.to_string(),
                    });
                };

                thread::sleep(interval);

                if let Some(limit) = limit
                    && acquisition_start.elapsed() >= limit
                {
                    let waited = acquisition_start.elapsed();
                    debug!(
                        "Gave up waiting for {identifier} after {attempts} attempt(s) in {:.3}s",
                        waited.as_secs_f64()
                    );
                    return Err(SemaphoreError::ConcurrentRequestTimeout {
                        resource: identifier.to_string(),
                        waited_secs: waited.as_secs_f64(),
                    });
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(SemaphoreError::LockFileUnavailable {
                    path: lock_path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

fn open_lock_file(lock_path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
}

fn try_lock(file: &File) -> io::Result<()> {
    match file.try_lock() {
        Ok(()) => Ok(()),
        Err(TryLockError::WouldBlock) => Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "lock would block",
        )),
        Err(TryLockError::Error(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn identifier(value: &str) -> ResourceIdentifier {
        ResourceIdentifier::parse(value).unwrap()
    }

    #[test]
    fn default_options_are_non_blocking() {
        let options = AcquireOptions::default();
        assert!(!options.is_blocking());
        assert_eq!(options.timeout, LockTimeoutValue::from_secs(30));
        assert!(!options.delete_on_release);
    }

    #[test]
    fn zero_poll_interval_is_non_blocking() {
        let options = AcquireOptions::polling(Duration::ZERO, LockTimeoutValue::Infinite);
        assert_eq!(options.effective_poll_interval(), None);
    }

    #[test]
    fn creates_missing_lock_file_without_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh.lock");

        let file = lock_exclusive(&identifier("fresh"), &path, &AcquireOptions::default()).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        drop(file);
    }

    #[test]
    fn does_not_truncate_existing_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kept.lock");
        std::fs::write(&path, "1700000000.000000").unwrap();

        let file = lock_exclusive(&identifier("kept"), &path, &AcquireOptions::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1700000000.000000");
        drop(file);
    }

    #[test]
    fn non_blocking_attempt_reports_blocked() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("busy.lock");
        let holder = lock_exclusive(&identifier("busy"), &path, &AcquireOptions::default()).unwrap();

        let err = lock_exclusive(&identifier("busy"), &path, &AcquireOptions::default())
            .unwrap_err();
        match err {
            SemaphoreError::ConcurrentRequestBlocked { resource } => assert_eq!(resource, "busy"),
            other => panic!("Expected blocked error, got {other:?}"),
        }
        drop(holder);
    }

    #[test]
    fn polling_attempt_times_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("busy.lock");
        let holder = lock_exclusive(&identifier("busy"), &path, &AcquireOptions::default()).unwrap();

        let options = AcquireOptions::polling(
            Duration::from_millis(10),
            LockTimeoutValue::Finite(Duration::from_millis(50)),
        );
        let err = lock_exclusive(&identifier("busy"), &path, &options).unwrap_err();
        match err {
            SemaphoreError::ConcurrentRequestTimeout { waited_secs, .. } => {
                assert!(waited_secs >= 0.05);
            }
            other => panic!("Expected timeout error, got {other:?}"),
        }
        drop(holder);
    }

    #[test]
    fn missing_directory_reports_unavailable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("job.lock");

        let err =
            lock_exclusive(&identifier("job"), &path, &AcquireOptions::default()).unwrap_err();
        match err {
            SemaphoreError::LockFileUnavailable { path: reported, .. } => {
                assert_eq!(reported, path)
            }
            other => panic!("Expected unavailable error, got {other:?}"),
        }
    }
}
