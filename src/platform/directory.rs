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

use crate::error::Result;
use log::debug;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Directory that holds lock files.
pub trait LockDirectory: Send + Sync + fmt::Debug {
    /// Root of the directory, used for diagnostics.
    fn root(&self) -> &Path;

    /// Full path of `file_name` inside the directory.
    fn resolve(&self, file_name: &str) -> PathBuf {
        self.root().join(file_name)
    }

    fn is_writable(&self) -> bool;

    fn is_readable(&self) -> bool;
}

/// Lock directory backed by a real filesystem path.
#[derive(Debug, Clone)]
pub struct FsLockDirectory {
    root: PathBuf,
}

impl FsLockDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Creates the directory and any missing parents.
    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

impl LockDirectory for FsLockDirectory {
    fn root(&self) -> &Path {
        &self.root
    }

    fn is_writable(&self) -> bool {
        if !self.root.is_dir() {
            return false;
        }

        // Probe with a uniquely named file so concurrent probes never collide
        let probe = self
            .root
            .join(format!(".semaphore-probe-{}", uuid::Uuid::new_v4()));
        match OpenOptions::new().write(true).create_new(true).open(&probe) {
            Ok(file) => {
                drop(file);
                let _ = fs::remove_file(&probe);
                true
            }
            Err(err) => {
                debug!("Write probe failed in {}: {err}", self.root.display());
                false
            }
        }
    }

    fn is_readable(&self) -> bool {
        match fs::read_dir(&self.root) {
            Ok(_) => true,
            Err(err) => {
                debug!("Cannot list {}: {err}", self.root.display());
                false
            }
        }
    }
}
