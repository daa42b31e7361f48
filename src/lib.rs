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

//! Cross-process named semaphores for hosts without native IPC primitives.
//!
//! Each resource is a `<identifier>.lock` file in a lock directory. Holding an
//! exclusive advisory lock on that file means holding the resource, and the
//! file records when it was last acquired so callers can rate-limit work.
//!
//! ```no_run
//! use semaphore_emulator::{AcquireOptions, LockManager};
//!
//! # fn main() -> semaphore_emulator::error::Result<()> {
//! let manager = LockManager::with_default_directory("/tmp/locks")?;
//! let mut lock = manager.obtain_lock("job_42", &AcquireOptions::default())?;
//! if lock.check_elapsed_time(60.0) {
//!     // at most once a minute
//! }
//! lock.release()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod locking;
pub mod logging;
pub mod paths;
pub mod platform;

pub use error::{Result, SemaphoreError};
pub use locking::{AcquireOptions, LockManager, LockTimeoutValue, ResourceLock};
pub use platform::{FsLockDirectory, LockDirectory};
