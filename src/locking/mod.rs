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

//! Named cross-process locks emulated with advisory file locks.

pub mod acquisition;
pub mod exit_hooks;
pub mod handle;
pub mod identifier;
pub mod manager;
pub mod timeout;
pub mod timestamp;

pub use acquisition::{AcquireOptions, DEFAULT_TIMEOUT_SECS};
pub use exit_hooks::{pending_exit_hooks, run_exit_hooks};
pub use handle::ResourceLock;
pub use identifier::ResourceIdentifier;
pub use manager::LockManager;
pub use timeout::{
    LockTimeoutResolution, LockTimeoutResolver, LockTimeoutSource, LockTimeoutValue,
    parse_timeout_override,
};
