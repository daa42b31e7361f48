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

use std::path::PathBuf;

const LOCK_FILE_EXTENSION: &str = "lock";
const DEFAULT_LOCKS_DIR: &str = "semaphore-emulator";

/// File name used for the lock file of a resource: `<identifier>.lock`.
pub fn lock_file_name(identifier: &str) -> String {
    format!("{identifier}.{LOCK_FILE_EXTENSION}")
}

/// Lock directory used when configuration does not name one.
pub fn default_locks_root() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOCKS_DIR)
}
