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
use crate::paths::locking::lock_file_name;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// ASCII word characters only, matching the lock file naming rules.
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid resource identifier regex"));

/// Validated name of the logical resource a lock serializes access to.
///
/// Only ASCII letters, digits, and underscores are accepted, so the name is
/// always safe to use as a file stem inside the lock directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    pub fn parse(value: &str) -> Result<Self> {
        if IDENTIFIER_REGEX.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SemaphoreError::InvalidIdentifier(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the lock file backing this resource.
    pub fn lock_file_name(&self) -> String {
        lock_file_name(&self.0)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
