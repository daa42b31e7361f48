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

use crate::error::SemaphoreError;
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a SemaphoreError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a SemaphoreError) -> Self {
        let (suggestion, details) = match error {
            SemaphoreError::InvalidIdentifier(identifier) => {
                let suggestion = Some(
                    "Resource identifiers may only contain ASCII letters, digits, and underscores \
                     (e.g., 'job_42')."
                        .to_string(),
                );
                let details = if identifier.is_empty() {
                    Some("The identifier is empty.".to_string())
                } else {
                    Some(format!("Rejected identifier: {identifier:?}"))
                };
                (suggestion, details)
            }
            SemaphoreError::LockFileUnavailable { path, source } => {
                let suggestion = match source.kind() {
                    std::io::ErrorKind::PermissionDenied => Some(format!(
                        "Ensure the current user can create and write files in {}.",
                        path.parent()
                            .map(|parent| parent.display().to_string())
                            .unwrap_or_else(|| path.display().to_string())
                    )),
                    std::io::ErrorKind::NotFound => {
                        Some("Ensure the lock directory exists.".to_string())
                    }
                    _ => None,
                };
                let details = Some(format!("I/O error: {source}"));
                (suggestion, details)
            }
            SemaphoreError::ConcurrentRequestBlocked { resource } => {
                let suggestion = Some(
                    "Another process currently holds this resource. Try again later or configure \
                     a poll interval to wait for it."
                        .to_string(),
                );
                let details = Some(format!("Resource '{resource}' is locked."));
                (suggestion, details)
            }
            SemaphoreError::ConcurrentRequestTimeout {
                resource,
                waited_secs,
            } => {
                let suggestion = Some(
                    "The resource stayed busy for the whole timeout. Increase the timeout or set \
                     it to 'infinite' to wait without a bound."
                        .to_string(),
                );
                let details = Some(format!(
                    "Waited {waited_secs:.3}s for resource '{resource}'."
                ));
                (suggestion, details)
            }
            SemaphoreError::UnlockFailed { details, .. } => {
                let suggestion = Some(
                    "The lock state may be inconsistent. The operating system releases the lock \
                     when the process exits."
                        .to_string(),
                );
                (suggestion, Some(details.clone()))
            }
            SemaphoreError::DirectoryNotWritable(dir) => {
                let suggestion = if cfg!(unix) {
                    Some(format!("Grant write permission on the lock directory: {dir}"))
                } else {
                    Some(format!("Ensure the lock directory is not read-only: {dir}"))
                };
                (suggestion, None)
            }
            SemaphoreError::DirectoryNotReadable(dir) => {
                let suggestion = Some(format!(
                    "Grant read permission on the lock directory: {dir}"
                ));
                (suggestion, None)
            }
            SemaphoreError::ConfigError(msg) => {
                let suggestion = Some(
                    "Check semaphore.toml and the SEMAPHORE_LOCK_TIMEOUT environment variable."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            SemaphoreError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        Some("Check file permissions of the lock directory.".to_string())
                    }
                    std::io::ErrorKind::NotFound => Some(
                        "Ensure the file or directory exists and the path is correct.".to_string(),
                    ),
                    _ => None,
                };
                let details = Some(format!("I/O error: {io_err}"));
                (suggestion, details)
            }
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
