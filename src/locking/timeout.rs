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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Represents the resolved timeout budget for lock acquisition.
///
/// A finite budget of zero behaves like [`LockTimeoutValue::Infinite`]: a
/// polling acquirer keeps waiting until the lock becomes free. In
/// configuration files the value is written as a string of whole seconds or
/// the word `infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LockTimeoutValue {
    Finite(Duration),
    Infinite,
}

impl LockTimeoutValue {
    pub const fn from_secs(seconds: u64) -> Self {
        Self::Finite(Duration::from_secs(seconds))
    }

    /// Maps the "zero or less means forever" convention of configuration files.
    pub const fn from_secs_or_infinite(seconds: u64) -> Self {
        if seconds == 0 {
            Self::Infinite
        } else {
            Self::from_secs(seconds)
        }
    }

    /// Upper bound on total polling time, or `None` when polling is unbounded.
    pub fn limit(&self) -> Option<Duration> {
        match self {
            LockTimeoutValue::Finite(duration) if !duration.is_zero() => Some(*duration),
            _ => None,
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.limit().is_none()
    }
}

impl fmt::Display for LockTimeoutValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit() {
            None => f.write_str("infinite"),
            Some(duration) if duration.subsec_nanos() == 0 => {
                write!(f, "{}s", duration.as_secs())
            }
            Some(duration) => write!(f, "{:.3}s", duration.as_secs_f64()),
        }
    }
}

impl TryFrom<String> for LockTimeoutValue {
    type Error = LockTimeoutParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_timeout_override(&value)
    }
}

impl From<LockTimeoutValue> for String {
    fn from(value: LockTimeoutValue) -> Self {
        match value.limit() {
            None => "infinite".to_string(),
            // Sub-second budgets round up so they never become "0" (infinite)
            Some(duration) => {
                let seconds = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
                seconds.to_string()
            }
        }
    }
}

/// Source precedence used when resolving the effective timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockTimeoutSource {
    #[default]
    Default,
    Config,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimeoutResolution {
    pub value: LockTimeoutValue,
    pub source: LockTimeoutSource,
}

impl fmt::Display for LockTimeoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LockTimeoutSource::Default => "built-in default",
            LockTimeoutSource::Config => "configuration file",
            LockTimeoutSource::Environment => "environment variable",
        };
        f.write_str(label)
    }
}

/// Error produced when parsing a timeout override fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTimeoutParseError {
    message: String,
}

impl fmt::Display for LockTimeoutParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LockTimeoutParseError {}

impl LockTimeoutParseError {
    fn invalid_value(value: &str) -> Self {
        Self {
            message: format!(
                "Lock timeout value '{value}' is invalid. Use an integer number of seconds or \
                 the word 'infinite'."
            ),
        }
    }
}

/// Parses a lock-timeout override value originating from the environment or configuration.
pub fn parse_timeout_override(value: &str) -> Result<LockTimeoutValue, LockTimeoutParseError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("infinite") {
        return Ok(LockTimeoutValue::Infinite);
    }

    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(LockTimeoutValue::from_secs_or_infinite(seconds));
    }

    Err(LockTimeoutParseError::invalid_value(trimmed))
}

/// Resolves the effective timeout value based on env > config > default precedence.
pub struct LockTimeoutResolver<'a> {
    env_override: Option<&'a str>,
    config_value: Option<LockTimeoutValue>,
    default_value: LockTimeoutValue,
}

impl<'a> LockTimeoutResolver<'a> {
    pub fn new(
        env_override: Option<&'a str>,
        config_value: Option<LockTimeoutValue>,
        default_value: LockTimeoutValue,
    ) -> Self {
        Self {
            env_override,
            config_value,
            default_value,
        }
    }

    pub fn resolve(self) -> Result<LockTimeoutResolution, LockTimeoutParseError> {
        if let Some(env_value) = self.env_override {
            let value = parse_timeout_override(env_value)?;
            return Ok(LockTimeoutResolution {
                value,
                source: LockTimeoutSource::Environment,
            });
        }

        if let Some(value) = self.config_value {
            return Ok(LockTimeoutResolution {
                value,
                source: LockTimeoutSource::Config,
            });
        }

        Ok(LockTimeoutResolution {
            value: self.default_value,
            source: LockTimeoutSource::Default,
        })
    }
}
