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

//! Acquisition timestamps stored inside lock files.
//!
//! The holder of a lock overwrites the file with the wall-clock time of its
//! acquisition, formatted as decimal seconds since the Unix epoch with six
//! fractional digits (`1700000000.123456`). The next holder reads at most
//! [`READ_LIMIT`] bytes of that content before writing its own.

use chrono::Utc;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Maximum number of bytes consulted when reading a previous timestamp.
pub const READ_LIMIT: u64 = 15;

/// Current wall-clock time in seconds since the Unix epoch, microsecond precision.
pub fn now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub fn format(timestamp: f64) -> String {
    format!("{timestamp:.6}")
}

/// Parses lock file content. Empty or unparseable content yields `None`.
pub fn parse(raw: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?;
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if trimmed.is_empty() {
        return None;
    }

    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Reads the timestamp left by the previous holder from the start of `file`.
pub(crate) fn read_previous(file: &mut File) -> io::Result<Option<f64>> {
    file.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::with_capacity(READ_LIMIT as usize);
    Read::by_ref(file).take(READ_LIMIT).read_to_end(&mut raw)?;
    Ok(parse(&raw))
}

/// Replaces the whole content of `file` with `timestamp`.
pub(crate) fn write_current(file: &mut File, timestamp: f64) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(format(timestamp).as_bytes())?;
    file.flush()
}
