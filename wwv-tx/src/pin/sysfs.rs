/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! GPIO line driven through its sysfs `value` attribute.
//!
//! Exporting the line and setting its direction are done outside this
//! process (udev rule, init script); this backend only opens the value file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::{PinError, PinOutput};

#[derive(Debug)]
pub struct SysfsPin {
    path: PathBuf,
    label: String,
    file: File,
    active_low: bool,
}

impl SysfsPin {
    /// Open `path` for writing.  The line is left as it is: another process
    /// may be transmitting on it, so only a claim holder drives it.
    ///
    /// # Errors
    /// [`PinError::Open`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, active_low: bool) -> Result<Self, PinError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|source| PinError::Open {
                path: path.clone(),
                source,
            })?;

        let pin = Self {
            label: path.display().to_string(),
            path,
            file,
            active_low,
        };

        info!(path = %pin.path.display(), active_low, "GPIO pin acquired");
        Ok(pin)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PinOutput for SysfsPin {
    fn set(&mut self, active: bool) -> Result<(), PinError> {
        let level = if active != self.active_low { b"1" } else { b"0" };
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(level))
            .map_err(|source| PinError::Write {
                label: self.label.clone(),
                active,
                source,
            })
    }

    fn label(&self) -> &str {
        &self.label
    }
}
