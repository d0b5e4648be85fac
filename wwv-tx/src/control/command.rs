/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use crate::timecode::CalendarTimestamp;

use super::ControlError;

/// Verb that transmits one frame.
pub const TRANSMIT: &str = "transmit";

/// A parsed control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Transmit(CalendarTimestamp),
}

impl Command {
    /// Match `verb` first, then decode `payload` for it.
    ///
    /// # Errors
    /// [`ControlError::UnknownCommand`] for any verb other than
    /// [`TRANSMIT`]; [`ControlError::MalformedPayload`] if the payload is
    /// not a YAML timestamp.  Range checks are left to the encoder.
    pub fn parse(verb: &str, payload: &str) -> Result<Self, ControlError> {
        match verb {
            TRANSMIT => serde_yaml::from_str(payload)
                .map(Command::Transmit)
                .map_err(|e| ControlError::MalformedPayload(e.to_string())),
            other => Err(ControlError::UnknownCommand(other.to_string())),
        }
    }
}
