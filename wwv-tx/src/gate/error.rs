/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Errors returned by [`TransmissionGate::submit`](super::TransmissionGate::submit).
//!
//! Every variant maps to a distinct Linux errno so the control entry point
//! can hand the caller the same status a character device would:
//!
//! | Variant | errno | [`Status`] |
//! |---|---|---|
//! | `WouldBlock` | `EAGAIN` | `Retry` |
//! | `Interrupted` | `EINTR` | `Retry` |
//! | `InvalidInput` | `EINVAL` | `FixInput` |
//! | `ResourceUnavailable` | `ENODEV` | `Unusable` |
//! | `PinFault` | `EIO` | `Unusable` |

use thiserror::Error;

use crate::pin::PinError;
use crate::timecode::ValidationError;

/// Linux errno values used as exit statuses.
pub mod errno {
    pub const EINTR: i32 = 4;
    pub const EIO: i32 = 5;
    pub const EAGAIN: i32 = 11;
    pub const EFAULT: i32 = 14;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;
    pub const EOPNOTSUPP: i32 = 95;
}

/// What the caller can do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing happened; submitting again later may succeed.
    Retry,
    /// The request itself is wrong.
    FixInput,
    /// The transmitter cannot be used.
    Unusable,
}

#[derive(Debug, Error)]
pub enum TransmitError {
    /// Non-blocking request found a transmission in progress.
    #[error("transmitter is busy")]
    WouldBlock,

    /// Cancelled while waiting for the transmitter; the pin was not touched.
    #[error("interrupted while waiting for the transmitter")]
    Interrupted,

    /// Timestamp rejected after the lock was taken.  The lock is already
    /// released when this is returned.
    #[error("invalid timestamp: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The pin or lock could not be set up.
    #[error("transmitter unavailable: {0}")]
    ResourceUnavailable(String),

    /// The pin failed while the frame was being played.  The rest of the
    /// frame is discarded.
    #[error("pin fault at pulse {pulse_index}: {source}")]
    PinFault {
        pulse_index: usize,
        #[source]
        source: PinError,
    },
}

impl TransmitError {
    pub fn errno(&self) -> i32 {
        match self {
            TransmitError::WouldBlock => errno::EAGAIN,
            TransmitError::Interrupted => errno::EINTR,
            TransmitError::InvalidInput(_) => errno::EINVAL,
            TransmitError::ResourceUnavailable(_) => errno::ENODEV,
            TransmitError::PinFault { .. } => errno::EIO,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            TransmitError::WouldBlock | TransmitError::Interrupted => Status::Retry,
            TransmitError::InvalidInput(_) => Status::FixInput,
            TransmitError::ResourceUnavailable(_) | TransmitError::PinFault { .. } => {
                Status::Unusable
            }
        }
    }
}

impl From<PinError> for TransmitError {
    /// A pin that fails before any frame is played was never usable.
    fn from(err: PinError) -> Self {
        TransmitError::ResourceUnavailable(err.to_string())
    }
}
