/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Binary output pin that carries the time code.
//!
//! The gate only ever sees a [`PinOutput`]; how the line is found and
//! claimed is left to the backend:
//!
//! * [`SysfsPin`]: writes `0`/`1` to a GPIO `value` file.
//! * [`TracePin`]: logs edges, drives nothing (dry run).
//! * [`RecordingPin`]: keeps a timestamped trace for tests and simulators.
//!
//! A pin that other processes can reach also comes with a [`PinClaim`],
//! the machine-wide lock the gate takes for each transmission.

mod claim;
mod recording;
mod sysfs;

pub use claim::{ClaimGuard, PinClaim};
pub use recording::{PinEvent, PinTrace, RecordingPin};
pub use sysfs::SysfsPin;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::trace;

// ── PinOutput ─────────────────────────────────────────────────────────────────

/// A single binary actuator.
///
/// `&mut self` means only one caller can drive the pin at a time; the gate
/// keeps the pin inside its lock so that holder is always the current
/// transmission.
pub trait PinOutput: Send {
    /// Assert (`true`) or deassert (`false`) the line.
    fn set(&mut self, active: bool) -> Result<(), PinError>;

    /// Short name used in log lines.
    fn label(&self) -> &str {
        "pin"
    }
}

impl<P: PinOutput + ?Sized> PinOutput for Box<P> {
    fn set(&mut self, active: bool) -> Result<(), PinError> {
        (**self).set(active)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PinError {
    /// The backend could not claim the line at all.
    #[error("cannot open GPIO value file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The machine-wide claim could not be checked.
    #[error("cannot lock {}: {source}", .path.display())]
    Claim {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A level change did not reach the hardware.
    #[error("failed to drive {label} {}: {source}", level_name(.active))]
    Write {
        label: String,
        active: bool,
        #[source]
        source: io::Error,
    },

    /// Fault reported by a backend without an underlying I/O error.
    #[error("{label}: {reason}")]
    Fault { label: String, reason: String },
}

fn level_name(active: &bool) -> &'static str {
    if *active {
        "high"
    } else {
        "low"
    }
}

// ── TracePin ──────────────────────────────────────────────────────────────────

/// Dry-run backend: every edge becomes a `trace!` event.
#[derive(Debug)]
pub struct TracePin {
    label: String,
    level: bool,
    edges: u64,
}

impl TracePin {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            level: false,
            edges: 0,
        }
    }

    /// Number of level changes seen so far.
    pub fn edges(&self) -> u64 {
        self.edges
    }

    pub fn is_active(&self) -> bool {
        self.level
    }
}

impl PinOutput for TracePin {
    fn set(&mut self, active: bool) -> Result<(), PinError> {
        if active != self.level {
            self.edges += 1;
            trace!(pin = %self.label, active, "edge");
        }
        self.level = active;
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
