//! Transmitter configuration loading.
//!
//! The expected YAML structure is (every key optional):
//! ```yaml
//! pin:
//!   backend: sysfs            # sysfs | trace
//!   path: /sys/class/gpio/gpio4/value
//!   active_low: false
//! timing:
//!   tick_ms: 10
//!   zero_ticks: 18
//!   one_ticks: 48
//!   position_ticks: 78
//!   slot_ms: 1000
//! modulation: carrier         # carrier | level
//! ```
//!
//! Without a file the transmitter runs as a dry run on a [`TracePin`] with the
//! standard WWV timing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::pin::{PinClaim, PinError, PinOutput, SysfsPin, TracePin};
use crate::pulse::{Modulation, PulseTiming};

// ── Pin backend ───────────────────────────────────────────────────────────────

/// Which [`PinOutput`] backend carries the signal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum PinConfig {
    /// GPIO `value` file, e.g. `/sys/class/gpio/gpio4/value`.
    Sysfs {
        path: PathBuf,
        #[serde(default)]
        active_low: bool,
    },
    /// Log edges only.
    Trace {
        #[serde(default = "default_trace_label")]
        label: String,
    },
}

fn default_trace_label() -> String {
    String::from("wwv")
}

impl Default for PinConfig {
    fn default() -> Self {
        PinConfig::Trace {
            label: default_trace_label(),
        }
    }
}

impl PinConfig {
    /// Open the configured backend.  The line is not driven yet.
    pub fn open(&self) -> Result<Box<dyn PinOutput>, PinError> {
        match self {
            PinConfig::Sysfs { path, active_low } => {
                Ok(Box::new(SysfsPin::open(path, *active_low)?))
            }
            PinConfig::Trace { label } => Ok(Box::new(TracePin::new(label.clone()))),
        }
    }

    /// Machine-wide lock for backends other processes can drive, keyed to
    /// the GPIO value file.
    pub fn claim(&self) -> Option<PinClaim> {
        match self {
            PinConfig::Sysfs { path, .. } => Some(PinClaim::new(path)),
            PinConfig::Trace { .. } => None,
        }
    }
}

// ── TransmitterConfig ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransmitterConfig {
    pub pin: PinConfig,
    pub timing: PulseTiming,
    pub modulation: Modulation,
}

impl TransmitterConfig {
    /// Parse `path` and check the timing.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, or the timing does not fit in a slot.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading transmitter configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config: TransmitterConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        config
            .timing
            .validate()
            .with_context(|| format!("Invalid timing in {}", path.display()))?;

        debug!(
            pin = ?config.pin,
            timing = ?config.timing,
            modulation = ?config.modulation,
            "Transmitter configuration"
        );

        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
