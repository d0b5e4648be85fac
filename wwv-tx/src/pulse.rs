/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pulse-timing primitives shared by the encoder and the transmission gate.
//!
//! A WWV frame is a run of one-second slots.  Each data slot starts with an
//! active *mark* whose length carries the symbol, followed by an idle
//! *space* for the rest of the second:
//!
//! ```text
//!            ┌──────┐
//! zero bit   │180 ms│______________________________ 820 ms
//!            ┌──────────────┐
//! one bit    │    480 ms    │______________________ 520 ms
//!            ┌──────────────────────┐
//! position   │        780 ms        │______________ 220 ms
//! ```
//!
//! Mark lengths are counted in 10 ms ticks.  With [`Modulation::Carrier`]
//! every tick is one period of a 100 Hz square wave; with
//! [`Modulation::Level`] the pin is simply held high for the whole mark.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ── WWV constants ─────────────────────────────────────────────────────────────

/// Length of one carrier tick.
pub const TICK_MS: u32 = 10;

/// Ticks in the mark of a `0` bit (180 ms).
pub const ZERO_TICKS: u32 = 18;

/// Ticks in the mark of a `1` bit (480 ms).
pub const ONE_TICKS: u32 = 48;

/// Ticks in the mark of a position-identifier pulse (780 ms).
pub const POSITION_TICKS: u32 = 78;

/// Every symbol occupies exactly one slot of wall time.
pub const SLOT_MS: u32 = 1_000;

/// Slack accepted per mark/space split when checking recorded traces.
pub const TIMING_TOLERANCE_MS: u64 = 5;

// ── PulseCommand ──────────────────────────────────────────────────────────────

/// One step of a transmission, replayed in order by the gate.
///
/// All durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseCommand {
    /// Pin active (or carrier on) for the given time.
    Mark(u32),
    /// Pin idle for the remainder of a symbol slot.
    Space(u32),
    /// Pin idle for whole slots that carry no symbol.
    Silence(u32),
}

impl PulseCommand {
    pub fn duration_ms(self) -> u32 {
        match self {
            PulseCommand::Mark(ms) | PulseCommand::Space(ms) | PulseCommand::Silence(ms) => ms,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms()))
    }

    /// `true` only for [`PulseCommand::Mark`].
    pub fn is_active(self) -> bool {
        matches!(self, PulseCommand::Mark(_))
    }
}

/// Nominal wall time of a pulse sequence.
pub fn total_duration_ms(pulses: &[PulseCommand]) -> u64 {
    pulses.iter().map(|p| u64::from(p.duration_ms())).sum()
}

// ── Modulation ────────────────────────────────────────────────────────────────

/// How a mark is rendered on the output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modulation {
    /// 100 Hz square wave: half a tick high, half a tick low, per tick.
    #[default]
    Carrier,
    /// Pin held high for the full mark.
    Level,
}

// ── PulseTiming ───────────────────────────────────────────────────────────────

/// Errors from [`PulseTiming::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("tick length must be non-zero")]
    ZeroTick,

    #[error("slot length must be non-zero")]
    ZeroSlot,

    /// A symbol's mark would fill (or overflow) its slot, leaving no falling
    /// edge for the receiver.
    #[error("{symbol} mark of {ticks} tick(s) x {tick_ms}ms does not fit in a {slot_ms}ms slot")]
    MarkExceedsSlot {
        symbol: &'static str,
        ticks: u32,
        tick_ms: u32,
        slot_ms: u32,
    },
}

/// Tick counts and slot length used to turn frame symbols into pulses.
///
/// The default is the WWV layout; the YAML config may override any field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PulseTiming {
    pub tick_ms: u32,
    pub zero_ticks: u32,
    pub one_ticks: u32,
    pub position_ticks: u32,
    pub slot_ms: u32,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            zero_ticks: ZERO_TICKS,
            one_ticks: ONE_TICKS,
            position_ticks: POSITION_TICKS,
            slot_ms: SLOT_MS,
        }
    }
}

impl PulseTiming {
    /// Check that every mark leaves a non-empty space in its slot.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.tick_ms == 0 {
            return Err(TimingError::ZeroTick);
        }
        if self.slot_ms == 0 {
            return Err(TimingError::ZeroSlot);
        }
        for (symbol, ticks) in [
            ("zero-bit", self.zero_ticks),
            ("one-bit", self.one_ticks),
            ("position", self.position_ticks),
        ] {
            let fits = ticks
                .checked_mul(self.tick_ms)
                .is_some_and(|active| active < self.slot_ms);
            if !fits {
                return Err(TimingError::MarkExceedsSlot {
                    symbol,
                    ticks,
                    tick_ms: self.tick_ms,
                    slot_ms: self.slot_ms,
                });
            }
        }
        Ok(())
    }

    /// Mark + space for a symbol whose mark lasts `ticks` ticks.
    ///
    /// The two durations always add up to `slot_ms` for a validated timing.
    pub fn slot(&self, ticks: u32) -> [PulseCommand; 2] {
        let active = ticks.saturating_mul(self.tick_ms).min(self.slot_ms);
        [
            PulseCommand::Mark(active),
            PulseCommand::Space(self.slot_ms - active),
        ]
    }

    /// `count` whole slots of silence.
    pub fn silence(&self, count: u32) -> PulseCommand {
        PulseCommand::Silence(count.saturating_mul(self.slot_ms))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_ms))
    }

    /// Half a tick: the high (and low) time of one carrier period.
    pub fn half_tick(&self) -> Duration {
        self.tick() / 2
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
