/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! WWV time-code encoder.
//!
//! Pure transformation from a [`CalendarTimestamp`] to the ordered list of
//! [`PulseCommand`]s for one minute frame.  No pin, clock or lock is touched
//! here; the same timestamp always yields the same sequence.
//!
//! # Frame layout
//!
//! Every slot is one second.  BCD fields are sent least-significant bit
//! first; `P` is a position-identifier pulse.
//!
//! ```text
//! s  0      silence
//! s  1- 9   0 0 0 | year units (4)          | 0 | P
//! s 10-19   minute units (4) | 0 | minute tens (3) | 0 | P
//! s 20-29   hour units (4)   | 0 | hour tens (3)   | 0 | P
//! s 30-39   day units (4)    | 0 | day tens (4)    | P
//! s 40-44   day hundreds (2) | 0 0 0
//! s 45-49   silence
//! s 50-59   silence
//! ```

mod timestamp;

pub use timestamp::{CalendarTimestamp, TimestampField, ValidationError};

use tracing::debug;

use crate::pulse::{PulseCommand, PulseTiming};

/// Number of one-second slots in a frame.
pub const FRAME_SLOTS: u32 = 60;

// ── EncodedFrame ──────────────────────────────────────────────────────────────

/// Decimal digits of a validated timestamp, one field per BCD group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    pub year_low_digit: u8,
    pub minute_ones: u8,
    pub minute_tens: u8,
    pub hour_ones: u8,
    pub hour_tens: u8,
    pub doy_ones: u8,
    pub doy_tens: u8,
    pub doy_hundreds: u8,
}

/// What a single slot of the frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSymbol {
    Bit(bool),
    PositionId,
    /// Idle for this many consecutive slots.
    Silence(u32),
}

impl FrameSymbol {
    /// Slots of wall time this symbol occupies.
    pub fn slots(self) -> u32 {
        match self {
            FrameSymbol::Silence(n) => n,
            FrameSymbol::Bit(_) | FrameSymbol::PositionId => 1,
        }
    }

    /// Pulses that realise this symbol under `timing`.
    pub fn pulses(self, timing: &PulseTiming) -> Vec<PulseCommand> {
        match self {
            FrameSymbol::Bit(false) => timing.slot(timing.zero_ticks).to_vec(),
            FrameSymbol::Bit(true) => timing.slot(timing.one_ticks).to_vec(),
            FrameSymbol::PositionId => timing.slot(timing.position_ticks).to_vec(),
            FrameSymbol::Silence(n) => vec![timing.silence(n)],
        }
    }
}

impl EncodedFrame {
    /// Validate `ts` and split it into digits.
    ///
    /// # Errors
    /// [`ValidationError::OutOfRange`] if minute, hour or day of year is out
    /// of range.  No digits are produced in that case.
    pub fn from_timestamp(ts: &CalendarTimestamp) -> Result<Self, ValidationError> {
        ts.validate()?;

        // Ranges are checked above, so every quotient and remainder below is
        // a single non-negative decimal digit.
        let digit = |v: i32| v as u8;
        let frame = Self {
            year_low_digit: digit(ts.year.rem_euclid(10)),
            minute_ones: digit(ts.minute % 10),
            minute_tens: digit(ts.minute / 10),
            hour_ones: digit(ts.hour % 10),
            hour_tens: digit(ts.hour / 10),
            doy_ones: digit(ts.day_of_year % 10),
            doy_tens: digit((ts.day_of_year % 100) / 10),
            doy_hundreds: digit(ts.day_of_year / 100),
        };

        debug!(
            year = frame.year_low_digit,
            min = ?(frame.minute_tens, frame.minute_ones),
            hour = ?(frame.hour_tens, frame.hour_ones),
            day = ?(frame.doy_hundreds, frame.doy_tens, frame.doy_ones),
            "Decomposed timestamp"
        );

        Ok(frame)
    }

    /// The 60 slots of the frame as symbols, in transmission order.
    pub fn symbols(&self) -> Vec<FrameSymbol> {
        let mut w = SymbolWriter::default();

        w.silence(1);

        // Segment 1: year
        w.zeros(3);
        w.bcd(self.year_low_digit, 4);
        w.zeros(1);
        w.position();

        // Segment 2: minutes
        w.bcd(self.minute_ones, 4);
        w.zeros(1);
        w.bcd(self.minute_tens, 3);
        w.zeros(1);
        w.position();

        // Segment 3: hours
        w.bcd(self.hour_ones, 4);
        w.zeros(1);
        w.bcd(self.hour_tens, 3);
        w.zeros(1);
        w.position();

        // Segment 4: day of year, units and tens
        w.bcd(self.doy_ones, 4);
        w.zeros(1);
        w.bcd(self.doy_tens, 4);
        w.position();

        // Segment 5: day of year, hundreds
        w.bcd(self.doy_hundreds, 2);
        w.zeros(3);
        w.silence(5);

        // Closing silence
        w.silence(10);

        w.symbols
    }

    /// Render the frame with `timing`.
    pub fn pulses(&self, timing: &PulseTiming) -> Vec<PulseCommand> {
        self.symbols()
            .into_iter()
            .flat_map(|symbol| symbol.pulses(timing))
            .collect()
    }
}

#[derive(Default)]
struct SymbolWriter {
    symbols: Vec<FrameSymbol>,
}

impl SymbolWriter {
    fn bcd(&mut self, value: u8, width: u32) {
        debug_assert!(u32::from(value) < (1 << width), "{value} overflows {width} bits");
        for i in 0..width {
            self.symbols.push(FrameSymbol::Bit(value & (1 << i) != 0));
        }
    }

    fn zeros(&mut self, count: u32) {
        self.bcd(0, count);
    }

    fn position(&mut self) {
        self.symbols.push(FrameSymbol::PositionId);
    }

    fn silence(&mut self, slots: u32) {
        self.symbols.push(FrameSymbol::Silence(slots));
    }
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Encode `ts` with the standard WWV timing.
///
/// # Errors
/// [`ValidationError`] if the timestamp is out of range; nothing is encoded.
pub fn build(ts: &CalendarTimestamp) -> Result<Vec<PulseCommand>, ValidationError> {
    build_with(ts, &PulseTiming::default())
}

/// Encode `ts` with a custom [`PulseTiming`].
pub fn build_with(
    ts: &CalendarTimestamp,
    timing: &PulseTiming,
) -> Result<Vec<PulseCommand>, ValidationError> {
    Ok(EncodedFrame::from_timestamp(ts)?.pulses(timing))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
