/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! In-memory pin that records every `set` with a timestamp.
//!
//! The pin itself moves into the gate; the paired [`PinTrace`] handle stays
//! with the caller so the trace can be inspected while (or after) the gate
//! drives the pin.  Timestamps come from [`tokio::time::Instant`], so they
//! follow the paused clock in tests.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use super::{PinError, PinOutput};

/// One `set` call as seen by the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub at: Instant,
    pub active: bool,
}

type Shared = Arc<Mutex<Vec<PinEvent>>>;

fn lock(events: &Shared) -> MutexGuard<'_, Vec<PinEvent>> {
    events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── RecordingPin ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RecordingPin {
    events: Shared,
    /// Fail every assert after this many successful asserts.
    fail_after: Option<usize>,
    asserts: usize,
}

impl RecordingPin {
    /// A new pin and the handle that reads its trace.
    pub fn new() -> (Self, PinTrace) {
        let events = Shared::default();
        let pin = Self {
            events: Arc::clone(&events),
            fail_after: None,
            asserts: 0,
        };
        (pin, PinTrace { events })
    }

    /// Like [`new`](Self::new), but every assert after the first `n` fails.
    ///
    /// Deasserts keep succeeding, so the unwind path can still be observed.
    pub fn failing_after(n: usize) -> (Self, PinTrace) {
        let (mut pin, trace) = Self::new();
        pin.fail_after = Some(n);
        (pin, trace)
    }
}

impl PinOutput for RecordingPin {
    fn set(&mut self, active: bool) -> Result<(), PinError> {
        if active {
            if self.fail_after.is_some_and(|n| self.asserts >= n) {
                return Err(PinError::Fault {
                    label: self.label().to_string(),
                    reason: format!("injected fault after {} assert(s)", self.asserts),
                });
            }
            self.asserts += 1;
        }
        lock(&self.events).push(PinEvent {
            at: Instant::now(),
            active,
        });
        Ok(())
    }

    fn label(&self) -> &str {
        "recording"
    }
}

// ── PinTrace ──────────────────────────────────────────────────────────────────

/// Read side of a [`RecordingPin`].
#[derive(Debug, Clone)]
pub struct PinTrace {
    events: Shared,
}

impl PinTrace {
    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<PinEvent> {
        lock(&self.events).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    /// Level after the last `set`; idle if the pin was never driven.
    pub fn is_active(&self) -> bool {
        lock(&self.events).last().is_some_and(|e| e.active)
    }

    /// Events with `start <= at <= end`.
    pub fn between(&self, start: Instant, end: Instant) -> Vec<PinEvent> {
        lock(&self.events)
            .iter()
            .filter(|e| e.at >= start && e.at <= end)
            .copied()
            .collect()
    }

    /// `(rise, fall)` pairs of every assert that was later deasserted.
    pub fn pulses(&self) -> Vec<(Instant, Instant)> {
        let mut out = Vec::new();
        let mut rise = None;
        for e in lock(&self.events).iter() {
            match (e.active, rise) {
                (true, None) => rise = Some(e.at),
                (false, Some(r)) => {
                    out.push((r, e.at));
                    rise = None;
                }
                _ => {}
            }
        }
        out
    }
}
