/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Control entry point in front of the [`TransmissionGate`].
//!
//! Models the device-file surface: a caller opens a [`Session`] (write-only,
//! optionally non-blocking) and issues verbs against it.  The only verb is
//! `transmit`, whose payload is a YAML-serialised [`CalendarTimestamp`]:
//!
//! ```text
//! open(write-only [, non-blocking]) ──► Session
//! dispatch("transmit", "year: 2021\nday_of_year: 1\nhour: 14\nminute: 5")
//! ```
//!
//! Unknown verbs are rejected before the payload is even parsed, so they can
//! never reach the encoder or the pin.

mod command;

pub use command::{Command, TRANSMIT};

use std::future::{self, Future};

use thiserror::Error;
use tracing::{info, warn};

use crate::gate::{errno, Status, TransmissionGate, TransmitError, TransmitReport};
use crate::pin::PinOutput;
use crate::timecode::CalendarTimestamp;

// ── Open flags ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Flags fixed for the lifetime of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    pub access: AccessMode,
    pub non_blocking: bool,
}

impl OpenFlags {
    pub fn write_only() -> Self {
        Self {
            access: AccessMode::WriteOnly,
            non_blocking: false,
        }
    }

    pub fn non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ControlError {
    /// The transmitter only accepts write-only sessions.
    #[error("{0:?} access is not supported, open write-only")]
    AccessMode(AccessMode),

    #[error("unknown command '{0}' (valid: transmit)")]
    UnknownCommand(String),

    /// Payload could not be read as a timestamp.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Transmit(#[from] TransmitError),
}

impl ControlError {
    /// Distinct Linux errno for every failure kind.
    pub fn errno(&self) -> i32 {
        match self {
            ControlError::AccessMode(_) => errno::EOPNOTSUPP,
            ControlError::UnknownCommand(_) => errno::ENOTTY,
            ControlError::MalformedPayload(_) => errno::EFAULT,
            ControlError::Transmit(e) => e.errno(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ControlError::AccessMode(_)
            | ControlError::UnknownCommand(_)
            | ControlError::MalformedPayload(_) => Status::FixInput,
            ControlError::Transmit(e) => e.status(),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One open handle on the transmitter.
///
/// The non-blocking preference is taken from the open flags and applied to
/// every request made through this session.
pub struct Session<'g, P: PinOutput> {
    gate: &'g TransmissionGate<P>,
    non_blocking: bool,
}

impl<'g, P: PinOutput> Session<'g, P> {
    /// # Errors
    /// [`ControlError::AccessMode`] unless `flags.access` is write-only.
    pub fn open(gate: &'g TransmissionGate<P>, flags: OpenFlags) -> Result<Self, ControlError> {
        if flags.access != AccessMode::WriteOnly {
            info!(access = ?flags.access, "Refusing open");
            return Err(ControlError::AccessMode(flags.access));
        }
        Ok(Self {
            gate,
            non_blocking: flags.non_blocking,
        })
    }

    pub fn is_non_blocking(&self) -> bool {
        self.non_blocking
    }

    /// Transmit `ts`, waiting for the gate unless the session is non-blocking.
    pub async fn transmit(&self, ts: &CalendarTimestamp) -> Result<TransmitReport, ControlError> {
        Ok(self.gate.submit(ts, self.non_blocking).await?)
    }

    /// Parse and run one verb.  `cancel` interrupts a blocking wait for the
    /// gate; it has no effect once the frame is playing.
    pub async fn dispatch<C>(
        &self,
        verb: &str,
        payload: &str,
        cancel: C,
    ) -> Result<TransmitReport, ControlError>
    where
        C: Future<Output = ()>,
    {
        match Command::parse(verb, payload)? {
            Command::Transmit(ts) => {
                info!(timestamp = %ts, non_blocking = self.non_blocking, "WWV_TRANSMIT");
                Ok(self
                    .gate
                    .submit_until(&ts, self.non_blocking, cancel)
                    .await?)
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch), but `stop` ends the request at any
    /// point, including mid-frame.  A playing frame is dropped, which
    /// deasserts the pin and releases the gate before this returns
    /// [`TransmitError::Interrupted`].
    pub async fn dispatch_abortable<S>(
        &self,
        verb: &str,
        payload: &str,
        stop: S,
    ) -> Result<TransmitReport, ControlError>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            outcome = self.dispatch(verb, payload, future::pending()) => outcome,
            () = stop => {
                warn!("Request stopped, pin deasserted");
                Err(TransmitError::Interrupted.into())
            }
        }
    }

    /// [`dispatch`](Self::dispatch) without a cancellation source.
    pub async fn dispatch_uncancellable(
        &self,
        verb: &str,
        payload: &str,
    ) -> Result<TransmitReport, ControlError> {
        self.dispatch(verb, payload, future::pending()).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;
    use crate::pin::RecordingPin;
    use crate::pulse::{Modulation, PulseTiming};
    use std::sync::Arc;

    const PAYLOAD: &str = "year: 2021\nday_of_year: 1\nhour: 14\nminute: 5\n";

    fn gate() -> (TransmissionGate<RecordingPin>, crate::pin::PinTrace) {
        let (pin, trace) = RecordingPin::new();
        (
            TransmissionGate::with_timing(pin, PulseTiming::default(), Modulation::Level),
            trace,
        )
    }

    // ── open ──────────────────────────────────────────────────────────────────

    #[test]
    fn read_access_is_refused() {
        let (gate, _) = gate();
        for access in [AccessMode::ReadOnly, AccessMode::ReadWrite] {
            let flags = OpenFlags {
                access,
                non_blocking: false,
            };
            let err = Session::open(&gate, flags).err().unwrap();
            assert!(matches!(err, ControlError::AccessMode(a) if a == access));
            assert_eq!(err.errno(), errno::EOPNOTSUPP);
        }
    }

    #[test]
    fn session_keeps_the_non_blocking_flag() {
        let (gate, _) = gate();
        let s = Session::open(&gate, OpenFlags::write_only().non_blocking(true)).unwrap();
        assert!(s.is_non_blocking());
    }

    // ── dispatch ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn transmit_verb_plays_a_frame() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();
        let report = s.dispatch_uncancellable(TRANSMIT, PAYLOAD).await.unwrap();
        assert_eq!(report.elapsed().as_secs(), 60);
        assert_eq!(trace.pulses().len(), 44);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_verb_never_touches_the_pin() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();
        let err = s.dispatch_uncancellable("reset", PAYLOAD).await.unwrap_err();
        assert!(matches!(err, ControlError::UnknownCommand(ref v) if v == "reset"));
        assert_eq!(err.errno(), errno::ENOTTY);
        assert!(trace.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_efault() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();
        let err = s
            .dispatch_uncancellable(TRANSMIT, "year: [not a number]")
            .await
            .unwrap_err();
        assert_eq!(err.errno(), errno::EFAULT);
        assert_eq!(err.status(), Status::FixInput);
        assert!(trace.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_payload_is_einval() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();
        let payload = "year: 2021\nday_of_year: 500\nhour: 0\nminute: 0\n";
        let err = s.dispatch_uncancellable(TRANSMIT, payload).await.unwrap_err();
        assert_eq!(err.errno(), errno::EINVAL);
        assert!(!trace.is_active());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn non_blocking_session_gets_eagain_while_busy() {
        let (gate, _trace) = gate();
        let gate = Arc::new(gate);
        let holder = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move {
                let s = Session::open(&*gate, OpenFlags::write_only())?;
                let report = s.dispatch_uncancellable(TRANSMIT, PAYLOAD).await?;
                Ok::<_, ControlError>(report)
            }
        });
        while gate.state() == GateState::Idle {
            tokio::task::yield_now().await;
        }

        let s = Session::open(&*gate, OpenFlags::write_only().non_blocking(true)).unwrap();
        let err = s.dispatch_uncancellable(TRANSMIT, PAYLOAD).await.unwrap_err();
        assert_eq!(err.errno(), errno::EAGAIN);
        assert_eq!(err.status(), Status::Retry);

        holder.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_dispatch_is_eintr() {
        let (gate, _trace) = gate();
        let gate = Arc::new(gate);
        let holder = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move {
                let ts = CalendarTimestamp::new(2021, 1, 14, 5);
                gate.submit(&ts, false).await
            }
        });
        while gate.state() == GateState::Idle {
            tokio::task::yield_now().await;
        }

        let s = Session::open(&*gate, OpenFlags::write_only()).unwrap();
        let cancel = tokio::time::sleep(std::time::Duration::from_millis(10));
        let err = s.dispatch(TRANSMIT, PAYLOAD, cancel).await.unwrap_err();
        assert_eq!(err.errno(), errno::EINTR);

        holder.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_frame_leaves_the_pin_idle() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();

        // 1.1 s in: inside the first zero-bit mark
        let stop = tokio::time::sleep(std::time::Duration::from_millis(1_100));
        let err = s.dispatch_abortable(TRANSMIT, PAYLOAD, stop).await.unwrap_err();

        assert_eq!(err.errno(), errno::EINTR);
        assert!(trace.events().iter().any(|e| e.active), "frame had started");
        assert!(!trace.is_active());
        assert_eq!(gate.state(), GateState::Idle);

        // gate is usable again straight away
        let report = s.dispatch_uncancellable(TRANSMIT, PAYLOAD).await.unwrap();
        assert_eq!(report.elapsed().as_secs(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn abortable_dispatch_completes_when_never_stopped() {
        let (gate, trace) = gate();
        let s = Session::open(&gate, OpenFlags::write_only()).unwrap();
        let stop = tokio::time::sleep(std::time::Duration::from_secs(120));
        s.dispatch_abortable(TRANSMIT, PAYLOAD, stop).await.unwrap();
        assert_eq!(trace.pulses().len(), 44);
    }
}
