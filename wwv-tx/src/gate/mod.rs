/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transmission gate: the single point of mutual exclusion in front of the
//! output pin.
//!
//! The pin lives *inside* the gate's async mutex, so the only way to drive it
//! is to hold the lock.  Holding the lock is represented by a private
//! `PinGuard`; dropping the guard deasserts the pin and releases the lock, so
//! every exit path (frame complete, bad timestamp, pin fault, or the
//! `submit` future being dropped mid-frame) ends with the pin idle and the
//! gate free.
//!
//! A pin other processes can reach carries a [`PinClaim`].  The gate takes
//! it right after its own lock, so the exclusion spans every gate on the
//! machine that drives the same line.  While the claim is held elsewhere the
//! gate never writes to the pin, not even to idle it.
//!
//! ```text
//!              acquire (free, or blocking wait)
//!   ┌──────┐ ─────────────────────────────────► ┌──────┐
//!   │ Idle │                                    │ Busy │
//!   └──────┘ ◄───────────────────────────────── └──────┘
//!      │ ▲        complete | invalid | fault
//!      └─┘ non-blocking while Busy → WouldBlock
//! ```
//!
//! # Example
//! ```rust,ignore
//! let gate = Arc::new(TransmissionGate::new(pin));
//! let report = gate.submit(&timestamp, false).await?;
//! ```

pub mod error;

pub use error::{errno, Status, TransmitError};

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::config::TransmitterConfig;
use crate::pin::{ClaimGuard, PinClaim, PinError, PinOutput};
use crate::pulse::{Modulation, PulseCommand, PulseTiming};
use crate::timecode::{self, CalendarTimestamp};

/// How often a blocked request retries a claim held by another process.
const CLAIM_POLL: Duration = Duration::from_millis(20);

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Busy,
}

/// Summary of a completed transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitReport {
    /// Pulse commands replayed.
    pub pulses: usize,
    /// When playback started (lock already held).
    pub started: Instant,
    /// When the last pulse finished.
    pub finished: Instant,
}

impl TransmitReport {
    pub fn elapsed(&self) -> Duration {
        self.finished - self.started
    }

    /// `true` if `at` falls inside this transmission.
    pub fn covers(&self, at: Instant) -> bool {
        at >= self.started && at <= self.finished
    }

    pub fn overlaps(&self, other: &TransmitReport) -> bool {
        self.started < other.finished && other.started < self.finished
    }
}

// ── TransmissionGate ──────────────────────────────────────────────────────────

/// Owns the pin and serialises every transmission on it.
///
/// Construct once and share by reference (or `Arc`) with every request
/// handler.
pub struct TransmissionGate<P: PinOutput> {
    pin: Mutex<P>,
    claim: Option<PinClaim>,
    busy: AtomicBool,
    timing: PulseTiming,
    modulation: Modulation,
}

impl TransmissionGate<Box<dyn PinOutput>> {
    /// Build a gate from configuration: validate timing, open the pin and
    /// drive it idle unless another process holds its claim.
    ///
    /// # Errors
    /// [`TransmitError::ResourceUnavailable`] if the timing is unusable, the
    /// pin backend cannot be opened or its claim cannot be checked.
    pub fn setup(config: &TransmitterConfig) -> Result<Self, TransmitError> {
        config
            .timing
            .validate()
            .map_err(|e| TransmitError::ResourceUnavailable(e.to_string()))?;
        let mut pin = config.pin.open()?;
        let claim = config.pin.claim();
        idle_unless_claimed(&mut pin, claim.as_ref())?;
        info!(
            pin = pin.label(),
            claim = ?claim.as_ref().map(PinClaim::path),
            modulation = ?config.modulation,
            "Transmitter initialised"
        );

        let gate = Self::with_timing(pin, config.timing, config.modulation);
        Ok(match claim {
            Some(claim) => gate.with_claim(claim),
            None => gate,
        })
    }
}

impl<P: PinOutput> TransmissionGate<P> {
    /// Gate with the standard WWV timing and 100 Hz carrier.
    pub fn new(pin: P) -> Self {
        Self::with_timing(pin, PulseTiming::default(), Modulation::default())
    }

    pub fn with_timing(pin: P, timing: PulseTiming, modulation: Modulation) -> Self {
        Self {
            pin: Mutex::new(pin),
            claim: None,
            busy: AtomicBool::new(false),
            timing,
            modulation,
        }
    }

    /// Also take `claim` for every transmission.
    pub fn with_claim(mut self, claim: PinClaim) -> Self {
        self.claim = Some(claim);
        self
    }

    pub fn timing(&self) -> &PulseTiming {
        &self.timing
    }

    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Whether a transmission through this gate holds the pin.  Never
    /// touches the lock; may be stale as soon as it returns.  A claim held
    /// by another process does not show here.
    pub fn state(&self) -> GateState {
        if self.busy.load(Ordering::Acquire) {
            GateState::Busy
        } else {
            GateState::Idle
        }
    }

    /// Transmit one frame for `ts`.
    ///
    /// With `non_blocking`, a busy gate is reported as
    /// [`TransmitError::WouldBlock`] straight away; otherwise the call waits
    /// for the current transmission to finish.  The wait cannot be
    /// cancelled; use [`submit_until`](Self::submit_until) for that.
    pub async fn submit(
        &self,
        ts: &CalendarTimestamp,
        non_blocking: bool,
    ) -> Result<TransmitReport, TransmitError> {
        self.submit_until(ts, non_blocking, future::pending()).await
    }

    /// Like [`submit`](Self::submit), but a blocking wait for the lock ends
    /// with [`TransmitError::Interrupted`] as soon as `cancel` completes.
    ///
    /// `cancel` is only watched while waiting.  Once the lock is held the
    /// frame plays to completion (or to a pin fault).
    pub async fn submit_until<C>(
        &self,
        ts: &CalendarTimestamp,
        non_blocking: bool,
        cancel: C,
    ) -> Result<TransmitReport, TransmitError>
    where
        C: Future<Output = ()>,
    {
        let mut guard = self.acquire(non_blocking, cancel).await?;

        info!(timestamp = %ts, pin = guard.pin.label(), "WWV transmit");

        let pulses = match timecode::build_with(ts, &self.timing) {
            Ok(pulses) => pulses,
            Err(e) => {
                warn!(timestamp = ?ts, error = %e, "Date values are not valid");
                return Err(e.into());
            }
        };

        guard.play(&pulses).await
    }

    /// Take the gate for good: deassert the pin and release it.
    ///
    /// Consuming `self` means no transmission can still hold the lock.  A
    /// pin claimed by another process is left to that process.
    pub fn shutdown(self) -> Result<(), TransmitError> {
        let mut pin = self.pin.into_inner();
        idle_unless_claimed(&mut pin, self.claim.as_ref())?;
        info!(pin = pin.label(), "Transmitter removed");
        Ok(())
    }

    async fn acquire<C>(
        &self,
        non_blocking: bool,
        cancel: C,
    ) -> Result<PinGuard<'_, P>, TransmitError>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let pin = if non_blocking {
            match self.pin.try_lock() {
                Ok(pin) => pin,
                Err(_) => {
                    info!("Transmitter busy, rejecting non-blocking request");
                    return Err(TransmitError::WouldBlock);
                }
            }
        } else {
            tokio::select! {
                biased;
                pin = self.pin.lock() => pin,
                () = &mut cancel => {
                    info!("Interrupted while waiting for the transmitter");
                    return Err(TransmitError::Interrupted);
                }
            }
        };

        let claim = match &self.claim {
            Some(claim) => Some(wait_for_claim(claim, non_blocking, cancel.as_mut()).await?),
            None => None,
        };

        self.busy.store(true, Ordering::Release);
        debug!("Transmitter acquired");
        Ok(PinGuard {
            pin,
            _claim: claim,
            busy: &self.busy,
            timing: self.timing,
            modulation: self.modulation,
        })
    }
}

/// Poll `claim` until it is free.  The caller already holds the gate's own
/// lock, so only other gates on the same line compete here.
async fn wait_for_claim<C>(
    claim: &PinClaim,
    non_blocking: bool,
    mut cancel: Pin<&mut C>,
) -> Result<ClaimGuard, TransmitError>
where
    C: Future<Output = ()>,
{
    loop {
        if let Some(held) = claim.try_acquire()? {
            return Ok(held);
        }
        if non_blocking {
            info!(
                claim = %claim.path().display(),
                "Pin in use by another transmitter, rejecting non-blocking request"
            );
            return Err(TransmitError::WouldBlock);
        }
        tokio::select! {
            biased;
            () = &mut cancel => {
                info!("Interrupted while waiting for the pin claim");
                return Err(TransmitError::Interrupted);
            }
            () = sleep(CLAIM_POLL) => {}
        }
    }
}

/// Deassert `pin` unless someone else holds its claim.
fn idle_unless_claimed<P: PinOutput>(
    pin: &mut P,
    claim: Option<&PinClaim>,
) -> Result<(), PinError> {
    let Some(claim) = claim else {
        return pin.set(false);
    };
    match claim.try_acquire()? {
        Some(_held) => pin.set(false),
        None => {
            info!(pin = pin.label(), "Pin claimed elsewhere, leaving it as is");
            Ok(())
        }
    }
}

// ── PinGuard ──────────────────────────────────────────────────────────────────

/// Exclusive hold on the pin for one transmission.
///
/// Fields drop after [`Drop::drop`] has deasserted the pin, so the claim
/// and the lock are released with the line already idle.
struct PinGuard<'a, P: PinOutput> {
    pin: MutexGuard<'a, P>,
    _claim: Option<ClaimGuard>,
    busy: &'a AtomicBool,
    timing: PulseTiming,
    modulation: Modulation,
}

impl<P: PinOutput> PinGuard<'_, P> {
    /// Replay `pulses` in real time.
    ///
    /// Every step sleeps until an absolute deadline measured from the start
    /// of the frame, so scheduling latency on one step is absorbed by the
    /// next instead of accumulating.
    async fn play(&mut self, pulses: &[PulseCommand]) -> Result<TransmitReport, TransmitError> {
        let started = Instant::now();
        let mut deadline = started;

        for (pulse_index, pulse) in pulses.iter().enumerate() {
            let fault = |source| TransmitError::PinFault {
                pulse_index,
                source,
            };
            match *pulse {
                PulseCommand::Mark(ms) => self.mark(&mut deadline, ms).await.map_err(fault)?,
                PulseCommand::Space(ms) | PulseCommand::Silence(ms) => {
                    self.pin.set(false).map_err(fault)?;
                    deadline += millis(ms);
                    sleep_until(deadline).await;
                }
            }
        }

        let finished = Instant::now();
        info!(
            pulses = pulses.len(),
            elapsed_ms = (finished - started).as_millis() as u64,
            "Frame complete"
        );

        Ok(TransmitReport {
            pulses: pulses.len(),
            started,
            finished,
        })
    }

    async fn mark(&mut self, deadline: &mut Instant, ms: u32) -> Result<(), PinError> {
        match self.modulation {
            Modulation::Level => {
                self.pin.set(true)?;
                *deadline += millis(ms);
                sleep_until(*deadline).await;
            }
            Modulation::Carrier => {
                let ticks = ms.checked_div(self.timing.tick_ms).unwrap_or(0);
                let half = self.timing.half_tick();
                for _ in 0..ticks {
                    self.pin.set(true)?;
                    *deadline += half;
                    sleep_until(*deadline).await;
                    self.pin.set(false)?;
                    *deadline += half;
                    sleep_until(*deadline).await;
                }
                // A partial tick at the end stays low.
                let rest = ms - ticks * self.timing.tick_ms;
                if rest > 0 {
                    *deadline += millis(rest);
                    sleep_until(*deadline).await;
                }
            }
        }
        Ok(())
    }
}

impl<P: PinOutput> Drop for PinGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.pin.set(false) {
            error!(error = %e, "Failed to deassert pin on release");
        }
        self.busy.store(false, Ordering::Release);
        debug!("Transmitter released");
    }
}

fn millis(ms: u32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinConfig;
    use crate::pin::{PinTrace, RecordingPin};
    use crate::pulse::TIMING_TOLERANCE_MS;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn ts(year: i32, doy: i32, hour: i32, minute: i32) -> CalendarTimestamp {
        CalendarTimestamp::new(year, doy, hour, minute)
    }

    fn level_gate() -> (Arc<TransmissionGate<RecordingPin>>, PinTrace) {
        let (pin, trace) = RecordingPin::new();
        let gate = TransmissionGate::with_timing(pin, PulseTiming::default(), Modulation::Level);
        (Arc::new(gate), trace)
    }

    fn spawn_submit(
        gate: &Arc<TransmissionGate<RecordingPin>>,
        ts: CalendarTimestamp,
    ) -> tokio::task::JoinHandle<Result<TransmitReport, TransmitError>> {
        let gate = Arc::clone(gate);
        tokio::spawn(async move { gate.submit(&ts, false).await })
    }

    /// Yield until the spawned transmission has taken the lock.
    async fn wait_until_busy(gate: &TransmissionGate<RecordingPin>) {
        while gate.state() == GateState::Idle {
            tokio::task::yield_now().await;
        }
    }

    fn close_to(actual: Duration, expected_ms: u64) -> bool {
        let actual = actual.as_millis() as u64;
        actual.abs_diff(expected_ms) <= TIMING_TOLERANCE_MS
    }

    // ── single transmission ───────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn frame_takes_one_minute_and_ends_idle() {
        let (gate, trace) = level_gate();
        let report = gate.submit(&ts(2021, 1, 14, 5), false).await.unwrap();

        assert!(close_to(report.elapsed(), 60_000));
        assert!(!trace.is_active());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn level_marks_have_wwv_lengths() {
        let (gate, trace) = level_gate();
        gate.submit(&ts(2021, 1, 14, 5), false).await.unwrap();

        let pulses = trace.pulses();
        // 44 data/position slots between the leading and trailing silence
        assert_eq!(pulses.len(), 44);
        for (rise, fall) in pulses {
            let width = (fall - rise).as_millis() as u64;
            assert!(
                [180, 480, 780].iter().any(|w| width.abs_diff(*w) <= TIMING_TOLERANCE_MS),
                "unexpected mark width {width}ms"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn carrier_mark_toggles_at_100hz() {
        let (pin, trace) = RecordingPin::new();
        let gate = TransmissionGate::new(pin);
        gate.submit(&ts(2021, 1, 14, 5), false).await.unwrap();

        let pulses = trace.pulses();
        // first carrier period of the first zero bit, one second in
        let (rise, fall) = pulses[0];
        assert_eq!(fall - rise, Duration::from_millis(5));
        assert_eq!(pulses[1].0 - rise, Duration::from_millis(10));
        // 18 periods make up the first zero-bit mark
        let first_bit = pulses
            .iter()
            .filter(|(r, _)| *r < rise + Duration::from_secs(1));
        assert_eq!(first_bit.count(), 18);
    }

    // ── invalid input ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn invalid_input_releases_lock_without_asserting() {
        let (gate, trace) = level_gate();
        let err = gate.submit(&ts(2021, 500, 0, 0), false).await.unwrap_err();

        assert!(matches!(err, TransmitError::InvalidInput(_)));
        assert!(trace.events().iter().all(|e| !e.active));
        assert_eq!(gate.state(), GateState::Idle);
    }

    // ── contention ────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn non_blocking_submit_while_busy_would_block() {
        let (gate, trace) = level_gate();
        let holder = spawn_submit(&gate, ts(2021, 1, 14, 5));
        wait_until_busy(&gate).await;

        let before = Instant::now();
        let err = gate.submit(&ts(2021, 1, 14, 6), true).await.unwrap_err();
        assert!(matches!(err, TransmitError::WouldBlock));
        assert_eq!(Instant::now(), before, "non-blocking call must not wait");

        let report = holder.await.unwrap().unwrap();
        assert_eq!(trace.pulses().len(), 44, "held frame must be intact");
        assert!(close_to(report.elapsed(), 60_000));
    }

    #[tokio::test(start_paused = true)]
    async fn non_blocking_submit_on_idle_gate_transmits() {
        let (gate, _trace) = level_gate();
        assert!(gate.submit(&ts(2021, 1, 0, 0), true).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_is_interrupted_without_pin_activity() {
        let (gate, trace) = level_gate();
        let holder = spawn_submit(&gate, ts(2021, 1, 14, 5));
        wait_until_busy(&gate).await;

        let cancel = tokio::time::sleep(Duration::from_secs(3));
        let err = gate
            .submit_until(&ts(2021, 1, 14, 6), false, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TransmitError::Interrupted));
        assert_eq!(gate.state(), GateState::Busy, "holder keeps the lock");

        holder.await.unwrap().unwrap();
        assert_eq!(trace.pulses().len(), 44);
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_submits_are_serialised() {
        let (gate, trace) = level_gate();
        let a = spawn_submit(&gate, ts(2021, 1, 14, 5));
        let b = spawn_submit(&gate, ts(2021, 2, 14, 6));
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert!(!a.overlaps(&b));
        for e in trace.events() {
            assert!(a.covers(e.at) ^ b.covers(e.at) || !e.active);
        }
        assert_eq!(trace.pulses().len(), 88);
    }

    // ── faults and cancellation mid-frame ─────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn pin_fault_deasserts_and_releases() {
        let (pin, trace) = RecordingPin::failing_after(5);
        let gate = TransmissionGate::with_timing(pin, PulseTiming::default(), Modulation::Level);

        let err = gate.submit(&ts(2021, 1, 14, 5), false).await.unwrap_err();
        match err {
            TransmitError::PinFault { pulse_index, .. } => assert!(pulse_index > 0),
            other => panic!("expected PinFault, got {other:?}"),
        }
        assert!(!trace.is_active());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_submit_mid_frame_deasserts_and_releases() {
        let (gate, trace) = level_gate();
        let holder = spawn_submit(&gate, ts(2021, 1, 14, 5));
        // 1.1 s in: inside the first zero-bit mark
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(trace.is_active());

        holder.abort();
        assert!(holder.await.unwrap_err().is_cancelled());
        assert!(!trace.is_active());
        assert_eq!(gate.state(), GateState::Idle);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn shutdown_deasserts_the_pin() {
        let (pin, trace) = RecordingPin::new();
        let gate = TransmissionGate::new(pin);
        gate.shutdown().unwrap();
        assert_eq!(trace.len(), 1);
        assert!(!trace.is_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn polling_state_never_fails_a_non_blocking_submit() {
        let (gate, _trace) = level_gate();
        let done = Arc::new(AtomicBool::new(false));
        let poller = {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            tokio::task::spawn_blocking(move || {
                while !done.load(Ordering::Relaxed) {
                    let _ = gate.state();
                }
            })
        };

        // an invalid timestamp still takes and releases the lock
        for _ in 0..2_000 {
            let err = gate.submit(&ts(2021, 500, 0, 0), true).await.unwrap_err();
            assert!(matches!(err, TransmitError::InvalidInput(_)), "got {err:?}");
        }
        done.store(true, Ordering::Relaxed);
        poller.await.unwrap();
    }

    // ── setup ─────────────────────────────────────────────────────────────────

    fn sysfs_config(path: &Path) -> TransmitterConfig {
        TransmitterConfig {
            pin: PinConfig::Sysfs {
                path: path.to_path_buf(),
                active_low: false,
            },
            modulation: Modulation::Level,
            ..TransmitterConfig::default()
        }
    }

    fn setup_err(config: &TransmitterConfig) -> TransmitError {
        TransmissionGate::setup(config)
            .err()
            .expect("setup should have failed")
    }

    #[test]
    fn setup_with_missing_pin_is_resource_unavailable() {
        let err = setup_err(&sysfs_config(Path::new("/nonexistent/gpio4/value")));
        assert!(matches!(err, TransmitError::ResourceUnavailable(_)));
        assert_eq!(err.errno(), errno::ENODEV);
        assert_eq!(err.status(), Status::Unusable);
    }

    #[test]
    fn setup_with_invalid_timing_is_resource_unavailable() {
        let config = TransmitterConfig {
            timing: PulseTiming {
                position_ticks: 100,
                ..PulseTiming::default()
            },
            ..TransmitterConfig::default()
        };
        let err = setup_err(&config);
        assert!(matches!(err, TransmitError::ResourceUnavailable(ref m) if m.contains("position")));
        assert_eq!(err.errno(), errno::ENODEV);
        assert_eq!(err.status(), Status::Unusable);
    }

    #[test]
    fn setup_idles_a_free_pin() {
        let value = NamedTempFile::new().unwrap();
        std::fs::write(value.path(), "1").unwrap();
        let _gate = TransmissionGate::setup(&sysfs_config(value.path())).unwrap();
        assert_eq!(std::fs::read_to_string(value.path()).unwrap(), "0");
    }

    #[test]
    fn setup_and_shutdown_leave_a_claimed_pin_alone() {
        let value = NamedTempFile::new().unwrap();
        std::fs::write(value.path(), "1").unwrap();
        let other = PinClaim::new(value.path()).try_acquire().unwrap().unwrap();

        let gate = TransmissionGate::setup(&sysfs_config(value.path())).unwrap();
        assert_eq!(std::fs::read_to_string(value.path()).unwrap(), "1");
        gate.shutdown().unwrap();
        assert_eq!(std::fs::read_to_string(value.path()).unwrap(), "1");
        drop(other);
    }

    // ── gates sharing one pin ─────────────────────────────────────────────────

    fn claimed_gate(path: &Path) -> (Arc<TransmissionGate<RecordingPin>>, PinTrace) {
        let (pin, trace) = RecordingPin::new();
        let gate = TransmissionGate::with_timing(pin, PulseTiming::default(), Modulation::Level)
            .with_claim(PinClaim::new(path));
        (Arc::new(gate), trace)
    }

    #[tokio::test(start_paused = true)]
    async fn second_gate_on_the_same_pin_would_block() {
        let value = NamedTempFile::new().unwrap();
        let (a, a_trace) = claimed_gate(value.path());
        let (b, b_trace) = claimed_gate(value.path());

        let holder = spawn_submit(&a, ts(2021, 1, 14, 5));
        wait_until_busy(&a).await;

        let err = b.submit(&ts(2021, 1, 14, 6), true).await.unwrap_err();
        assert!(matches!(err, TransmitError::WouldBlock));
        assert_eq!(err.errno(), errno::EAGAIN);
        assert_eq!(b.state(), GateState::Idle);

        holder.await.unwrap().unwrap();
        assert_eq!(a_trace.pulses().len(), 44);
        assert!(b_trace.is_empty(), "refused gate must not touch its pin");

        // the claim goes with the finished frame
        b.submit(&ts(2021, 1, 14, 6), true).await.unwrap();
        assert_eq!(b_trace.pulses().len(), 44);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_gate_waits_for_the_claim_and_can_be_cancelled() {
        let value = NamedTempFile::new().unwrap();
        let (a, _a_trace) = claimed_gate(value.path());
        let (b, b_trace) = claimed_gate(value.path());

        let holder = spawn_submit(&a, ts(2021, 1, 14, 5));
        wait_until_busy(&a).await;

        let cancel = tokio::time::sleep(Duration::from_secs(3));
        let err = b
            .submit_until(&ts(2021, 1, 14, 6), false, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TransmitError::Interrupted));
        assert!(b_trace.is_empty());

        let b_report = b.submit(&ts(2021, 1, 14, 6), false).await.unwrap();
        let a_report = holder.await.unwrap().unwrap();
        assert!(!a_report.overlaps(&b_report));
        assert!(b_report.started >= a_report.finished);
        assert_eq!(b_trace.pulses().len(), 44);
    }
}
