/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Races several sessions for one transmitter and checks that their frames
//! never interleave on the pin.
//!
//! Example:
//!   contention-sim --virtual-time --senders 3
//!   contention-sim --virtual-time --senders 2 --nonblock

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use wwv_tx::control::{OpenFlags, Session};
use wwv_tx::gate::{Status, TransmissionGate, TransmitReport};
use wwv_tx::pin::{PinTrace, RecordingPin};
use wwv_tx::pulse::{Modulation, PulseTiming};
use wwv_tx::timecode::CalendarTimestamp;

// ── CLI argument definition ───────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "contention-sim",
    about = "Concurrent wwv-tx senders against one recording pin",
    long_about = None,
)]
struct Cli {
    /// Run on a paused tokio clock so each 60 s frame completes instantly.
    #[arg(long = "virtual-time", default_value_t = false)]
    virtual_time: bool,

    /// Number of sessions submitting at the same time.
    #[arg(short = 's', long = "senders", default_value_t = 2)]
    senders: usize,

    /// Open every session non-blocking; all but one should get EAGAIN.
    #[arg(short = 'n', long = "nonblock", default_value_t = false)]
    nonblock: bool,

    /// Drive the pin with the 100 Hz carrier instead of a level.
    #[arg(long = "carrier", default_value_t = false)]
    carrier: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.senders == 0 {
        bail!("--senders must be at least 1");
    }
    if cli.virtual_time {
        tokio::time::pause();
    }

    let ts = CalendarTimestamp::from_utc(&Utc::now());
    let modulation = if cli.carrier {
        Modulation::Carrier
    } else {
        Modulation::Level
    };

    info!(
        timestamp    = %ts,
        senders      = cli.senders,
        nonblock     = cli.nonblock,
        virtual_time = cli.virtual_time,
        modulation   = ?modulation,
        "Contention simulation starting"
    );

    let (pin, trace) = RecordingPin::new();
    let gate = Arc::new(TransmissionGate::with_timing(
        pin,
        PulseTiming::default(),
        modulation,
    ));

    // ── Spawn senders ─────────────────────────────────────────────────────────
    let mut handles = Vec::with_capacity(cli.senders);
    for id in 0..cli.senders {
        let gate = Arc::clone(&gate);
        let flags = OpenFlags::write_only().non_blocking(cli.nonblock);
        handles.push(tokio::spawn(async move {
            let session = Session::open(&*gate, flags)?;
            let result = session.transmit(&ts).await;
            match &result {
                Ok(report) => info!(
                    sender = id,
                    elapsed_ms = report.elapsed().as_millis() as u64,
                    "Frame done"
                ),
                Err(e) => warn!(sender = id, errno = e.errno(), "Frame refused: {e}"),
            }
            result
        }));
    }

    let mut reports = Vec::new();
    let mut refused = 0usize;
    for handle in handles {
        match handle.await? {
            Ok(report) => reports.push(report),
            Err(e) if e.status() == Status::Retry && cli.nonblock => refused += 1,
            Err(e) => return Err(e.into()),
        }
    }

    // ── Verify ────────────────────────────────────────────────────────────────
    check_serialised(&reports, &trace)?;
    if cli.nonblock && reports.len() + refused != cli.senders {
        bail!(
            "lost senders: {} ok + {} refused != {}",
            reports.len(),
            refused,
            cli.senders
        );
    }

    info!(
        transmitted = reports.len(),
        refused,
        edges = trace.len(),
        "No interleaving observed"
    );
    Ok(())
}

/// Every pair of reports is disjoint and every assert falls inside exactly
/// one report.
fn check_serialised(reports: &[TransmitReport], trace: &PinTrace) -> Result<()> {
    for (i, a) in reports.iter().enumerate() {
        for b in &reports[i + 1..] {
            if a.overlaps(b) {
                bail!("transmissions overlap: {a:?} and {b:?}");
            }
        }
    }

    for event in trace.events().into_iter().filter(|e| e.active) {
        let owners = reports.iter().filter(|r| r.covers(event.at)).count();
        if owners != 1 {
            bail!("pin asserted at {:?} inside {owners} transmissions", event.at);
        }
    }

    if trace.is_active() {
        bail!("pin left asserted after all senders finished");
    }
    Ok(())
}
