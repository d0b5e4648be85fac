/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::future::{self, Future};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{error, info, warn};

use wwv_tx::config::TransmitterConfig;
use wwv_tx::control::{ControlError, OpenFlags, Session, TRANSMIT};
use wwv_tx::gate::{TransmissionGate, TransmitError};
use wwv_tx::pulse::{total_duration_ms, PulseCommand};
use wwv_tx::timecode::{CalendarTimestamp, EncodedFrame, FrameSymbol};

// ── CLI argument definition ───────────────────────────────────────────────────

/// WWV time-code transmitter.
///
/// Example:
///   wwv-tx --config wwv.yaml transmit --year 2021 --doy 1 --hour 14 --minute 5
///   wwv-tx encode --now
#[derive(Debug, Parser)]
#[command(
    name = "wwv-tx",
    about = "WWV time-code transmitter on a GPIO pin",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML transmitter configuration.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Fail with EAGAIN instead of waiting while another frame is on the air,
    /// from this process or any other driving the same pin.
    #[arg(short = 'n', long = "nonblock", global = true, default_value_t = false)]
    nonblock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Transmit one 60 s frame on the configured pin.
    Transmit(TimestampArgs),

    /// Print the frame layout and pulse train without touching any pin.
    Encode(TimestampArgs),

    /// Issue a raw control request: a verb and its YAML payload.
    Request {
        verb: String,
        payload: Option<String>,
    },
}

#[derive(Debug, Args)]
struct TimestampArgs {
    /// Use the current UTC time.  This is the default when no field is given.
    #[arg(long, conflicts_with_all = ["year", "doy", "hour", "minute"])]
    now: bool,

    #[arg(long, allow_negative_numbers = true)]
    year: Option<i32>,

    /// Day of year, 1-based for real dates.
    #[arg(long, allow_negative_numbers = true)]
    doy: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    hour: Option<i32>,

    #[arg(long, allow_negative_numbers = true)]
    minute: Option<i32>,
}

impl TimestampArgs {
    /// Values are passed through unchecked; range errors come from the encoder.
    fn resolve(&self) -> Result<CalendarTimestamp> {
        match (self.year, self.doy, self.hour, self.minute) {
            (None, None, None, None) => Ok(CalendarTimestamp::from_utc(&Utc::now())),
            (Some(year), Some(doy), Some(hour), Some(minute)) => {
                Ok(CalendarTimestamp::new(year, doy, hour, minute))
            }
            _ => bail!("--year, --doy, --hour and --minute must be given together"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config   = ?cli.config,
        nonblock = cli.nonblock,
        command  = ?cli.command,
        "wwv-tx starting up"
    );

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        // Control failures exit with their errno; anything else is a plain 1.
        let code = e.downcast_ref::<ControlError>().map_or(1, ControlError::errno);
        process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load transmitter configuration ────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => TransmitterConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using a trace pin with WWV timing");
            TransmitterConfig::default()
        }
    };

    match cli.command {
        Command::Encode(args) => print_schedule(&args.resolve()?, &config),
        Command::Transmit(args) => {
            let payload = serde_yaml::to_string(&args.resolve()?)?;
            request(&config, cli.nonblock, TRANSMIT, &payload).await
        }
        Command::Request { verb, payload } => {
            request(&config, cli.nonblock, &verb, payload.as_deref().unwrap_or("")).await
        }
    }
}

// ── Transmission ──────────────────────────────────────────────────────────────

async fn request(
    config: &TransmitterConfig,
    nonblock: bool,
    verb: &str,
    payload: &str,
) -> Result<()> {
    // Handlers go in before the pin is touched and stay until it is released.
    let stop = stop_signal();
    let gate = TransmissionGate::setup(config).map_err(ControlError::from)?;

    let outcome = {
        let session = Session::open(&gate, OpenFlags::write_only().non_blocking(nonblock))?;
        session.dispatch_abortable(verb, payload, stop).await
    };

    gate.shutdown().map_err(ControlError::from)?;

    let report = outcome?;
    info!(
        pulses     = report.pulses,
        elapsed_ms = report.elapsed().as_millis() as u64,
        "Frame transmitted"
    );
    Ok(())
}

/// Installs SIGINT and SIGTERM handlers immediately; the returned future
/// resolves on the first of them.
fn stop_signal() -> impl Future<Output = ()> {
    let mut interrupt = listen(SignalKind::interrupt(), "SIGINT");
    let mut terminate = listen(SignalKind::terminate(), "SIGTERM");
    async move {
        tokio::select! {
            () = next(&mut interrupt) => info!("SIGINT received"),
            () = next(&mut terminate) => info!("SIGTERM received"),
        }
    }
}

fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("Cannot listen for {name}: {e}");
            None
        }
    }
}

/// Never resolves for a signal that could not be watched.
async fn next(stream: &mut Option<Signal>) {
    match stream {
        Some(stream) => {
            stream.recv().await;
        }
        None => future::pending().await,
    }
}

// ── Dry run ───────────────────────────────────────────────────────────────────

fn print_schedule(ts: &CalendarTimestamp, config: &TransmitterConfig) -> Result<()> {
    let frame = EncodedFrame::from_timestamp(ts)
        .map_err(|e| ControlError::from(TransmitError::from(e)))?;
    let timing = &config.timing;

    println!("# {ts}");
    println!("{:>6}  {:<8}  pulses (ms)", "second", "symbol");

    let mut second = 0u32;
    let mut all: Vec<PulseCommand> = Vec::new();
    for symbol in frame.symbols() {
        let pulses = symbol.pulses(timing);
        let rendered: Vec<String> = pulses.iter().map(|p| render(*p)).collect();
        println!("{:>6}  {:<8}  {}", second, symbol_name(symbol), rendered.join(" "));
        second += symbol.slots();
        all.extend(pulses);
    }

    println!("# {} pulses, {} ms", all.len(), total_duration_ms(&all));
    Ok(())
}

fn symbol_name(symbol: FrameSymbol) -> String {
    match symbol {
        FrameSymbol::Bit(false) => "0".into(),
        FrameSymbol::Bit(true) => "1".into(),
        FrameSymbol::PositionId => "P".into(),
        FrameSymbol::Silence(n) => format!("-x{n}"),
    }
}

fn render(pulse: PulseCommand) -> String {
    match pulse {
        PulseCommand::Mark(ms) => format!("M{ms}"),
        PulseCommand::Space(ms) => format!("S{ms}"),
        PulseCommand::Silence(ms) => format!("Q{ms}"),
    }
}
