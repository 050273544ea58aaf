//! `lcom` - send commands and messages to an L-COM LoRa module.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use lcom_host::cli::{build_envelope, Cli, Command};
use lcom_host::{
    spawn_receiver, HexTransport, HostConfig, HostError, HostResult, SerialTransport, Transport,
};
use lcom_protocol::ProtocolSession;
use tracing_subscriber::EnvFilter;

/// How often the main thread checks for Ctrl-C or a closed port.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(err) = run(cli) {
        eprintln!("lcom error: {}", err);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> HostResult<()> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    cli.apply_overrides(&mut config);

    let session = ProtocolSession::new();
    let envelope = build_envelope(&cli.command, &session, &config)?;

    if cli.dry_run {
        if let Some(envelope) = &envelope {
            HexTransport::new(io::stdout().lock()).send(&envelope.to_bytes())?;
        }
        return Ok(());
    }

    let port = config.port.clone().ok_or(HostError::NoPort)?;
    let mut transport = SerialTransport::open(&port, &config)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))?;
    }
    let receiver = spawn_receiver(transport.reader()?, Arc::clone(&stop));

    if let Some(envelope) = &envelope {
        tracing::info!(
            class = %envelope.class(),
            seq = envelope.sequence().value(),
            bytes = envelope.length(),
            "sending"
        );
        transport.send(&envelope.to_bytes())?;
    }

    let deadline = match cli.command {
        Command::Listen => None,
        _ => Some(Instant::now() + Duration::from_millis(config.listen_after_send_ms)),
    };
    while !stop.load(Ordering::Relaxed) && !receiver.is_finished() {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    stop.store(true, Ordering::Relaxed);
    let stats = receiver.join().map_err(|_| HostError::ReceiverPanicked)?;
    tracing::debug!(?stats, "done");
    Ok(())
}
