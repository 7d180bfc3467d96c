//! Sensorlink CLI - headless connection to the HR/RR sensor
//!
//! Runs the same controller as the GUI without a window, which is handy for
//! checking a device from a script.

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::{bounded, Receiver};
use sensorlink_core::{
    logging, CliResult, ConfigArgs, Controller, ExitCodes, LinkEvent, LinkOpener, NativeOpener,
    ToggleState, UiAction,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// CLI output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON lines for scripting
    Json,
}

/// Sensorlink CLI
#[derive(Parser, Debug)]
#[command(
    name = "sensorlink-cli",
    version,
    about = "Connect to an HR/RR sensor over a serial link",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts,

    /// Search the first available port for the sensor
    Connect {
        /// Seconds to wait for the handshake outcome
        #[arg(long, default_value = "10")]
        wait: u64,

        /// Seconds to stay connected before disconnecting (0 = until Ctrl-C)
        #[arg(long, default_value = "0")]
        hold: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.clone().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(ExitCodes::INVALID_ARGS);
        }
    };
    logging::init(&config.logging);

    let opener: Arc<dyn LinkOpener> = Arc::new(NativeOpener);
    let result = match &cli.command {
        Commands::ListPorts => list_ports(&cli, opener.as_ref()),
        Commands::Connect { wait, hold } => match Controller::from_config(&config, opener) {
            Ok(controller) => connect(&cli, controller, *wait, *hold),
            Err(e) => CliResult::from(e),
        },
    };

    if let Some(msg) = result.message() {
        if result.is_success() {
            println!("{msg}");
        } else {
            eprintln!("Error: {msg}");
        }
    }
    result.to_exit_code()
}

fn list_ports(cli: &Cli, opener: &dyn LinkOpener) -> CliResult {
    let ports = match opener.available_ports() {
        Ok(ports) => ports,
        Err(e) => return CliResult::error(ExitCodes::ERROR, e.to_string()),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "ports": ports })),
        OutputFormat::Text => {
            if ports.is_empty() {
                println!("No serial ports found.");
            }
            for port in &ports {
                println!("  {port}");
            }
        }
    }
    CliResult::success()
}

fn connect(cli: &Cli, mut controller: Controller, wait: u64, hold: u64) -> CliResult {
    let interrupted = match interrupt_channel() {
        Ok(rx) => rx,
        Err(e) => return CliResult::error(ExitCodes::ERROR, e.to_string()),
    };

    if let Err(e) = controller.dispatch(UiAction::Toggled(true)) {
        return CliResult::from(e);
    }
    report(cli, &controller.label());

    let deadline = Instant::now() + Duration::from_secs(wait);
    let mut outcome = None;
    while controller.toggle_state() == ToggleState::Searching {
        if interrupted.try_recv().is_ok() || Instant::now() >= deadline {
            break;
        }
        controller.wait_for_event(Duration::from_millis(100));
        for event in controller.drain_notices() {
            print_event(cli, &event);
            if let LinkEvent::Status(status) = event {
                outcome = Some(CliResult::from_outcome(&status.port, &status.outcome));
            }
        }
    }

    if controller.toggle_state() != ToggleState::Connected {
        exit(&mut controller);
        return outcome.unwrap_or_else(|| {
            CliResult::error(ExitCodes::TIMEOUT, "No identity reply from the device")
        });
    }
    report(cli, &controller.label());

    let hold_until = (hold > 0).then(|| Instant::now() + Duration::from_secs(hold));
    loop {
        if interrupted.recv_timeout(Duration::from_millis(200)).is_ok() {
            break;
        }
        if hold_until.is_some_and(|t| Instant::now() >= t) {
            break;
        }
    }

    exit(&mut controller);
    for event in controller.drain_notices() {
        print_event(cli, &event);
    }
    outcome.unwrap_or_else(CliResult::success)
}

fn exit(controller: &mut Controller) {
    if let Err(e) = controller.dispatch(UiAction::Exit) {
        warn!(error = %e, "shutdown failed");
    }
}

fn interrupt_channel() -> Result<Receiver<()>, ctrlc::Error> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;
    Ok(rx)
}

fn report(cli: &Cli, label: &str) {
    if matches!(cli.format, OutputFormat::Text) {
        println!("[{}] {label}", Local::now().format("%H:%M:%S"));
    }
}

fn print_event(cli: &Cli, event: &LinkEvent) {
    match cli.format {
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        }
        OutputFormat::Text => {
            let ts = Local::now().format("%H:%M:%S");
            match event {
                LinkEvent::Status(status) if status.is_success() => {
                    println!("[{ts}] {}: device identified", status.port);
                }
                LinkEvent::Status(status) => {
                    println!("[{ts}] {}: attempt failed ({:?})", status.port, status.outcome);
                }
                LinkEvent::DeviceClosed(closed) => println!("[{ts}] Port {} closed.", closed.port),
            }
        }
    }
}
