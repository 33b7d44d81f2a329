//! # S.Port Telemetry
//!
//! FrSky S.Port telemetry device with MSP tunnelling for VTX control.
//!
//! Reports sensor values to the receiver and answers MSP requests sent by the
//! flight controller over the same S.Port line.

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use sport_telemetry::config::{Config, LoggingConfig};
use sport_telemetry::exchange::SportExchange;
use sport_telemetry::msp::command::{CommandContext, CommandRegistry};
use sport_telemetry::serial::{echo_timeout, open_port, PumpMaster, SportLine};
use sport_telemetry::telemetry::demo_sensors;
use sport_telemetry::vtx::{JsonFileStore, VtxConfig, VtxTable};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name prefix inside the logging directory
const LOG_FILE_NAME: &str = "sport-telemetry.log";

/// Set up console logging, plus a daily log file if configured
///
/// The returned guard flushes the file writer when dropped, so it must be
/// held until exit.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Build the VTX configuration, restoring saved settings when present
fn load_vtx(config: &Config) -> Result<VtxConfig> {
    let table = VtxTable::load(&config.vtx.table_file)
        .with_context(|| format!("Failed to load VTX table {}", config.vtx.table_file))?;

    let store = JsonFileStore::new(&config.vtx.config_file);

    let vtx = match store.load() {
        Ok(Some(settings)) => {
            info!("Restored VTX settings from {}", config.vtx.config_file);
            VtxConfig::with_settings(settings, table, Box::new(store))
        }
        Ok(None) => VtxConfig::new(table, Box::new(store)),
        Err(e) => {
            warn!("Ignoring unreadable VTX settings {}: {}", config.vtx.config_file, e);
            VtxConfig::new(table, Box::new(store))
        }
    };

    Ok(vtx)
}

/// Main entry point for S.Port Telemetry
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging
///    - Load the VTX table and any saved VTX settings
///    - Open the serial port and register the S.Port line
///
/// 2. **Main Loop**
///    - Pump every bus line each poll interval
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration or VTX table cannot be loaded
/// - The serial port cannot be opened
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("S.Port Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let vtx = load_vtx(&config)?;

    let transmit_id = config.sport.transmit_physical_id()?;
    let receive_id = config.sport.receive_physical_id()?;

    let mut exchange = SportExchange::new(
        transmit_id,
        receive_id,
        CommandRegistry::with_defaults(),
        CommandContext::new(vtx),
    );

    if config.telemetry.demo_sensors {
        exchange.set_sensors(demo_sensors());
        info!("Reporting demo sensors");
    }

    let timeout = echo_timeout(config.serial.baud_rate, config.serial.echo_timeout_factor);
    let port = open_port(&config.serial.port, config.serial.baud_rate, timeout)?;

    let mut master = PumpMaster::new();
    master.register(Box::new(SportLine::new(port, exchange, config.serial.echo)));

    let mut poll_interval = interval(Duration::from_micros(config.serial.poll_interval_us));
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Serving S.Port on {} (transmit {}, receive {})",
        config.serial.port, transmit_id, receive_id
    );
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                master.pump_all();
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}
