//! disha-gnss daemon entry point
//!
//! CLI surface:
//! - `--serial-path <path>`: serial device receiving UBX data
//! - `--level <DEBUG|INFO|WARN|ERROR|CRITICAL>`: console log level
//! - `--config <path>`: TOML configuration file

use disha_gnss::config::AppConfig;
use disha_gnss::telemetry::UdpTelemetrySink;
use disha_gnss::transport::SerialTransport;
use disha_gnss::{app, Result};
use std::env;
use std::path::Path;
use std::process;

/// Config path used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "/etc/disha-gnss.toml";

struct CliArgs {
    config_path: Option<String>,
    serial_path: Option<String>,
    /// env_logger filter string derived from `--level`
    level: Option<&'static str>,
}

fn print_usage() {
    eprintln!("Usage: disha-gnss [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --serial-path <path>   Serial port receiving UBX gps data (default /dev/serial0)");
    eprintln!("  --level <level>        One of DEBUG, INFO, WARN, ERROR, CRITICAL");
    eprintln!("  --config <path>        TOML config file (default {})", DEFAULT_CONFIG_PATH);
}

/// Map the CLI level names onto env_logger filters
///
/// CRITICAL collapses onto error; the log facade has no higher severity.
fn parse_level(value: &str) -> Option<&'static str> {
    match value {
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" => Some("warn"),
        "ERROR" | "CRITICAL" => Some("error"),
        _ => None,
    }
}

/// Fetch the value following a flag; prints usage and exits if missing
fn take_value<'a>(args: &'a [String], i: usize) -> &'a str {
    if i + 1 >= args.len() {
        eprintln!("Missing value for {}", args[i]);
        print_usage();
        process::exit(2);
    }
    &args[i + 1]
}

/// Parse command line arguments; prints usage and exits on invalid input
fn parse_args() -> CliArgs {
    let mut parsed = CliArgs {
        config_path: None,
        serial_path: None,
        level: None,
    };

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--serial-path" => {
                parsed.serial_path = Some(take_value(&args, i).to_string());
                i += 2;
            }
            "--level" => {
                let value = take_value(&args, i);
                let Some(level) = parse_level(value) else {
                    eprintln!("Invalid log level: {}", value);
                    print_usage();
                    process::exit(2);
                };
                parsed.level = Some(level);
                i += 2;
            }
            "--config" | "-c" => {
                parsed.config_path = Some(take_value(&args, i).to_string());
                i += 2;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(2);
            }
        }
    }

    parsed
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config_path {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            AppConfig::from_file(DEFAULT_CONFIG_PATH)?
        }
        None => AppConfig::nav_board_defaults(),
    };

    if let Some(path) = &args.serial_path {
        config.serial.path = path.clone();
    }
    Ok(config)
}

fn run(args: &CliArgs) -> Result<()> {
    let config = load_config(args)?;

    // CLI level wins over the config file
    let filter = args.level.unwrap_or(&config.logging.level).to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    log::info!("disha-gnss v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Receiver: {} at {} baud, telemetry -> {}",
        config.serial.path,
        config.serial.baud_rate,
        config.telemetry.destination
    );

    let transport = SerialTransport::open(&config.serial.path, config.serial.baud_rate)?;
    let sink = UdpTelemetrySink::connect(
        &config.telemetry.bind_address,
        &config.telemetry.destination,
    )?;

    app::run(transport, sink, &config)
}

fn main() {
    let args = parse_args();
    if let Err(e) = run(&args) {
        // Logger may not be up yet if config loading failed
        eprintln!("disha-gnss: {}", e);
        process::exit(1);
    }
}
