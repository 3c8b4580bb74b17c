//! Configuration for the disha-gnss daemon
//!
//! Loads configuration from a TOML file with the minimal parameters needed
//! to bridge a GNSS receiver onto the telemetry bus.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default receiver baud rate (nav board runs the UART at full speed)
pub const DEFAULT_BAUD: u32 = 921_600;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub telemetry: TelemetryConfig,
    pub manifest: TelemetryManifest,
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// GNSS receiver serial port (e.g. `/dev/serial0`)
    pub path: String,
    /// Baud rate; receivers in the field run at 38400 or 921600
    pub baud_rate: u32,
}

/// UDP telemetry bus configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Local bind address for the outbound socket (`0.0.0.0:0` picks any port)
    pub bind_address: String,
    /// Destination address of the telemetry bus
    pub destination: String,
}

/// Telemetry data ids, one per outbound packet kind
///
/// These mirror the bus manifest entries for the navigation board; the
/// daemon itself only needs the numeric ids.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TelemetryManifest {
    pub gps_lat_lon: u16,
    pub compass_data: u16,
    pub imu_data: u16,
    pub satellite_count: u16,
    pub accuracy_data: u16,
}

impl Default for TelemetryManifest {
    fn default() -> Self {
        Self {
            gps_lat_lon: 6100,
            compass_data: 6101,
            imu_data: 6102,
            satellite_count: 6103,
            accuracy_data: 6104,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration for the nav board deployment
    ///
    /// Suitable for testing and development. Production deployments should
    /// use a proper TOML configuration file.
    pub fn nav_board_defaults() -> Self {
        Self {
            serial: SerialConfig {
                path: "/dev/serial0".to_string(),
                baud_rate: DEFAULT_BAUD,
            },
            telemetry: TelemetryConfig {
                bind_address: "0.0.0.0:0".to_string(),
                destination: "127.0.0.1:11000".to_string(),
            },
            manifest: TelemetryManifest::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::nav_board_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::nav_board_defaults();
        assert_eq!(config.serial.path, "/dev/serial0");
        assert_eq!(config.serial.baud_rate, 921_600);
        assert_eq!(config.manifest.gps_lat_lon, 6100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::nav_board_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[serial]"));
        assert!(toml_string.contains("[telemetry]"));
        assert!(toml_string.contains("[manifest]"));
        assert!(toml_string.contains("[logging]"));

        assert!(toml_string.contains("baud_rate = 921600"));
        assert!(toml_string.contains("path = \"/dev/serial0\""));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[serial]
path = "/dev/ttyACM0"
baud_rate = 38400

[telemetry]
bind_address = "0.0.0.0:0"
destination = "192.168.1.10:11000"

[manifest]
gps_lat_lon = 5100
compass_data = 5101
imu_data = 5102
satellite_count = 5103
accuracy_data = 5104

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.serial.path, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.manifest.accuracy_data, 5104);
        assert_eq!(config.logging.level, "debug");
    }
}
