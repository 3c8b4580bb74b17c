//! disha-gnss - GNSS receiver bridge for the rover telemetry bus
//!
//! Reads the UBX binary protocol from a receiver over a serial link,
//! decodes NAV-class messages on a dedicated reader thread, and forwards
//! derived telemetry values over UDP. A counter-based health policy flushes
//! the serial buffers whenever the stream goes stale or one message kind
//! starts to run away, trading buffered history for freshness.

pub mod app;
pub mod config;
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod telemetry;
pub mod transport;
pub mod ubx;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
