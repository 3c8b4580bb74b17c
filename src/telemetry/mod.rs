//! Telemetry bus output
//!
//! The daemon's only outbound surface: typed key/value packets pushed to a
//! messaging bus, fire-and-forget. The wire layout is a fixed binary header
//! followed by big-endian values; delivery guarantees are the bus's problem,
//! not ours.

mod mock;
mod udp;

pub use mock::MockSink;
pub use udp::UdpTelemetrySink;

use crate::error::Result;

/// Wire protocol version byte
const WIRE_VERSION: u8 = 3;

/// Typed value payload of one telemetry packet
///
/// The variant is the packet's type tag; values inside a packet are
/// homogeneous and ordered.
#[derive(Debug, Clone, PartialEq)]
pub enum PacketValues {
    /// 32-bit IEEE floats (wire tag `f`)
    Float(Vec<f32>),
    /// 16-bit signed integers (wire tag `h`)
    Short(Vec<i16>),
}

impl PacketValues {
    /// Wire type tag
    pub fn type_tag(&self) -> u8 {
        match self {
            PacketValues::Float(_) => b'f',
            PacketValues::Short(_) => b'h',
        }
    }

    /// Number of values in the packet
    pub fn count(&self) -> u16 {
        match self {
            PacketValues::Float(v) => v.len() as u16,
            PacketValues::Short(v) => v.len() as u16,
        }
    }
}

/// One outbound telemetry event, immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPacket {
    pub data_id: u16,
    pub values: PacketValues,
}

impl TelemetryPacket {
    pub fn floats(data_id: u16, values: Vec<f32>) -> Self {
        Self {
            data_id,
            values: PacketValues::Float(values),
        }
    }

    pub fn shorts(data_id: u16, values: Vec<i16>) -> Self {
        Self {
            data_id,
            values: PacketValues::Short(values),
        }
    }

    /// Encode into the bus wire layout:
    /// `[version][data_id BE][count BE][type tag][values BE]`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.clear();
        buf.push(WIRE_VERSION);
        buf.extend_from_slice(&self.data_id.to_be_bytes());
        buf.extend_from_slice(&self.values.count().to_be_bytes());
        buf.push(self.values.type_tag());
        match &self.values {
            PacketValues::Float(values) => {
                for v in values {
                    buf.extend_from_slice(&v.to_be_bytes());
                }
            }
            PacketValues::Short(values) => {
                for v in values {
                    buf.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
    }
}

/// Outbound sink for telemetry packets
///
/// `reliable` is a delivery hint; this daemon always passes `false` and
/// implementations may ignore the flag entirely.
pub trait TelemetrySink: Send {
    /// Forward one packet; consumed exactly once
    fn send(&mut self, packet: &TelemetryPacket, reliable: bool) -> Result<()>;

    /// Flush and terminate the sink
    fn close(&mut self) -> Result<()>;
}
