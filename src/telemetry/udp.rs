//! Fire-and-forget UDP telemetry sink
//!
//! One packet per datagram, pre-allocated send buffer, loss is logged and
//! never fails the pipeline.

use super::{TelemetryPacket, TelemetrySink};
use crate::error::{Error, Result};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Expected upper bound on an encoded packet; header + a handful of values
const SEND_BUFFER_CAPACITY: usize = 64;

/// UDP unicast sink for the telemetry bus
pub struct UdpTelemetrySink {
    socket: UdpSocket,
    destination: SocketAddr,
    send_buffer: Vec<u8>,
}

impl UdpTelemetrySink {
    /// Bind a local socket and resolve the bus destination
    pub fn connect(bind_address: &str, destination: &str) -> Result<Self> {
        let socket = UdpSocket::bind(bind_address)?;
        let destination = destination
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Telemetry(format!("unresolvable destination: {destination}")))?;

        log::info!("Telemetry sink ready: {} -> {}", socket.local_addr()?, destination);

        Ok(Self {
            socket,
            destination,
            send_buffer: Vec::with_capacity(SEND_BUFFER_CAPACITY),
        })
    }
}

impl TelemetrySink for UdpTelemetrySink {
    fn send(&mut self, packet: &TelemetryPacket, _reliable: bool) -> Result<()> {
        packet.encode_into(&mut self.send_buffer);

        // Best-effort delivery: a dropped datagram must not stall ingestion
        if let Err(e) = self.socket.send_to(&self.send_buffer, self.destination) {
            log::warn!("Telemetry send failed (data_id={}): {}", packet.data_id, e);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        log::debug!("Telemetry sink closed");
        Ok(())
    }
}
