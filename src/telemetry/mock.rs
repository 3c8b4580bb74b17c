//! Recording sink for tests

use super::{TelemetryPacket, TelemetrySink};
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Mock sink that records every packet it receives
#[derive(Clone)]
pub struct MockSink {
    inner: Arc<Mutex<MockSinkInner>>,
}

struct MockSinkInner {
    sent: Vec<TelemetryPacket>,
    closed: bool,
}

impl MockSink {
    /// Create a new recording sink
    pub fn new() -> Self {
        MockSink {
            inner: Arc::new(Mutex::new(MockSinkInner {
                sent: Vec::new(),
                closed: false,
            })),
        }
    }

    /// All packets sent so far, in send order
    pub fn sent(&self) -> Vec<TelemetryPacket> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

impl TelemetrySink for MockSink {
    fn send(&mut self, packet: &TelemetryPacket, _reliable: bool) -> Result<()> {
        self.inner.lock().unwrap().sent.push(packet.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.inner.lock().unwrap().closed = true;
        Ok(())
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}
