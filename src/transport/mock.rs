//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for unit testing
///
/// Clone-able handle over shared buffers so tests can inject bytes and
/// inspect flushes while the pipeline owns another handle.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    flush_count: usize,
    fail_reads: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                flush_count: 0,
                fail_reads: false,
            })),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(data);
    }

    /// Number of times `flush_all` has been called
    pub fn flush_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.flush_count
    }

    /// Number of injected bytes not yet consumed
    pub fn pending(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.read_buffer.len()
    }

    /// Make every subsequent read fail with a broken-pipe error
    pub fn fail_reads(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_reads = true;
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock device disconnected",
            )));
        }
        let available = inner.read_buffer.len().min(buffer.len());

        for item in buffer.iter_mut().take(available) {
            *item = inner.read_buffer.pop_front().unwrap();
        }

        Ok(available)
    }

    fn available(&mut self) -> Result<usize> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            // Force the reader into `read` so the scripted error surfaces
            return Ok(1);
        }
        Ok(inner.read_buffer.len())
    }

    fn flush_all(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.clear();
        inner.flush_count += 1;
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
