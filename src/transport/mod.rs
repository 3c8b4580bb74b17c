//! Transport layer for serial I/O abstraction

use crate::error::Result;

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Transport trait for the receiver's byte channel
///
/// Implementations are exclusively owned by the pipeline's reader thread;
/// flush requests from other threads arrive there as control messages, so
/// a read in progress can never interleave with a flush.
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read
    ///
    /// A read timeout is not an error; it returns 0.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Check if data is available to read
    fn available(&mut self) -> Result<usize> {
        Ok(0) // Default implementation
    }

    /// Discard all buffered bytes in both directions
    fn flush_all(&mut self) -> Result<()>;
}
