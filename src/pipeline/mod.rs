//! Message ingestion pipeline
//!
//! Two threads and one FIFO: a reader thread exclusively owns the serial
//! transport, feeds the frame decoder and pushes decoded messages onto a
//! crossbeam channel; the consumer side dispatches them to the telemetry
//! sink and evaluates the stream health policy after every dispatch.
//!
//! Flushes requested by the consumer travel back to the reader over a
//! control channel and execute between read attempts, so a read in
//! progress can never be truncated by a concurrent flush.

mod dispatcher;
mod health;

pub use dispatcher::{DispatchState, Dispatcher};
pub use health::{FlushReason, StreamHealth, TrackedKind};

use crate::error::Result;
use crate::telemetry::TelemetrySink;
use crate::transport::Transport;
use crate::ubx::{FrameDecoder, ParsedMessage};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Reader idle sleep while the channel has no bytes
const IDLE_POLL: Duration = Duration::from_millis(2);

/// Consumer wait on the queue between stop-flag checks; bounds shutdown
/// latency on the dispatch side
const QUEUE_POLL: Duration = Duration::from_millis(100);

/// Read chunk size per transport call
const READ_CHUNK: usize = 512;

/// Running ingestion pipeline
///
/// `run` consumes the pipeline on the calling thread; the reader thread is
/// joined before it returns, so the serial port is closed by the time the
/// caller gets the dispatcher (and its sink) back.
pub struct IngestionPipeline<S: TelemetrySink> {
    reader: thread::JoinHandle<Result<()>>,
    messages: Receiver<ParsedMessage>,
    flush_tx: Sender<FlushReason>,
    dispatcher: Dispatcher<S>,
    health: StreamHealth,
    stop: Arc<AtomicBool>,
}

impl<S: TelemetrySink> IngestionPipeline<S> {
    /// Spawn the reader thread and wire up the queues
    pub fn start<T: Transport + 'static>(
        transport: T,
        dispatcher: Dispatcher<S>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded();
        let (flush_tx, flush_rx) = crossbeam_channel::unbounded();

        let reader_stop = Arc::clone(&stop);
        let reader = thread::Builder::new()
            .name("ubx-reader".to_string())
            .spawn(move || {
                let result = reader_loop(transport, msg_tx, flush_rx, &reader_stop);
                if let Err(ref e) = result {
                    log::error!("Serial channel failure, stopping ingestion: {}", e);
                }
                // Whether we stopped on request or on a channel fault, make
                // sure the consumer side winds down too
                reader_stop.store(true, Ordering::Relaxed);
                log::info!("Reader thread exiting");
                result
            })?;

        Ok(Self {
            reader,
            messages: msg_rx,
            flush_tx,
            dispatcher,
            health: StreamHealth::new(),
            stop,
        })
    }

    /// Dispatch messages until shutdown, drain the queue, join the reader
    ///
    /// Returns the dispatcher (so the owner can close its sink) together
    /// with the channel's terminal status: `Err` if ingestion ended on a
    /// serial I/O failure rather than a shutdown request. Orderly shutdown
    /// has already happened either way.
    pub fn run(mut self) -> (Dispatcher<S>, Result<()>) {
        loop {
            match self.messages.recv_timeout(QUEUE_POLL) {
                Ok(msg) => self.handle_message(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
        }

        // Stop requested: dispatch whatever the reader already queued
        while let Ok(msg) = self.messages.try_recv() {
            self.handle_message(msg);
        }

        let status = match self.reader.join() {
            Ok(result) => result,
            Err(_) => {
                log::error!("Reader thread panicked");
                Ok(())
            }
        };
        (self.dispatcher, status)
    }

    fn handle_message(&mut self, msg: ParsedMessage) {
        if matches!(msg, ParsedMessage::Unrecognized) {
            // Same treatment as the overflow rule: drop the backlog and
            // start over from a clean buffer
            log::warn!("Serial message not received properly");
            self.request_flush(FlushReason::CorruptFrame);
            self.health.reset();
            return;
        }

        match self.dispatcher.dispatch(&msg) {
            Ok(Some(kind)) => {
                self.health.record(kind);
                if let Some(reason) = self.health.decide() {
                    self.request_flush(reason);
                    self.health.reset();
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("Dispatch failed: {}", e),
        }
    }

    fn request_flush(&self, reason: FlushReason) {
        match reason {
            FlushReason::PeriodicResync => log::debug!("Requesting flush: {}", reason),
            FlushReason::Backlog | FlushReason::CorruptFrame => {
                log::warn!("Requesting flush: {}", reason)
            }
        }
        if self.flush_tx.send(reason).is_err() {
            // Reader already gone; nothing left to flush
            log::debug!("Flush request dropped, reader not running");
        }
    }
}

/// Reader loop: sole owner of the transport
///
/// Frame-level failures are absorbed here (logged, queued as
/// `Unrecognized`); transport I/O errors are fatal and propagate to the
/// spawn wrapper, which stops the pipeline.
fn reader_loop<T: Transport>(
    mut transport: T,
    messages: Sender<ParsedMessage>,
    flush_requests: Receiver<FlushReason>,
    stop: &AtomicBool,
) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        // Execute pending flushes before touching the read path
        while let Ok(reason) = flush_requests.try_recv() {
            transport.flush_all()?;
            decoder.clear();
            log::debug!("Serial buffers flushed ({})", reason);
        }

        if transport.available()? == 0 {
            thread::sleep(IDLE_POLL);
            continue;
        }

        let n = transport.read(&mut chunk)?;
        if n == 0 {
            continue;
        }
        decoder.feed(&chunk[..n]);

        loop {
            match decoder.next_message() {
                Ok(Some(msg)) => {
                    if messages.send(msg).is_err() {
                        // Consumer is gone; treat as shutdown
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Malformed frame: {}", e);
                    if messages.send(ParsedMessage::Unrecognized).is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    Ok(())
}
