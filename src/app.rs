//! Application orchestration for the disha-gnss daemon
//!
//! Wires the transport, pipeline and telemetry sink together, installs the
//! shutdown signal handler and guarantees the close order: serial channel
//! first (when the reader thread exits), then the sink.

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::{Dispatcher, IngestionPipeline};
use crate::telemetry::TelemetrySink;
use crate::transport::Transport;
use log::info;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Run the daemon until a shutdown signal arrives or the channel fails
///
/// The consumer loop runs on the calling thread; the reader thread is
/// joined (closing the serial port) before the sink is closed.
pub fn run<T, S>(transport: T, sink: S, config: &AppConfig) -> Result<()>
where
    T: Transport + 'static,
    S: TelemetrySink,
{
    let stop = Arc::new(AtomicBool::new(false));
    spawn_signal_listener(Arc::clone(&stop));

    let dispatcher = Dispatcher::new(sink, config.manifest, true);
    let pipeline = IngestionPipeline::start(transport, dispatcher, Arc::clone(&stop))?;

    info!("Starting read handler. Press Ctrl-C to terminate...");
    let (dispatcher, status) = pipeline.run();

    // Serial port is closed by now (reader joined); close the sink even if
    // the channel died, then surface the failure
    let mut sink = dispatcher.into_sink();
    sink.close()?;
    status?;

    info!("disha-gnss stopped");
    Ok(())
}

/// Set the stop flag on SIGINT/SIGTERM
fn spawn_signal_listener(stop: Arc<AtomicBool>) {
    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            let mut signals =
                Signals::new([SIGINT, SIGTERM]).expect("Failed to register signal handlers");

            if let Some(sig) = signals.forever().next() {
                info!("Received signal {:?}, initiating shutdown...", sig);
                stop.store(true, Ordering::Relaxed);
            }
        })
        .expect("Failed to spawn signal listener thread");
}
