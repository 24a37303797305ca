//! # Ingest Worker
//!
//! Background task that reads lines from a [`LineSource`] and feeds them,
//! strictly one at a time and in arrival order, through the ingest pipeline.
//!
//! Shutdown is cooperative: [`IngestWorker::stop`] clears the running flag,
//! which the loop checks before every read and also waits on alongside the
//! read itself, so a transport blocked on a silent link still stops promptly.
//! [`IngestWorker::join`] then waits for the task to finish.
//!
//! [`IngestWorker::reset`] clears the buffer immediately and has the worker
//! forget the previous arrival time before it ingests the next line, so the
//! first packet after a reset carries no `delta`.

use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{Result, TelemetryError};
use crate::source::LineSource;
use crate::telemetry::pipeline::{IngestStats, TelemetryIngestPipeline};
use crate::telemetry::shared::SharedBuffer;

/// Number of accepted packets between status log messages
const LOG_INTERVAL_PACKETS: u64 = 1000;

/// Handle to the running ingest task
#[derive(Debug)]
pub struct IngestWorker {
    running: watch::Sender<bool>,
    /// Bumped on every reset request
    resets: watch::Sender<u64>,
    handle: JoinHandle<IngestStats>,
    buffer: SharedBuffer,
}

impl IngestWorker {
    /// Start ingesting from `source` on a new task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: Box<dyn LineSource>, pipeline: TelemetryIngestPipeline) -> Self {
        let (running, flag) = watch::channel(true);
        let (resets, reset_requests) = watch::channel(0);
        let buffer = pipeline.buffer().clone();
        let handle = tokio::spawn(run(source, pipeline, flag, reset_requests));

        Self {
            running,
            resets,
            handle,
            buffer,
        }
    }

    /// Buffer the worker appends to, for consumers
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Signal the worker to stop after the line in flight
    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Drop all buffered data and restart delta timing
    pub fn reset(&self) {
        self.buffer.reset();
        self.resets.send_modify(|generation| *generation += 1);
    }

    /// True until the task has exited
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Wait for the worker to exit and collect its totals
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Source` if the task panicked.
    pub async fn join(self) -> Result<IngestStats> {
        self.handle
            .await
            .map_err(|e| TelemetryError::Source(format!("Ingest worker failed: {}", e)))
    }

    /// Stop and join
    pub async fn shutdown(self) -> Result<IngestStats> {
        self.stop();
        self.join().await
    }
}

async fn run(
    mut source: Box<dyn LineSource>,
    mut pipeline: TelemetryIngestPipeline,
    mut running: watch::Receiver<bool>,
    mut reset_requests: watch::Receiver<u64>,
) -> IngestStats {
    info!("Ingest worker started ({})", source.describe());
    let mut last_log_count: u64 = 0;

    while *running.borrow() {
        let next = tokio::select! {
            changed = running.changed() => {
                if changed.is_err() {
                    // Handle dropped without stop(); nobody can stop us later
                    break;
                }
                continue;
            }
            next = source.next_line() => next,
        };

        match next {
            Ok(Some(raw)) => {
                if reset_requests.has_changed().unwrap_or(false) {
                    reset_requests.borrow_and_update();
                    pipeline.reset();
                }
                pipeline.ingest_bytes(&raw, Instant::now());

                let accepted = pipeline.stats().accepted;
                if accepted - last_log_count >= LOG_INTERVAL_PACKETS {
                    info!(
                        "Ingested {} packets ({} rejected)",
                        accepted,
                        pipeline.stats().rejected
                    );
                    last_log_count = accepted;
                }
            }
            Ok(None) => {
                info!("{} exhausted", source.describe());
                break;
            }
            Err(e) => {
                warn!("Read from {} failed: {}", source.describe(), e);
                if let Err(e) = source.reconnect().await {
                    error!("Giving up on {}: {}", source.describe(), e);
                    break;
                }
            }
        }
    }

    let stats = pipeline.stats();
    info!(
        "Ingest worker stopped: {} accepted, {} rejected",
        stats.accepted, stats.rejected
    );
    stats
}
