//! # Line Source Module
//!
//! Where raw telemetry lines come from.
//!
//! This module handles:
//! - The [`LineSource`] trait the ingest worker reads from
//! - Replaying a recorded capture file at the packet rate
//! - Synthesizing telemetry for bench testing without the vehicle
//! - Opening whichever source the configuration selects

pub mod replay;
pub mod simulator;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, SourceKind};
use crate::error::{Result, TelemetryError};
use crate::serial::RadioSerial;

/// A stream of raw, newline-delimited telemetry lines
///
/// Lines are handed over as bytes; decoding happens per line so one garbled
/// transmission cannot poison the stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next line
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Re-establish the source after a read error
    async fn reconnect(&mut self) -> Result<()> {
        Err(TelemetryError::Source(format!(
            "{} cannot reconnect",
            self.describe()
        )))
    }

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Open the line source selected by `[source] kind`
///
/// # Errors
///
/// Returns error if the serial radio cannot be reached after the configured
/// retries, or the replay file cannot be opened.
pub async fn open_configured(config: &Config) -> Result<Box<dyn LineSource>> {
    let interval = Duration::from_millis(config.source.interval_ms);

    let source: Box<dyn LineSource> = match config.source.kind {
        SourceKind::Serial => Box::new(RadioSerial::connect(&config.serial, &config.radio).await?),
        SourceKind::Replay => {
            let path = config.source.replay_file.as_ref().ok_or_else(|| {
                TelemetryError::Source("replay source requires replay_file".to_string())
            })?;
            Box::new(replay::ReplaySource::open(path, interval, config.source.replay_looped).await?)
        }
        SourceKind::Simulator => Box::new(simulator::SimulatorSource::new(interval)),
    };

    info!("Telemetry source: {}", source.describe());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_simulator() {
        let mut config = Config::default();
        config.source.kind = SourceKind::Simulator;

        let mut source = open_configured(&config).await.unwrap();
        assert!(source.describe().contains("simulator"));

        let line = source.next_line().await.unwrap().unwrap();
        assert!(line.starts_with(b"TELEM1;"));
    }

    #[tokio::test]
    async fn test_open_replay_missing_file() {
        let mut config = Config::default();
        config.source.kind = SourceKind::Replay;
        config.source.replay_file = Some("/nonexistent/capture.txt".into());

        let result = open_configured(&config).await;
        assert!(matches!(result, Err(TelemetryError::Source(_))));
    }

    #[tokio::test]
    async fn test_default_reconnect_unsupported() {
        let mut source = simulator::SimulatorSource::new(Duration::from_millis(1));
        let result = source.reconnect().await;
        assert!(matches!(result, Err(TelemetryError::Source(_))));
    }
}
