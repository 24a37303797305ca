//! # Capture Replay
//!
//! Feeds a recorded capture file back one line per tick, as if it were
//! arriving over the radio.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::LineSource;
use crate::error::{Result, TelemetryError};

/// Paced reader over a capture file
#[derive(Debug)]
pub struct ReplaySource {
    path: PathBuf,
    reader: BufReader<File>,
    pace: Interval,
    looped: bool,
    lines_in_pass: u64,
}

impl ReplaySource {
    /// Open a capture file
    ///
    /// # Arguments
    ///
    /// * `path` - Text file of telemetry lines
    /// * `pace` - Delay between lines
    /// * `looped` - Start over at end of file instead of finishing
    pub async fn open<P: AsRef<Path>>(path: P, pace: Duration, looped: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| TelemetryError::Source(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut pace = interval(pace);
        pace.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Replaying {} (looped: {})", path.display(), looped);
        Ok(Self {
            path,
            reader: BufReader::new(file),
            pace,
            looped,
            lines_in_pass: 0,
        })
    }
}

#[async_trait]
impl LineSource for ReplaySource {
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.pace.tick().await;

        loop {
            let mut line = Vec::new();
            let n = self.reader.read_until(b'\n', &mut line).await?;

            if n > 0 {
                self.lines_in_pass += 1;
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                return Ok(Some(line));
            }

            // An empty file would spin forever when looped
            if !self.looped || self.lines_in_pass == 0 {
                debug!("Replay of {} finished", self.path.display());
                return Ok(None);
            }

            debug!("Replay of {} wrapped after {} lines", self.path.display(), self.lines_in_pass);
            self.reader.seek(SeekFrom::Start(0)).await?;
            self.lines_in_pass = 0;
        }
    }

    fn describe(&self) -> String {
        format!("replay {}", self.path.display())
    }
}
