//! # Telemetry Ingest Pipeline
//!
//! Parser → enricher → rolling buffer, one line at a time.
//!
//! The pipeline owns the previous-arrival timestamp, so lines must be fed in
//! arrival order by a single caller.

use std::time::{Duration, Instant};

use tracing::debug;

use super::buffer::RollingBuffer;
use super::enricher::SampleEnricher;
use super::shared::SharedBuffer;
use crate::config::TelemetryConfig;
use crate::wire::parser::{parse_bytes, parse_line, ParseError};
use crate::wire::protocol::Sample;

/// Outcome of ingesting one line
#[derive(Debug, Clone, PartialEq)]
pub enum IngestResult {
    /// Line parsed; the enriched sample was appended to the buffer
    Accepted(Sample),
    /// Line dropped; the buffer is untouched
    Rejected(ParseError),
}

impl IngestResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestResult::Accepted(_))
    }
}

/// Running totals since the pipeline was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: u64,
    pub rejected: u64,
}

/// Turns raw lines into buffered samples
#[derive(Debug)]
pub struct TelemetryIngestPipeline {
    enricher: SampleEnricher,
    buffer: SharedBuffer,
    last_arrival: Option<Instant>,
    stats: IngestStats,
}

impl TelemetryIngestPipeline {
    pub fn new(enricher: SampleEnricher, buffer: SharedBuffer) -> Self {
        Self {
            enricher,
            buffer,
            last_arrival: None,
            stats: IngestStats::default(),
        }
    }

    /// Build a pipeline with a fresh buffer sized from the telemetry settings
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let delay = Duration::from_millis(config.expected_packet_delay_ms);
        let retention = Duration::from_secs(config.retention_s);
        Self::new(
            SampleEnricher::new(delay),
            SharedBuffer::new(RollingBuffer::for_retention(delay, retention)),
        )
    }

    /// Ingest a decoded line
    ///
    /// # Arguments
    ///
    /// * `line` - One telemetry line
    /// * `now` - Arrival time of the line
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::{Duration, Instant};
    /// use telemetry_dash::config::TelemetryConfig;
    /// use telemetry_dash::telemetry::pipeline::TelemetryIngestPipeline;
    ///
    /// let mut pipeline = TelemetryIngestPipeline::from_config(&TelemetryConfig::default());
    /// let result = pipeline.ingest_line("TELEM1;RPM=1800.00\n", Instant::now());
    ///
    /// assert!(result.is_accepted());
    /// assert_eq!(pipeline.last("RPM"), Some(1800.0));
    /// ```
    pub fn ingest_line(&mut self, line: &str, now: Instant) -> IngestResult {
        self.ingest(parse_line(line), now)
    }

    /// Ingest a raw line from the transport; undecodable bytes are rejected
    pub fn ingest_bytes(&mut self, raw: &[u8], now: Instant) -> IngestResult {
        self.ingest(parse_bytes(raw), now)
    }

    fn ingest(&mut self, parsed: Result<Sample, ParseError>, now: Instant) -> IngestResult {
        let raw = match parsed {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.rejected += 1;
                debug!("Dropped telemetry line: {}", e);
                return IngestResult::Rejected(e);
            }
        };

        let (sample, arrival) = self.enricher.enrich(raw, self.last_arrival, now);
        self.last_arrival = Some(arrival);
        self.stats.accepted += 1;

        let stored = sample.clone();
        self.buffer.write(|b| b.add(stored));

        IngestResult::Accepted(sample)
    }

    /// Handle for consumers querying from other tasks
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Clear buffered data and forget the previous arrival time
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.last_arrival = None;
    }

    pub fn window(&self, field: &str, count: usize) -> Vec<Option<f64>> {
        self.buffer.window(field, count)
    }

    pub fn last(&self, field: &str) -> Option<f64> {
        self.buffer.last(field)
    }

    pub fn min(&self, field: &str) -> Option<f64> {
        self.buffer.min(field)
    }

    pub fn avg(&self, field: &str) -> Option<f64> {
        self.buffer.avg(field)
    }

    pub fn max(&self, field: &str) -> Option<f64> {
        self.buffer.max(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> TelemetryIngestPipeline {
        TelemetryIngestPipeline::new(
            SampleEnricher::new(Duration::from_millis(100)),
            SharedBuffer::new(RollingBuffer::new(16)),
        )
    }

    #[test]
    fn test_accepts_direct_line() {
        let mut p = pipeline();
        let result = p.ingest_line("TELEM1;RPM=1800.00;BV=11.80\n", Instant::now());

        match result {
            IngestResult::Accepted(sample) => {
                assert_eq!(sample.get("RPM"), Some(1800.0));
                assert_eq!(sample.get("BV"), Some(11.8));
            }
            other => panic!("Expected Accepted, got: {:?}", other),
        }
        assert_eq!(p.buffer().len(), 1);
    }

    #[test]
    fn test_rejected_line_leaves_buffer_untouched() {
        let mut p = pipeline();
        let t0 = Instant::now();
        p.ingest_line("TELEM1;RPM=1000\n", t0);

        let result = p.ingest_line("+RCV=nothere\n", t0 + Duration::from_millis(50));
        assert_eq!(result, IngestResult::Rejected(ParseError::MissingEmbeddedMarker));
        assert_eq!(p.buffer().len(), 1);
        assert_eq!(p.stats(), IngestStats { accepted: 1, rejected: 1 });
    }

    #[test]
    fn test_rejected_line_does_not_advance_arrival_time() {
        let mut p = pipeline();
        let t0 = Instant::now();
        p.ingest_line("TELEM1;RPM=1000\n", t0);
        p.ingest_line("garbage\n", t0 + Duration::from_millis(40));
        p.ingest_line("TELEM2;RPM=1100\n", t0 + Duration::from_millis(90));

        let delta = p.last("delta").unwrap();
        assert!((delta - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let mut p = pipeline();
        let result = p.ingest_bytes(&[b'T', 0xC3, 0x28, b'\n'], Instant::now());
        assert_eq!(result, IngestResult::Rejected(ParseError::InvalidEncoding));
        assert!(p.buffer().is_empty());
    }

    #[test]
    fn test_delta_statistics() {
        let mut p = pipeline();
        let t0 = Instant::now();
        p.ingest_line("TELEM1;RPM=1\n", t0);
        p.ingest_line("TELEM2;RPM=2\n", t0 + Duration::from_millis(100));
        p.ingest_line("TELEM3;RPM=3\n", t0 + Duration::from_millis(300));
        // Stall: 1s gap is an outlier
        p.ingest_line("TELEM4;RPM=4\n", t0 + Duration::from_millis(1300));

        assert_eq!(p.window("delta", 0), vec![None, Some(100.0), Some(200.0), None]);
        assert!((p.avg("delta").unwrap() - 150.0).abs() < 1e-6);
        assert_eq!(p.min("delta"), Some(100.0));
        assert_eq!(p.max("delta"), Some(200.0));
    }

    #[test]
    fn test_reset_forgets_arrival_time() {
        let mut p = pipeline();
        let t0 = Instant::now();
        p.ingest_line("TELEM1;RPM=1\n", t0);
        p.reset();

        assert!(p.buffer().is_empty());
        p.ingest_line("TELEM2;RPM=2\n", t0 + Duration::from_millis(50));
        assert_eq!(p.last("delta"), None);
    }

    #[test]
    fn test_from_config_capacity() {
        let config = TelemetryConfig {
            expected_packet_delay_ms: 200,
            retention_s: 3600,
        };
        let p = TelemetryIngestPipeline::from_config(&config);
        assert_eq!(p.buffer().read(|b| b.capacity()), 18_000);
    }
}
