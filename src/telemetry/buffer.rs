//! # Rolling Sample Buffer
//!
//! Fixed-capacity FIFO of [`Sample`]s with live per-field min/max/average.
//!
//! The buffer has no schema: the set of known fields grows as new names are
//! observed and only shrinks on [`RollingBuffer::reset`]. Per-field aggregates
//! are updated incrementally when a sample is appended and when the oldest
//! sample is evicted, so an append costs `O(fields × log capacity)` no matter
//! how large the window is.
//!
//! ## Usage
//!
//! ```
//! use telemetry_dash::telemetry::buffer::RollingBuffer;
//! use telemetry_dash::wire::parser::parse_line;
//!
//! let mut buffer = RollingBuffer::new(3);
//! for line in ["TELEM1;RPM=1000\n", "TELEM2;BV=12.1\n", "TELEM3;RPM=3000\n"] {
//!     buffer.add(parse_line(line).unwrap());
//! }
//!
//! assert_eq!(buffer.window("RPM", 0), vec![Some(1000.0), None, Some(3000.0)]);
//! assert_eq!(buffer.avg("RPM"), Some(2000.0));
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tracing::debug;

use super::stats::FieldStats;
use super::window::DurationLabel;
use crate::wire::protocol::{Sample, FIELD_DELTA};

/// Bounded window of recent samples with per-field aggregates
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    /// One entry per field ever seen since the last reset
    stats: BTreeMap<String, FieldStats>,
}

impl RollingBuffer {
    /// Creates a buffer holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            stats: BTreeMap::new(),
        }
    }

    /// Creates a buffer sized to hold `retention` worth of packets
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use telemetry_dash::telemetry::buffer::RollingBuffer;
    ///
    /// let buffer = RollingBuffer::for_retention(
    ///     Duration::from_millis(200),
    ///     Duration::from_secs(3600),
    /// );
    /// assert_eq!(buffer.capacity(), 18_000);
    /// ```
    pub fn for_retention(expected_packet_delay: Duration, retention: Duration) -> Self {
        let delay_ms = expected_packet_delay.as_millis().max(1);
        let capacity = retention.as_millis() / delay_ms;
        Self::new(usize::try_from(capacity).unwrap_or(usize::MAX))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample, evicting the oldest one when full
    pub fn add(&mut self, sample: Sample) {
        for (field, value) in sample.iter() {
            match self.stats.get_mut(field) {
                Some(stats) => stats.insert(value),
                None => {
                    debug!("New telemetry field observed: {}", field);
                    let mut stats = FieldStats::new();
                    stats.insert(value);
                    self.stats.insert(field.to_string(), stats);
                }
            }
        }
        self.samples.push_back(sample);

        if self.samples.len() > self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                for (field, value) in evicted.iter() {
                    if let Some(stats) = self.stats.get_mut(field) {
                        stats.remove(value);
                    }
                }
            }
        }
    }

    /// The most recent `count` values of `field`, oldest first
    ///
    /// Samples that did not carry the field yield `None`. A `count` of 0
    /// returns the whole buffer; a count larger than the buffer returns
    /// everything available.
    pub fn window(&self, field: &str, count: usize) -> Vec<Option<f64>> {
        let skip = match count {
            0 => 0,
            n => self.samples.len().saturating_sub(n),
        };
        self.samples.iter().skip(skip).map(|s| s.get(field)).collect()
    }

    /// Values of `field` spanning a chart duration label
    pub fn window_for(
        &self,
        field: &str,
        label: DurationLabel,
        fallback_delay: Duration,
    ) -> Vec<Option<f64>> {
        self.window(field, self.samples_for(label, fallback_delay))
    }

    /// Sample count covering `label` at the measured average packet delay
    ///
    /// Falls back to `fallback_delay` until a `delta` has been measured.
    pub fn samples_for(&self, label: DurationLabel, fallback_delay: Duration) -> usize {
        let delay_ms = self
            .avg(FIELD_DELTA)
            .unwrap_or_else(|| fallback_delay.as_secs_f64() * 1000.0);
        label.sample_count(delay_ms)
    }

    /// Most recent value of `field` still in the buffer
    pub fn last(&self, field: &str) -> Option<f64> {
        self.samples.iter().rev().find_map(|s| s.get(field))
    }

    pub fn min(&self, field: &str) -> Option<f64> {
        self.stats.get(field).and_then(FieldStats::min)
    }

    pub fn avg(&self, field: &str) -> Option<f64> {
        self.stats.get(field).and_then(FieldStats::avg)
    }

    pub fn max(&self, field: &str) -> Option<f64> {
        self.stats.get(field).and_then(FieldStats::max)
    }

    /// Number of buffered samples carrying `field`
    pub fn count(&self, field: &str) -> usize {
        self.stats.get(field).map_or(0, FieldStats::count)
    }

    /// Fields observed since creation or the last reset, in name order
    pub fn seen_fields(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn is_seen(&self, field: &str) -> bool {
        self.stats.contains_key(field)
    }

    /// Buffered samples, oldest first
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Drop all samples, aggregates and seen fields
    pub fn reset(&mut self) {
        self.samples.clear();
        self.stats.clear();
    }
}
