//! # Sample Enricher
//!
//! Derives synthetic fields from a freshly parsed sample:
//!
//! - `delta`: milliseconds since the previous packet, dropped when it looks
//!   like a link stall (`>= 3 ×` the expected packet delay)
//! - `LAT`/`LON`: NMEA `DDMM.MMMM` converted to signed decimal degrees
//! - `Slope`: road slope from the accelerometer's X and Z components

use std::time::{Duration, Instant};

use crate::wire::protocol::{
    Sample, FIELD_ACCX, FIELD_ACCZ, FIELD_DELTA, FIELD_LAT, FIELD_LON, FIELD_SLOPE,
};

/// Inter-arrival times at or above this multiple of the expected delay are outliers
pub const OUTLIER_FACTOR: u32 = 3;

/// Adds derived fields to parsed samples
#[derive(Debug, Clone, Copy)]
pub struct SampleEnricher {
    expected_packet_delay: Duration,
}

impl SampleEnricher {
    /// Creates an enricher for a link sending one packet every `expected_packet_delay`
    pub fn new(expected_packet_delay: Duration) -> Self {
        Self {
            expected_packet_delay,
        }
    }

    pub fn expected_packet_delay(&self) -> Duration {
        self.expected_packet_delay
    }

    /// Enrich a parsed sample
    ///
    /// # Arguments
    ///
    /// * `raw` - Sample straight from the parser
    /// * `previous_arrival` - Arrival time of the previous packet, `None` for the first
    /// * `now` - Arrival time of this packet
    ///
    /// # Returns
    ///
    /// * `(Sample, Instant)` - Enriched sample and the new arrival time, which is
    ///   always `now` even when the delta was discarded
    pub fn enrich(
        &self,
        raw: Sample,
        previous_arrival: Option<Instant>,
        now: Instant,
    ) -> (Sample, Instant) {
        let mut values = raw.into_values();

        if let Some(previous) = previous_arrival {
            let delta = now.saturating_duration_since(previous);
            if delta < self.expected_packet_delay * OUTLIER_FACTOR {
                values.insert(FIELD_DELTA.to_string(), delta.as_micros() as f64 / 1000.0);
            }
        }

        if let Some(lat) = values.get(FIELD_LAT).copied() {
            values.insert(FIELD_LAT.to_string(), nmea_to_decimal(lat));
            if let Some(lon) = values.get(FIELD_LON).copied() {
                values.insert(FIELD_LON.to_string(), -nmea_to_decimal(lon));
            }
        }

        let accz = values.get(FIELD_ACCZ).copied();
        let accx = values.get(FIELD_ACCX).copied();
        if let (Some(accz), Some(accx)) = (accz, accx) {
            let slope = -accz.atan2(-accx).to_degrees();
            values.insert(FIELD_SLOPE.to_string(), slope);
        }

        (Sample::from(values), now)
    }
}

/// Convert an NMEA `DDMM.MMMM` coordinate to signed decimal degrees
///
/// # Examples
///
/// ```
/// use telemetry_dash::telemetry::enricher::nmea_to_decimal;
///
/// let lat = nmea_to_decimal(3947.3551);
/// assert!((lat - 39.78892).abs() < 1e-5);
/// ```
pub fn nmea_to_decimal(value: f64) -> f64 {
    let magnitude = value.abs();
    let degrees = (magnitude / 100.0).floor();
    let minutes = magnitude % 100.0;
    let decimal = degrees + minutes / 60.0;

    if value < 0.0 {
        -decimal
    } else {
        decimal
    }
}
