//! # Telemetry Protocol Constants and Types
//!
//! Core definitions shared by the parser, encoder and the rolling buffer.

use std::collections::BTreeMap;

/// Marker that starts every direct telemetry line
pub const TELEMETRY_MARKER: &str = "TELEM";

/// Marker that starts a line relayed by the LoRa modem
pub const RELAY_MARKER: &str = "+RCV=";

/// Field carrying the inter-packet arrival time in milliseconds
pub const FIELD_DELTA: &str = "delta";

/// Raw latitude (`DDMM.MMMM`), replaced by decimal degrees during enrichment
pub const FIELD_LAT: &str = "LAT";

/// Raw longitude (`DDDMM.MMMM`), replaced by decimal degrees during enrichment
pub const FIELD_LON: &str = "LON";

/// Accelerometer X component
pub const FIELD_ACCX: &str = "ACCX";

/// Accelerometer Z component
pub const FIELD_ACCZ: &str = "ACCZ";

/// Road slope in degrees
pub const FIELD_SLOPE: &str = "Slope";

/// One packet's worth of field values.
///
/// Fields are sparse: each packet carries whatever the vehicle sent. A sample
/// is built once (by the parser, then the enricher) and never mutated after it
/// has been appended to a buffer.
///
/// # Examples
///
/// ```
/// use telemetry_dash::wire::protocol::Sample;
///
/// let sample: Sample = [("RPM".to_string(), 1800.0)].into_iter().collect();
/// assert_eq!(sample.get("RPM"), Some(1800.0));
/// assert_eq!(sample.get("BV"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    values: BTreeMap<String, f64>,
}

impl Sample {
    /// Creates an empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, if this packet carried it
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }

    /// Returns true if this packet carried `field`
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterates `(field, value)` pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterates the field names carried by this sample
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the sample, handing back its values for derivation
    pub fn into_values(self) -> BTreeMap<String, f64> {
        self.values
    }
}

impl From<BTreeMap<String, f64>> for Sample {
    fn from(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, f64)> for Sample {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
