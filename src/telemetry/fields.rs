//! # Field Registry
//!
//! Presentation metadata for fields the vehicle is known to send.
//!
//! The buffer itself is schema-less; this table only tells consumers which
//! fields to show by default and what unit to print next to them.

/// Metadata for a known telemetry field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name as it appears on the wire
    pub name: &'static str,
    /// Display unit, empty when unitless
    pub unit: &'static str,
    /// Shown in summary panels by default
    pub displayed: bool,
}

/// Known fields, in display order
pub const KNOWN_FIELDS: &[FieldInfo] = &[
    FieldInfo { name: "FUEL", unit: "MPG", displayed: true },
    FieldInfo { name: "RPM", unit: "RPM", displayed: true },
    FieldInfo { name: "Speed", unit: "MPH", displayed: true },
    FieldInfo { name: "Slope", unit: "°", displayed: true },
    FieldInfo { name: "BV", unit: "V", displayed: true },
    FieldInfo { name: "Throttle", unit: "%", displayed: true },
    FieldInfo { name: "OXY", unit: "", displayed: true },
    FieldInfo { name: "INJ", unit: "", displayed: true },
    FieldInfo { name: "LAT", unit: "°", displayed: false },
    FieldInfo { name: "LON", unit: "°", displayed: false },
    FieldInfo { name: "delta", unit: "ms", displayed: false },
];

/// Look up a field's metadata
pub fn lookup(name: &str) -> Option<&'static FieldInfo> {
    KNOWN_FIELDS.iter().find(|f| f.name == name)
}

/// Display unit for a field, empty for unknown or unitless fields
pub fn unit_of(name: &str) -> &'static str {
    lookup(name).map(|f| f.unit).unwrap_or("")
}

/// Fields shown in summary panels by default
pub fn displayed_fields() -> impl Iterator<Item = &'static str> {
    KNOWN_FIELDS.iter().filter(|f| f.displayed).map(|f| f.name)
}
