//! # Telemetry Line Encoder
//!
//! Builds direct telemetry lines in the same shape the vehicle transmits.

use std::fmt::Write;

use super::protocol::TELEMETRY_MARKER;

/// Encode fields into a direct telemetry line
///
/// Values are written with two decimal places, matching the transmitter
/// firmware.
///
/// # Arguments
///
/// * `seq` - Packet sequence number (not a field on the receiving side)
/// * `fields` - `(name, value)` pairs in transmission order
///
/// # Returns
///
/// * `String` - `TELEM<seq>;NAME=VALUE;...\n`
///
/// # Examples
///
/// ```
/// use telemetry_dash::wire::encoder::encode_telemetry_line;
///
/// let line = encode_telemetry_line(1, [("RPM", 1800.0), ("BV", 11.8)]);
/// assert_eq!(line, "TELEM1;RPM=1800.00;BV=11.80\n");
/// ```
pub fn encode_telemetry_line<'a, I>(seq: u64, fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut line = format!("{}{}", TELEMETRY_MARKER, seq);

    for (name, value) in fields {
        // Writing into a String cannot fail
        let _ = write!(line, ";{}={:.2}", name, value);
    }

    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::parser::parse_line;

    #[test]
    fn test_encode_no_fields() {
        assert_eq!(encode_telemetry_line(7, []), "TELEM7\n");
    }

    #[test]
    fn test_encode_rounds_to_two_decimals() {
        let line = encode_telemetry_line(3, [("Speed", 29.996), ("Throttle", 4.0)]);
        assert_eq!(line, "TELEM3;Speed=30.00;Throttle=4.00\n");
    }

    #[test]
    fn test_encoded_line_parses_back() {
        let line = encode_telemetry_line(12, [("RPM", 900.5), ("ACCX", -0.25)]);
        let sample = parse_line(&line).unwrap();

        assert_eq!(sample.get("RPM"), Some(900.5));
        assert_eq!(sample.get("ACCX"), Some(-0.25));
        assert_eq!(sample.len(), 2);
    }
}
