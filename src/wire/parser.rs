//! # Telemetry Line Parser
//!
//! Turns one raw line into a [`Sample`].
//!
//! Parsing is a best-effort scan rather than a strict grammar: every
//! `<letters>=<number>` fragment terminated by `;` or end of line becomes a
//! field, and anything else in the body is skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::protocol::{Sample, RELAY_MARKER, TELEMETRY_MARKER};

/// `name=value` fragment, value is an optionally signed decimal
static FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]+)=([+-]?[0-9]+(?:\.[0-9]+)?)(?:;|$)")
        .expect("field pattern must compile")
});

/// Reasons a line is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Line starts with neither the telemetry nor the relay marker
    #[error("line does not start with a known marker")]
    UnknownMarker,

    /// Relay line without an embedded telemetry body
    #[error("relay line carries no telemetry marker")]
    MissingEmbeddedMarker,

    /// Raw bytes were not valid UTF-8 (garbled transmission)
    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

/// Parse a raw line straight off the transport
///
/// # Arguments
///
/// * `raw` - Line bytes, with or without the trailing newline
///
/// # Errors
///
/// Returns `ParseError::InvalidEncoding` for garbled bytes, otherwise the
/// errors of [`parse_line`].
pub fn parse_bytes(raw: &[u8]) -> Result<Sample, ParseError> {
    let line = std::str::from_utf8(raw).map_err(|_| ParseError::InvalidEncoding)?;
    parse_line(line)
}

/// Parse a telemetry line
///
/// # Arguments
///
/// * `line` - Direct (`TELEM...`) or relayed (`+RCV=...TELEM...`) line
///
/// # Returns
///
/// * `Result<Sample, ParseError>` - Extracted fields; duplicate names keep the
///   last occurrence
///
/// # Examples
///
/// ```
/// use telemetry_dash::wire::parser::parse_line;
///
/// let sample = parse_line("TELEM1;RPM=1800.00;BV=11.80\n").unwrap();
/// assert_eq!(sample.get("RPM"), Some(1800.0));
/// assert_eq!(sample.get("BV"), Some(11.8));
/// ```
pub fn parse_line(line: &str) -> Result<Sample, ParseError> {
    let body = telemetry_body(line)?;
    let body = body.trim_end_matches(['\r', '\n']);

    Ok(FIELD_PATTERN
        .captures_iter(body)
        .filter_map(|caps| {
            // Overlong digit runs overflow to infinity; treat them as malformed
            let value = caps[2].parse::<f64>().ok().filter(|v| v.is_finite())?;
            Some((caps[1].to_string(), value))
        })
        .collect())
}

/// Locate the telemetry body within a line
fn telemetry_body(line: &str) -> Result<&str, ParseError> {
    if line.starts_with(TELEMETRY_MARKER) {
        return Ok(line);
    }

    if line.starts_with(RELAY_MARKER) {
        return line
            .find(TELEMETRY_MARKER)
            .map(|start| &line[start..])
            .ok_or(ParseError::MissingEmbeddedMarker);
    }

    Err(ParseError::UnknownMarker)
}
