//! # Wire Format Module
//!
//! Line-oriented telemetry format spoken by the vehicle's transmitter.
//!
//! This module handles:
//! - Direct telemetry lines (`TELEM<seq>;NAME=VALUE;...`)
//! - Radio-relay-wrapped lines (`+RCV=...TELEM...`)
//! - Tolerant `name=value` extraction into a [`protocol::Sample`]
//! - Encoding samples back into telemetry lines

pub mod protocol;
pub mod parser;
pub mod encoder;
