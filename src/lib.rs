//! # Telemetry Dash Library
//!
//! Live telemetry from a radio-linked vehicle, kept as rolling statistics.
//!
//! This library receives newline-delimited telemetry over a LoRa serial link
//! (or a replayed capture, or a simulator), parses and enriches each packet,
//! and holds the last hour of samples with per-field min/max/average for
//! display consumers.

pub mod config;
pub mod error;
pub mod layout;
pub mod serial;
pub mod source;
pub mod telemetry;
pub mod wire;
pub mod worker;
