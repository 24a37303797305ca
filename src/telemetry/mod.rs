//! # Telemetry Module
//!
//! Ingestion and rolling statistics for the vehicle's telemetry stream.
//!
//! This module handles:
//! - Deriving timing, GPS and slope fields from parsed packets
//! - Holding the last hour of samples in a fixed-capacity FIFO
//! - Maintaining per-field min/max/average incrementally
//! - Serving windowed and scalar queries to display consumers

pub mod fields;
pub mod enricher;
pub mod stats;
pub mod buffer;
pub mod window;
pub mod shared;
pub mod summary;
pub mod pipeline;

pub use buffer::RollingBuffer;
pub use pipeline::{IngestResult, IngestStats, TelemetryIngestPipeline};
pub use shared::SharedBuffer;
