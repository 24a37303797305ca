//! # Field Summaries
//!
//! Read-only snapshots of buffer state in the shape display consumers want:
//! a numeric panel per field and a value series per chart.

use std::fmt;
use std::time::Duration;

use super::buffer::RollingBuffer;
use super::fields;
use super::window::DurationLabel;

/// Last/min/avg/max of one field at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub field: String,
    pub last: Option<f64>,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub unit: &'static str,
}

impl FieldSummary {
    pub fn from_buffer(buffer: &RollingBuffer, field: &str) -> Self {
        Self {
            field: field.to_string(),
            last: buffer.last(field),
            min: buffer.min(field),
            avg: buffer.avg(field),
            max: buffer.max(field),
            unit: fields::unit_of(field),
        }
    }

    /// True once the field has at least one live value
    pub fn has_data(&self) -> bool {
        self.last.is_some()
    }
}

impl fmt::Display for FieldSummary {
    /// Absent values print as zero; this is presentation only
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:9.2}{} min {:9.2} avg ({:9.2}) max {:9.2}",
            self.field,
            self.last.unwrap_or(0.0),
            self.unit,
            self.min.unwrap_or(0.0),
            self.avg.unwrap_or(0.0),
            self.max.unwrap_or(0.0),
        )
    }
}

/// Series for every field on one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub window: DurationLabel,
    pub series: Vec<(String, Vec<Option<f64>>)>,
}

impl ChartSnapshot {
    pub fn from_buffer(
        buffer: &RollingBuffer,
        fields: &[String],
        window: DurationLabel,
        fallback_delay: Duration,
    ) -> Self {
        let count = buffer.samples_for(window, fallback_delay);
        Self {
            window,
            series: fields
                .iter()
                .map(|f| (f.clone(), buffer.window(f, count)))
                .collect(),
        }
    }

    /// Number of points per series
    pub fn points(&self) -> usize {
        self.series.first().map_or(0, |(_, values)| values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::protocol::Sample;

    fn sample(fields: &[(&str, f64)]) -> Sample {
        fields.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_summary_of_unseen_field() {
        let buffer = RollingBuffer::new(4);
        let summary = FieldSummary::from_buffer(&buffer, "RPM");

        assert!(!summary.has_data());
        assert_eq!(summary.avg, None);
        assert_eq!(summary.unit, "RPM");
        assert_eq!(
            summary.to_string(),
            "RPM:      0.00RPM min      0.00 avg (     0.00) max      0.00"
        );
    }

    #[test]
    fn test_summary_values() {
        let mut buffer = RollingBuffer::new(4);
        buffer.add(sample(&[("BV", 11.8)]));
        buffer.add(sample(&[("BV", 12.2)]));

        let summary = FieldSummary::from_buffer(&buffer, "BV");
        assert_eq!(summary.last, Some(12.2));
        assert_eq!(summary.min, Some(11.8));
        assert_eq!(summary.max, Some(12.2));
        assert!((summary.avg.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(summary.unit, "V");
    }

    #[test]
    fn test_chart_snapshot_uses_shared_count() {
        let mut buffer = RollingBuffer::new(100);
        for i in 0..30 {
            buffer.add(sample(&[("RPM", i as f64), ("delta", 1000.0)]));
        }

        let fields = vec!["RPM".to_string(), "Speed".to_string()];
        let chart = ChartSnapshot::from_buffer(
            &buffer,
            &fields,
            DurationLabel::FiveSeconds,
            Duration::from_millis(200),
        );

        assert_eq!(chart.points(), 5);
        assert_eq!(chart.series[1].1, vec![None; 5]);
        assert_eq!(chart.series[0].1.last(), Some(&Some(29.0)));
    }
}
