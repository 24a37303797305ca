//! # Window Duration Labels
//!
//! Charts pick their time span from a fixed set of human-readable labels
//! (`"1s"` .. `"30m"`). A label becomes a sample count by dividing its span by
//! the link's measured average packet delay.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time span selectable for a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DurationLabel {
    OneSecond,
    FiveSeconds,
    TenSeconds,
    FifteenSeconds,
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
    TenMinutes,
    ThirtyMinutes,
}

/// Label string not in the supported set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown duration label '{0}' (expected one of 1s, 5s, 10s, 15s, 30s, 1m, 5m, 10m, 30m)")]
pub struct UnknownDurationLabel(pub String);

impl DurationLabel {
    /// Every label, shortest first
    pub const ALL: [DurationLabel; 9] = [
        DurationLabel::OneSecond,
        DurationLabel::FiveSeconds,
        DurationLabel::TenSeconds,
        DurationLabel::FifteenSeconds,
        DurationLabel::ThirtySeconds,
        DurationLabel::OneMinute,
        DurationLabel::FiveMinutes,
        DurationLabel::TenMinutes,
        DurationLabel::ThirtyMinutes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationLabel::OneSecond => "1s",
            DurationLabel::FiveSeconds => "5s",
            DurationLabel::TenSeconds => "10s",
            DurationLabel::FifteenSeconds => "15s",
            DurationLabel::ThirtySeconds => "30s",
            DurationLabel::OneMinute => "1m",
            DurationLabel::FiveMinutes => "5m",
            DurationLabel::TenMinutes => "10m",
            DurationLabel::ThirtyMinutes => "30m",
        }
    }

    /// Time span covered by the label
    pub fn duration(&self) -> Duration {
        let secs = match self {
            DurationLabel::OneSecond => 1,
            DurationLabel::FiveSeconds => 5,
            DurationLabel::TenSeconds => 10,
            DurationLabel::FifteenSeconds => 15,
            DurationLabel::ThirtySeconds => 30,
            DurationLabel::OneMinute => 60,
            DurationLabel::FiveMinutes => 5 * 60,
            DurationLabel::TenMinutes => 10 * 60,
            DurationLabel::ThirtyMinutes => 30 * 60,
        };
        Duration::from_secs(secs)
    }

    /// Number of samples spanning this label at the given packet delay
    ///
    /// Always at least 1, since a count of 0 means "entire buffer" to
    /// [`RollingBuffer::window`](super::buffer::RollingBuffer::window).
    ///
    /// # Examples
    ///
    /// ```
    /// use telemetry_dash::telemetry::window::DurationLabel;
    ///
    /// assert_eq!(DurationLabel::ThirtyMinutes.sample_count(200.0), 9000);
    /// ```
    pub fn sample_count(&self, avg_delay_ms: f64) -> usize {
        if !avg_delay_ms.is_finite() || avg_delay_ms <= 0.0 {
            return 1;
        }
        let span_ms = self.duration().as_secs_f64() * 1000.0;
        ((span_ms / avg_delay_ms).round() as usize).max(1)
    }
}

impl Default for DurationLabel {
    fn default() -> Self {
        DurationLabel::ThirtyMinutes
    }
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationLabel {
    type Err = UnknownDurationLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DurationLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownDurationLabel(s.to_string()))
    }
}

impl TryFrom<String> for DurationLabel {
    type Error = UnknownDurationLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DurationLabel> for String {
    fn from(label: DurationLabel) -> Self {
        label.as_str().to_string()
    }
}
