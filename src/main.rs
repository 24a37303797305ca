//! # Telemetry Dash
//!
//! Receive vehicle telemetry over a LoRa radio link and keep rolling
//! statistics for the dashboard.
//!
//! Usage: `telemetry-dash [CONFIG]` (defaults to `config/default.toml`).

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use telemetry_dash::config::{ChartConfig, Config, LoggingConfig, RegionConfig};
use telemetry_dash::layout::Layout;
use telemetry_dash::source;
use telemetry_dash::telemetry::fields::displayed_fields;
use telemetry_dash::telemetry::summary::{ChartSnapshot, FieldSummary};
use telemetry_dash::telemetry::{RollingBuffer, TelemetryIngestPipeline};
use telemetry_dash::wire::protocol::{FIELD_LAT, FIELD_LON};
use telemetry_dash::worker::IngestWorker;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Interval between summary panel log lines
const SUMMARY_INTERVAL: Duration = Duration::from_secs(5);

const LOG_FILE_PREFIX: &str = "telemetry-dash.log";

/// Main entry point for Telemetry Dash
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration and optional chart layout
///    - Set up logging (stdout, plus daily files when configured)
///    - Open the configured line source and spawn the ingest worker
///
/// 2. **Main Loop**
///    - Every `display.refresh_ms`: snapshot each chart window, check the GPS
///      fix against the configured region
///    - Every few seconds: log the summary panel for displayed fields
///    - Exit when the source is exhausted or on Ctrl+C
///
/// 3. **Graceful Shutdown**
///    - Stop and join the ingest worker
///    - Log accepted/rejected totals
///
/// # Errors
///
/// Returns error if the configuration or layout cannot be loaded, or the
/// source cannot be opened.
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);
    info!("Telemetry Dash v{} starting...", env!("CARGO_PKG_VERSION"));

    let charts = resolve_charts(&config)?;
    let fallback_delay = Duration::from_millis(config.telemetry.expected_packet_delay_ms);

    let pipeline = TelemetryIngestPipeline::from_config(&config.telemetry);
    let source = source::open_configured(&config).await?;
    let worker = IngestWorker::spawn(source, pipeline);
    let buffer = worker.buffer().clone();

    let mut refresh = interval(Duration::from_millis(config.display.refresh_ms));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summary = interval(SUMMARY_INTERVAL);
    summary.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut outside_region = false;

    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if !worker.is_running() {
                    info!("Ingest worker finished, exiting");
                    break;
                }

                buffer.read(|b| {
                    for snapshot in snapshot_charts(b, &charts, fallback_delay) {
                        debug!(
                            "Chart [{}] {}: {} points",
                            snapshot.window,
                            snapshot.series.iter().map(|(f, _)| f.as_str()).collect::<Vec<_>>().join(", "),
                            snapshot.points()
                        );
                    }

                    if let Some(region) = &config.region {
                        if let Some(outside) = region_transition(region, b, outside_region) {
                            outside_region = outside;
                        }
                    }
                });
            }

            _ = summary.tick() => {
                buffer.read(|b| {
                    for line in summary_panel(b) {
                        info!("{}", line);
                    }
                });
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stats = worker.shutdown().await?;
    info!(
        "Total packets: {} accepted, {} rejected",
        stats.accepted, stats.rejected
    );

    Ok(())
}

/// Install the global subscriber; the returned guard flushes the log file on drop
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Charts to keep up to date: layout file, then `[[charts]]`, then one chart
/// of every displayed field
fn resolve_charts(config: &Config) -> Result<Vec<ChartConfig>> {
    if let Some(path) = &config.display.layout_file {
        let layout = Layout::load(path)
            .with_context(|| format!("Failed to load layout from {}", path.display()))?;
        return Ok(layout.to_charts());
    }

    if !config.charts.is_empty() {
        return Ok(config.charts.clone());
    }

    Ok(vec![ChartConfig {
        fields: displayed_fields().map(str::to_string).collect(),
        window: Default::default(),
    }])
}

fn snapshot_charts(
    buffer: &RollingBuffer,
    charts: &[ChartConfig],
    fallback_delay: Duration,
) -> Vec<ChartSnapshot> {
    charts
        .iter()
        .map(|c| ChartSnapshot::from_buffer(buffer, &c.fields, c.window, fallback_delay))
        .collect()
}

/// Summary lines for displayed fields that have data
fn summary_panel(buffer: &RollingBuffer) -> Vec<String> {
    displayed_fields()
        .map(|f| FieldSummary::from_buffer(buffer, f))
        .filter(FieldSummary::has_data)
        .map(|s| s.to_string())
        .collect()
}

/// Compare the latest fix against `region`, warning when the vehicle leaves
///
/// Returns the new outside/inside state, or `None` without a fix.
fn region_transition(region: &RegionConfig, buffer: &RollingBuffer, was_outside: bool) -> Option<bool> {
    let lat = buffer.last(FIELD_LAT)?;
    let lon = buffer.last(FIELD_LON)?;
    let outside = !region.contains(lat, lon);

    if outside && !was_outside {
        warn!(
            "GPS fix {:.5}, {:.5} is outside region {}",
            lat, lon, region.name
        );
    } else if !outside && was_outside {
        info!("GPS fix back inside region {}", region.name);
    }
    Some(outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_dash::telemetry::window::DurationLabel;
    use telemetry_dash::wire::protocol::Sample;

    fn gps_sample(lat: f64, lon: f64) -> Sample {
        [(FIELD_LAT.to_string(), lat), (FIELD_LON.to_string(), lon)]
            .into_iter()
            .collect()
    }

    fn test_region() -> RegionConfig {
        RegionConfig {
            name: "track".to_string(),
            min_lat: 42.0,
            max_lat: 43.0,
            min_lon: -72.0,
            max_lon: -71.0,
        }
    }

    #[test]
    fn test_default_charts_cover_displayed_fields() {
        let charts = resolve_charts(&Config::default()).unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].window, DurationLabel::ThirtyMinutes);
        assert!(charts[0].fields.iter().any(|f| f == "RPM"));
        assert!(!charts[0].fields.iter().any(|f| f == "delta"));
    }

    #[test]
    fn test_configured_charts_take_precedence() {
        let mut config = Config::default();
        config.charts = vec![ChartConfig {
            fields: vec!["BV".to_string()],
            window: DurationLabel::OneMinute,
        }];
        assert_eq!(resolve_charts(&config).unwrap(), config.charts);
    }

    #[test]
    fn test_missing_layout_file_is_error() {
        let mut config = Config::default();
        config.display.layout_file = Some("/nonexistent/layout.json".into());
        assert!(resolve_charts(&config).is_err());
    }

    #[test]
    fn test_region_transition() {
        let region = test_region();
        let mut buffer = RollingBuffer::new(8);
        assert_eq!(region_transition(&region, &buffer, false), None);

        buffer.add(gps_sample(42.5, -71.5));
        assert_eq!(region_transition(&region, &buffer, false), Some(false));

        buffer.add(gps_sample(44.0, -71.5));
        assert_eq!(region_transition(&region, &buffer, false), Some(true));
    }

    #[test]
    fn test_summary_panel_skips_fields_without_data() {
        let mut buffer = RollingBuffer::new(8);
        buffer.add([("RPM".to_string(), 1500.0)].into_iter().collect());

        let panel = summary_panel(&buffer);
        assert_eq!(panel.len(), 1);
        assert!(panel[0].starts_with("RPM:"));
    }

    #[test]
    fn test_snapshot_charts_one_per_chart() {
        let mut buffer = RollingBuffer::new(8);
        buffer.add([("RPM".to_string(), 1500.0)].into_iter().collect());

        let charts = vec![
            ChartConfig { fields: vec!["RPM".to_string()], window: DurationLabel::OneSecond },
            ChartConfig { fields: vec!["BV".to_string()], window: DurationLabel::OneMinute },
        ];
        let snapshots = snapshot_charts(&buffer, &charts, Duration::from_millis(200));
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].series[0].1, vec![Some(1500.0)]);
        assert_eq!(snapshots[1].series[0].1, vec![None]);
    }
}
