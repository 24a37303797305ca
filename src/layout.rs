//! # Chart Layout
//!
//! Saved chart arrangement, stored as JSON:
//!
//! ```json
//! {"graphs":[{"fields":["RPM","Speed"],"limit":"30m"}]}
//! ```
//!
//! A graph without a `limit` plots the default window.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::ChartConfig;
use crate::error::Result;
use crate::telemetry::window::DurationLabel;

/// One chart in a saved layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<DurationLabel>,
}

/// All charts in a saved layout, top to bottom
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub graphs: Vec<GraphSettings>,
}

impl Layout {
    /// Read a layout file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid layout,
    /// including an unknown `limit` label.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let layout: Layout = serde_json::from_str(&contents)?;
        info!("Loaded {} chart(s) from {}", layout.graphs.len(), path.display());
        Ok(layout)
    }

    /// Write the layout, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn from_charts(charts: &[ChartConfig]) -> Self {
        Self {
            graphs: charts
                .iter()
                .map(|c| GraphSettings {
                    fields: c.fields.clone(),
                    limit: Some(c.window),
                })
                .collect(),
        }
    }

    /// Chart definitions, with missing limits filled by the default window
    pub fn to_charts(&self) -> Vec<ChartConfig> {
        self.graphs
            .iter()
            .map(|g| ChartConfig {
                fields: g.fields.clone(),
                window: g.limit.unwrap_or_default(),
            })
            .collect()
    }
}
