use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "SALES_DASHBOARD_CONFIG";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Tunables for the chart battery. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Bins for the units-sold histogram.
    pub histogram_bins: usize,
    /// Bins for the marginal histograms of the joint plots.
    pub joint_bins: usize,
    /// Hexagons across the x axis of the Advanced-tab hexbin.
    pub hexbin_gridsize: usize,
    /// Hexagons across the x axis of the alternate hexbin.
    pub hexbin_alt_gridsize: usize,
    /// Grid resolution of KDE and violin curves.
    pub kde_points: usize,
    /// Samples along each Andrews curve.
    pub andrews_samples: usize,
    /// Half-width of the strip-plot jitter, in category units.
    pub strip_jitter: f64,
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Numeric columns drawn in parallel coordinates.
    pub parallel_max_columns: usize,
    /// Suggested file name for the pivot download.
    pub pivot_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 12,
            joint_bins: 20,
            hexbin_gridsize: 30,
            hexbin_alt_gridsize: 25,
            kde_points: 200,
            andrews_samples: 200,
            strip_jitter: 0.1,
            preview_rows: 100,
            parallel_max_columns: 4,
            pivot_file_name: "pivot_units_by_product_category.csv".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config from `SALES_DASHBOARD_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
