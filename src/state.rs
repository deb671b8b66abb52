use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::charts::{self, ChartOutcome, Tab};
use crate::config::DashboardConfig;
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::data::pivot::PivotTable;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Where the dataset came from.
    pub source: Option<PathBuf>,

    pub config: DashboardConfig,

    /// Chart results for the current dataset, in display order.
    pub outcomes: Vec<ChartOutcome>,

    pub active_tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            dataset: None,
            source: None,
            config,
            outcomes: Vec::new(),
            active_tab: Tab::Basic,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and evaluate every chart once.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.outcomes = charts::evaluate_all(&dataset, &self.config);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Forget the current dataset and its charts.
    pub fn clear(&mut self) {
        self.dataset = None;
        self.source = None;
        self.outcomes.clear();
    }

    /// Load a file; on failure the previous dataset is dropped and the
    /// error becomes the status message.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?} from {}",
                    dataset.len(),
                    dataset.column_names(),
                    path.display()
                );
                self.set_dataset(dataset);
                self.source = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.clear();
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Outcomes belonging to the active tab.
    pub fn active_outcomes(&self) -> impl Iterator<Item = &ChartOutcome> {
        let tab = self.active_tab;
        self.outcomes.iter().filter(move |o| o.tab == tab)
    }

    /// Write a pivot table as CSV.
    pub fn export_pivot(pivot: &PivotTable, path: &Path) -> Result<()> {
        let bytes = pivot.to_csv_bytes()?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!(
            "Exported {}x{} pivot to {}",
            pivot.row_labels.len(),
            pivot.column_labels.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::charts::ChartStatus;
    use crate::charts::test_support::SALES;

    fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loading_evaluates_every_chart() {
        let file = write_temp(SALES, ".csv");
        let mut state = AppState::default();
        state.load_path(file.path());

        assert!(state.status_message.is_none());
        assert_eq!(state.source.as_deref(), Some(file.path()));
        assert_eq!(state.outcomes.len(), charts::REGISTRY.len());
        assert_eq!(state.active_outcomes().count(), 7);
    }

    #[test]
    fn failed_load_clears_previous_dataset() {
        let good = write_temp(SALES, ".csv");
        let bad = write_temp("a,b\n1,2,3\n", ".csv");
        let mut state = AppState::default();
        state.load_path(good.path());
        state.load_path(bad.path());

        assert!(state.dataset.is_none());
        assert!(state.outcomes.is_empty());
        let msg = state.status_message.unwrap();
        assert!(msg.starts_with("Error:"), "{msg}");
    }

    #[test]
    fn exported_pivot_is_readable_csv() {
        let file = write_temp(SALES, ".csv");
        let mut state = AppState::default();
        state.load_path(file.path());
        let pivot = state
            .outcomes
            .iter()
            .find_map(|o| match &o.status {
                ChartStatus::Rendered(charts::ChartArtifact::Extras { pivot, .. }) => {
                    pivot.clone()
                }
                _ => None,
            })
            .unwrap();

        let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        AppState::export_pivot(&pivot, out.path()).unwrap();
        let text = std::fs::read_to_string(out.path()).unwrap();
        assert!(text.starts_with("product_name,Garden,Tools,Toys"), "{text}");
    }
}
