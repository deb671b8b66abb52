/// Chart blocks: each one checks its required columns and either computes
/// a [`ChartArtifact`] or explains why it cannot.
///
/// ```text
///   Dataset ──► block(&Dataset, &DashboardConfig)
///                  │
///                  ├─ Ok(artifact)            → Rendered
///                  ├─ Err(MissingColumns)     → Skipped (info)
///                  └─ Err(other ChartError)   → Failed  (inline error)
/// ```
///
/// Blocks share no state; [`evaluate_all`] runs them in display order.

pub mod advanced;
pub mod artifact;
pub mod basic;
pub mod geometry;
pub mod multivariate;

use std::fmt;

use crate::config::DashboardConfig;
use crate::data::model::{ColumnError, Dataset};

pub use artifact::ChartArtifact;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    /// Required columns are absent; shown as an informational skip.
    #[error("{0}")]
    MissingColumns(String),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error("no rows with values for {0}")]
    NoData(String),
    #[error("{0}")]
    Invalid(String),
}

impl ChartError {
    /// Notice for errors meaning the dataset lacks a usable input column;
    /// `None` for genuine computation failures.
    pub fn skip_notice(&self) -> Option<String> {
        match self {
            ChartError::MissingColumns(msg) => Some(msg.clone()),
            ChartError::Column(ColumnError::Missing(name)) => Some(format!("Need column '{name}'")),
            ChartError::Column(ColumnError::NotNumeric { name, kind }) => {
                Some(format!("Need numeric '{name}' column (found {kind})"))
            }
            ChartError::NoData(_) | ChartError::Invalid(_) => None,
        }
    }
}

/// Skip unless every named column is present.
pub fn require(dataset: &Dataset, columns: &[&str]) -> Result<(), ChartError> {
    if dataset.has_columns(columns) {
        Ok(())
    } else {
        Err(ChartError::MissingColumns(format!(
            "Need columns: {}",
            columns.join(", ")
        )))
    }
}

/// Skip with a custom message unless `ok` holds.
pub fn require_that(ok: bool, message: &str) -> Result<(), ChartError> {
    if ok {
        Ok(())
    } else {
        Err(ChartError::MissingColumns(message.to_string()))
    }
}

/// Second measure for charts against `units_sold`: `revenue` when present,
/// otherwise the first other numeric column.
pub fn companion_measure(dataset: &Dataset) -> Option<String> {
    if let Some(col) = dataset.column("revenue") {
        return Some(col.name.clone());
    }
    dataset
        .numeric_column_names()
        .into_iter()
        .find(|c| c != "units_sold")
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Display tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Basic,
    Advanced,
    Multivariate,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Basic, Tab::Advanced, Tab::Multivariate];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Basic => "📊 Basic",
            Tab::Advanced => "📈 Advanced",
            Tab::Multivariate => "🔬 Multivariate / Special",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Tab::Basic => "Basic Visualizations",
            Tab::Advanced => "Advanced Visualizations",
            Tab::Multivariate => "Multivariate & Special Visualizations",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

pub type ChartFn = fn(&Dataset, &DashboardConfig) -> Result<ChartArtifact, ChartError>;

/// One chart block.
pub struct ChartDef {
    pub tab: Tab,
    pub title: &'static str,
    pub build: ChartFn,
}

pub const REGISTRY: &[ChartDef] = &[
    // Basic
    ChartDef {
        tab: Tab::Basic,
        title: "Bar: Units Sold per Product",
        build: basic::units_per_product,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Line: Units Sold Over Time",
        build: basic::units_over_time,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Pie: Units Sold by Category",
        build: basic::units_by_category_pie,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Histogram: Units Sold Distribution",
        build: basic::units_histogram,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Stacked Bar: Units Sold per Product (by category)",
        build: basic::stacked_product_category,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Strip Plot: Units Sold by Category",
        build: basic::strip_by_category,
    },
    ChartDef {
        tab: Tab::Basic,
        title: "Joint Plot: sale_date_num vs units_sold",
        build: basic::joint_regression,
    },
    // Advanced
    ChartDef {
        tab: Tab::Advanced,
        title: "Scatter: Units Sold vs Revenue (or other numeric)",
        build: advanced::units_vs_revenue,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Hexbin: Density between two numeric columns",
        build: advanced::hexbin_density,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "KDE: units_sold distribution",
        build: advanced::units_kde,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Box: units_sold by Category",
        build: advanced::box_by_category,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Violin: Units Sold by Category",
        build: advanced::violin_by_category,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Jointplot: sale_date_num vs units_sold (hex)",
        build: advanced::joint_hex,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Pairplot: Numeric Relationships",
        build: advanced::pairplot,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Heatmap: Correlation Matrix",
        build: advanced::correlation_heatmap,
    },
    ChartDef {
        tab: Tab::Advanced,
        title: "Stripplot: Units Sold by Product Line",
        build: advanced::strip_by_product_line,
    },
    // Multivariate / Special
    ChartDef {
        tab: Tab::Multivariate,
        title: "3D Scatter: units_sold vs revenue vs first numeric",
        build: multivariate::scatter_3d,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Treemap: Units Sold by Category",
        build: multivariate::treemap_by_category,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Hexbin (alternate): density plot for two numeric columns",
        build: multivariate::hexbin_alternate,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Andrews Curves (multivariate by category)",
        build: multivariate::andrews_curves,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Parallel Coordinates (first numeric columns)",
        build: multivariate::parallel_coordinates,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Swarm: Units Sold by Category (swarm)",
        build: multivariate::swarm_by_category,
    },
    ChartDef {
        tab: Tab::Multivariate,
        title: "Extras: Correlation & Pivot Download",
        build: multivariate::extras,
    },
];

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChartStatus {
    Rendered(ChartArtifact),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutcome {
    pub tab: Tab,
    pub title: &'static str,
    pub status: ChartStatus,
}

/// Run one block, folding its error into a status.
pub fn evaluate(def: &ChartDef, dataset: &Dataset, config: &DashboardConfig) -> ChartOutcome {
    let status = match (def.build)(dataset, config) {
        Ok(artifact) => {
            log::debug!("{}: {}", def.title, artifact.kind());
            ChartStatus::Rendered(artifact)
        }
        Err(e) => match e.skip_notice() {
            Some(msg) => {
                log::debug!("{}: skipped ({msg})", def.title);
                ChartStatus::Skipped(msg)
            }
            None => {
                log::warn!("{}: {e}", def.title);
                ChartStatus::Failed(format!("{} error: {e}", def.title))
            }
        },
    };
    ChartOutcome {
        tab: def.tab,
        title: def.title,
        status,
    }
}

/// Run every block in display order.
pub fn evaluate_all(dataset: &Dataset, config: &DashboardConfig) -> Vec<ChartOutcome> {
    let outcomes: Vec<ChartOutcome> = REGISTRY
        .iter()
        .map(|def| evaluate(def, dataset, config))
        .collect();

    let rendered = outcomes
        .iter()
        .filter(|o| matches!(o.status, ChartStatus::Rendered(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o.status, ChartStatus::Skipped(_)))
        .count();
    log::info!(
        "Evaluated {} charts: {rendered} rendered, {skipped} skipped, {} failed",
        outcomes.len(),
        outcomes.len() - rendered - skipped
    );
    outcomes
}


#[cfg(test)]
mod tests {
    use super::test_support::{from_csv, sales};
    use super::*;

    #[test]
    fn registry_covers_three_tabs() {
        assert_eq!(REGISTRY.len(), 23);
        for tab in Tab::ALL {
            assert!(REGISTRY.iter().any(|d| d.tab == tab));
        }
    }

    #[test]
    fn full_dataset_renders_everything() {
        let outcomes = evaluate_all(&sales(), &DashboardConfig::default());
        for o in &outcomes {
            assert!(
                matches!(o.status, ChartStatus::Rendered(_)),
                "{} -> {:?}",
                o.title,
                o.status
            );
        }
    }

    #[test]
    fn unrelated_columns_skip_every_chart() {
        let ds = from_csv("colour,shape\nred,circle\nblue,square\n");
        for o in evaluate_all(&ds, &DashboardConfig::default()) {
            assert!(
                matches!(o.status, ChartStatus::Skipped(_)),
                "{} -> {:?}",
                o.title,
                o.status
            );
        }
    }

    #[test]
    fn no_numeric_columns_skips_numeric_charts() {
        let ds = from_csv(
            "product_name,category,region\nWidget,Tools,North\nGadget,Toys,South\n",
        );
        let outcomes = evaluate_all(&ds, &DashboardConfig::default());
        assert_eq!(outcomes.len(), REGISTRY.len());
        for o in outcomes {
            assert!(
                matches!(o.status, ChartStatus::Skipped(_)),
                "{} -> {:?}",
                o.title,
                o.status
            );
        }
    }

    #[test]
    fn each_missing_column_yields_a_skip_not_a_failure() {
        let full = sales();
        for drop in full.column_names() {
            let text: String = {
                let keep: Vec<usize> = full
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.name != drop)
                    .map(|(i, _)| i)
                    .collect();
                let mut out = keep
                    .iter()
                    .map(|&i| full.columns[i].name.clone())
                    .collect::<Vec<_>>()
                    .join(",");
                out.push('\n');
                for row in 0..full.len() {
                    let line = keep
                        .iter()
                        .map(|&i| full.cell(row, i).to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push_str(&line);
                    out.push('\n');
                }
                out
            };
            let ds = from_csv(&text);
            for o in evaluate_all(&ds, &DashboardConfig::default()) {
                assert!(
                    !matches!(o.status, ChartStatus::Failed(_)),
                    "dropping {drop}: {} -> {:?}",
                    o.title,
                    o.status
                );
            }
        }
    }

    #[test]
    fn text_measure_is_skipped() {
        let ds = from_csv("category,units_sold\nTools,lots\nToys,few\n");
        let outcomes = evaluate_all(&ds, &DashboardConfig::default());
        let pie = outcomes
            .iter()
            .find(|o| o.title.starts_with("Pie"))
            .unwrap();
        let ChartStatus::Skipped(msg) = &pie.status else {
            panic!("expected skip, got {:?}", pie.status);
        };
        assert_eq!(msg, "Need numeric 'units_sold' column (found text)");
        let bar = outcomes
            .iter()
            .find(|o| o.title.starts_with("Bar"))
            .unwrap();
        assert!(matches!(bar.status, ChartStatus::Skipped(_)));
    }

    #[test]
    fn text_measures_with_no_numeric_columns_never_fail() {
        let ds = from_csv(
            "product_name,category,units_sold,sale_date_num\n\
             Widget,Tools,lots,x\n\
             Gadget,Toys,few,y\n",
        );
        assert!(ds.numeric_column_names().is_empty());
        for o in evaluate_all(&ds, &DashboardConfig::default()) {
            assert!(
                matches!(o.status, ChartStatus::Skipped(_)),
                "{} -> {:?}",
                o.title,
                o.status
            );
        }
    }

    #[test]
    fn computation_errors_fail_inline_only() {
        let ds = from_csv("category,units_sold\nTools,5\nToys,-9\n");
        let outcomes = evaluate_all(&ds, &DashboardConfig::default());
        let pie = outcomes
            .iter()
            .find(|o| o.title.starts_with("Pie"))
            .unwrap();
        let ChartStatus::Failed(msg) = &pie.status else {
            panic!("expected failure, got {:?}", pie.status);
        };
        assert!(msg.starts_with("Pie: Units Sold by Category error:"), "{msg}");
        let histogram = outcomes
            .iter()
            .find(|o| o.title.starts_with("Histogram"))
            .unwrap();
        assert!(matches!(histogram.status, ChartStatus::Rendered(_)));
    }

    #[test]
    fn column_errors_are_skip_notices() {
        let not_numeric = ChartError::from(ColumnError::NotNumeric {
            name: "sale_date_num".into(),
            kind: crate::data::model::ColumnKind::DateTime,
        });
        assert_eq!(
            not_numeric.skip_notice().as_deref(),
            Some("Need numeric 'sale_date_num' column (found datetime)")
        );
        assert!(ChartError::from(ColumnError::Missing("x".into())).skip_notice().is_some());
        assert!(ChartError::NoData("x".into()).skip_notice().is_none());
        assert!(ChartError::Invalid("x".into()).skip_notice().is_none());
    }

    #[test]
    fn companion_prefers_revenue() {
        assert_eq!(companion_measure(&sales()).as_deref(), Some("revenue"));
        let ds = from_csv("units_sold,price,cost\n1,2,3\n");
        assert_eq!(companion_measure(&ds).as_deref(), Some("price"));
        let ds = from_csv("units_sold,label\n1,a\n");
        assert_eq!(companion_measure(&ds), None);
    }
}
