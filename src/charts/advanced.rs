use crate::config::DashboardConfig;
use crate::data::model::Dataset;
use crate::data::stats::{self, box_stats, complete_rows, correlation_matrix, group_values, kde};

use super::artifact::{
    Axes, ChartArtifact, Correlation, HexGrid, JointMain, PairCell, ViolinShape,
};
use super::basic::{category_strip, joint_artifact, joint_points};
use super::geometry::hexbin;
use super::{ChartError, companion_measure, require, require_that};

/// Units against revenue, or the first other numeric column.
pub fn units_vs_revenue(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(ds.has_column("units_sold"), "Need 'units_sold' column")?;
    let Some(y_col) = companion_measure(ds) else {
        return Err(ChartError::MissingColumns(
            "No numeric column to compare with units_sold".into(),
        ));
    };
    let x = ds.numeric_values("units_sold")?;
    let y = ds.numeric_values(&y_col)?;
    let points = pairs(&x, &y);
    if points.is_empty() {
        return Err(ChartError::NoData(format!("units_sold and {y_col}")));
    }
    Ok(ChartArtifact::Scatter {
        axes: Axes::numeric("Units Sold", y_col),
        points,
    })
}

pub fn hexbin_density(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    first_two_hexbin(
        ds,
        cfg.hexbin_gridsize,
        "Need at least 2 numeric columns for hexbin",
    )
}

/// Hexbin of the first two numeric columns.
pub(super) fn first_two_hexbin(
    ds: &Dataset,
    gridsize: usize,
    skip_message: &str,
) -> Result<ChartArtifact, ChartError> {
    let numeric = ds.numeric_column_names();
    require_that(numeric.len() >= 2, skip_message)?;
    let (n1, n2) = (&numeric[0], &numeric[1]);
    let points = pairs(&ds.numeric_values(n1)?, &ds.numeric_values(n2)?);
    let grid = hex_grid(&points, gridsize, &format!("{n1} and {n2}"))?;
    Ok(ChartArtifact::Hexbin {
        axes: Axes::numeric(n1.clone(), n2.clone()),
        grid,
    })
}

fn hex_grid(points: &[[f64; 2]], gridsize: usize, what: &str) -> Result<HexGrid, ChartError> {
    hexbin(points, gridsize).ok_or_else(|| ChartError::NoData(what.to_string()))
}

pub fn units_kde(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(ds.has_column("units_sold"), "No 'units_sold' column for KDE")?;
    let values = stats::finite(&ds.numeric_values("units_sold")?);
    let curve = kde(&values, cfg.kde_points).ok_or_else(|| {
        ChartError::Invalid("KDE needs at least two distinct units_sold values".into())
    })?;
    Ok(ChartArtifact::Density {
        axes: Axes::numeric("units_sold", "Density"),
        curve,
    })
}

pub fn box_by_category(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["category", "units_sold"]),
        "Need 'category' & 'units_sold' for box plot",
    )?;
    let groups = group_values(&ds.labels("category")?, &ds.numeric_values("units_sold")?);
    if groups.is_empty() {
        return Err(ChartError::NoData("category and units_sold".into()));
    }
    let mut labels = Vec::with_capacity(groups.len());
    let mut boxes = Vec::with_capacity(groups.len());
    for (label, values) in groups {
        if let Some(stats) = box_stats(&values) {
            labels.push(label);
            boxes.push(stats);
        }
    }
    Ok(ChartArtifact::BoxPlot {
        axes: Axes::categorical("category", "units_sold", labels),
        boxes,
    })
}

/// Mirrored density per category, each scaled to the same maximum width.
pub fn violin_by_category(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["category", "units_sold"]),
        "Need category & units_sold for violin",
    )?;
    let groups = group_values(&ds.labels("category")?, &ds.numeric_values("units_sold")?);
    if groups.is_empty() {
        return Err(ChartError::NoData("category and units_sold".into()));
    }
    const HALF_WIDTH: f64 = 0.4;
    let mut labels = Vec::with_capacity(groups.len());
    let mut violins = Vec::with_capacity(groups.len());
    for (idx, (label, values)) in groups.into_iter().enumerate() {
        let Some(stats) = box_stats(&values) else {
            continue;
        };
        let pos = idx as f64;
        let (outline, bands) = match kde(&values, cfg.kde_points) {
            Some(curve) => {
                let peak = curve.iter().map(|p| p[1]).fold(0.0, f64::max);
                let scale = if peak > 0.0 { HALF_WIDTH / peak } else { 0.0 };
                let right = curve.iter().map(|p| [pos + p[1] * scale, p[0]]);
                let left: Vec<[f64; 2]> =
                    curve.iter().rev().map(|p| [pos - p[1] * scale, p[0]]).collect();
                let bands = curve
                    .windows(2)
                    .map(|w| {
                        let (w0, w1) = (w[0][1] * scale, w[1][1] * scale);
                        [
                            [pos - w0, w[0][0]],
                            [pos + w0, w[0][0]],
                            [pos + w1, w[1][0]],
                            [pos - w1, w[1][0]],
                        ]
                    })
                    .collect();
                (right.chain(left).collect(), bands)
            }
            // A single distinct value collapses to a flat bar.
            None => (
                vec![
                    [pos - HALF_WIDTH, stats.median],
                    [pos + HALF_WIDTH, stats.median],
                ],
                Vec::new(),
            ),
        };
        labels.push(label.clone());
        violins.push(ViolinShape {
            label,
            outline,
            bands,
            stats,
        });
    }
    Ok(ChartArtifact::Violin {
        axes: Axes::categorical("category", "units_sold", labels),
        violins,
    })
}

/// Hexbin of `(sale_date_num, units_sold)` with marginal histograms.
pub fn joint_hex(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["sale_date_num", "units_sold"]),
        "Need 'sale_date_num' & 'units_sold' columns for jointplot",
    )?;
    let points = joint_points(ds)?;
    let grid = hex_grid(&points, cfg.joint_bins, "sale_date_num and units_sold")?;
    Ok(joint_artifact(&points, JointMain::Hex(grid), cfg))
}

/// Scatter matrix over all numeric columns, rows with any null dropped.
pub fn pairplot(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    let numeric = ds.numeric_column_names();
    require_that(numeric.len() >= 2, "Need 2+ numeric columns for pairplot")?;
    let columns = numeric
        .iter()
        .map(|c| ds.numeric_values(c))
        .collect::<Result<Vec<_>, _>>()?;
    let slices: Vec<&[Option<f64>]> = columns.iter().map(Vec::as_slice).collect();
    let rows = complete_rows(&slices);
    if rows.is_empty() {
        return Err(ChartError::NoData("the numeric columns".into()));
    }
    let column = |i: usize| rows.iter().map(|r| r[i]).collect::<Vec<f64>>();
    let cells = (0..numeric.len())
        .map(|r| {
            (0..numeric.len())
                .map(|c| {
                    if r == c {
                        PairCell::Histogram(stats::histogram(&column(c), cfg.histogram_bins))
                    } else {
                        PairCell::Scatter(rows.iter().map(|row| [row[c], row[r]]).collect())
                    }
                })
                .collect()
        })
        .collect();
    Ok(ChartArtifact::PairGrid {
        columns: numeric,
        cells,
    })
}

pub fn correlation_heatmap(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    let numeric = ds.numeric_column_names();
    require_that(numeric.len() >= 2, "Not enough numeric columns for heatmap")?;
    Ok(ChartArtifact::Heatmap(correlation(ds, numeric)?))
}

/// Pearson matrix over the given numeric columns.
pub(super) fn correlation(ds: &Dataset, labels: Vec<String>) -> Result<Correlation, ChartError> {
    let columns = labels
        .iter()
        .map(|c| ds.numeric_values(c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Correlation {
        matrix: correlation_matrix(&columns),
        labels,
    })
}

pub fn strip_by_product_line(
    ds: &Dataset,
    cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    category_strip(ds, cfg)
}

/// Complete `[x, y]` pairs.
pub(super) fn pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Vec<[f64; 2]> {
    complete_rows(&[x, y])
        .into_iter()
        .map(|r| [r[0], r[1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::geometry::is_convex;
    use crate::charts::artifact::XAxis;
    use crate::charts::test_support::{from_csv, sales};

    fn cfg() -> DashboardConfig {
        DashboardConfig::default()
    }

    #[test]
    fn scatter_prefers_revenue() {
        let ChartArtifact::Scatter { axes, points } = units_vs_revenue(&sales(), &cfg()).unwrap()
        else {
            panic!("expected scatter");
        };
        assert_eq!(axes.y_label, "revenue");
        assert_eq!(points[0], [10.0, 100.0]);
    }

    #[test]
    fn scatter_falls_back_to_another_numeric() {
        let ds = from_csv("units_sold,price\n1,2.5\n3,4.5\n");
        let ChartArtifact::Scatter { axes, .. } = units_vs_revenue(&ds, &cfg()).unwrap() else {
            panic!("expected scatter");
        };
        assert_eq!(axes.y_label, "price");

        let ds = from_csv("units_sold,label\n1,a\n");
        assert!(matches!(
            units_vs_revenue(&ds, &cfg()),
            Err(ChartError::MissingColumns(_))
        ));
    }

    #[test]
    fn hexbin_uses_first_two_numeric_columns() {
        let ChartArtifact::Hexbin { axes, grid } = hexbin_density(&sales(), &cfg()).unwrap() else {
            panic!("expected hexbin");
        };
        assert_eq!(axes.x_label, "units_sold");
        assert_eq!(axes.y_label, "revenue");
        assert_eq!(grid.cells.iter().map(|c| c.count).sum::<usize>(), 8);
    }

    #[test]
    fn hexbin_skips_with_one_numeric_column() {
        let ds = from_csv("units_sold,category\n1,a\n");
        assert!(matches!(
            hexbin_density(&ds, &cfg()),
            Err(ChartError::MissingColumns(_))
        ));
    }

    #[test]
    fn box_plot_has_one_box_per_category() {
        let ChartArtifact::BoxPlot { axes, boxes } = box_by_category(&sales(), &cfg()).unwrap()
        else {
            panic!("expected box plot");
        };
        assert_eq!(
            axes.x_axis,
            XAxis::Categories(vec!["Tools".into(), "Toys".into(), "Garden".into()])
        );
        assert_eq!(boxes.len(), 3);
        // Tools: 10, 7, 9, 8
        assert_eq!(boxes[0].median, 8.5);
    }

    #[test]
    fn violin_outlines_are_symmetric() {
        let ChartArtifact::Violin { violins, .. } = violin_by_category(&sales(), &cfg()).unwrap()
        else {
            panic!("expected violins");
        };
        assert_eq!(violins.len(), 3);
        let first = &violins[0].outline;
        let n = first.len();
        assert!((first[0][0] + first[n - 1][0] - 0.0).abs() < 1e-9);
        assert!(first.iter().all(|p| (p[0] - 0.0).abs() <= 0.4 + 1e-9));
    }

    #[test]
    fn violin_with_single_value_category() {
        let ds = from_csv("category,units_sold\nA,1\nA,3\nB,5\n");
        let ChartArtifact::Violin { violins, .. } = violin_by_category(&ds, &cfg()).unwrap() else {
            panic!("expected violins");
        };
        assert_eq!(violins[1].outline.len(), 2);
        assert!(violins[1].bands.is_empty());
    }

    #[test]
    fn bimodal_violin_fills_with_convex_bands() {
        let ds = from_csv("category,units_sold\nA,1\nA,1\nA,2\nA,9\nA,10\nA,10\n");
        let ChartArtifact::Violin { violins, .. } = violin_by_category(&ds, &cfg()).unwrap() else {
            panic!("expected violins");
        };
        let shape = &violins[0];
        assert!(!is_convex(&shape.outline));
        assert_eq!(shape.bands.len(), cfg().kde_points - 1);
        assert!(shape.bands.iter().all(|b| is_convex(b)));
    }

    #[test]
    fn kde_needs_spread() {
        let ds = from_csv("units_sold\n4\n4\n");
        assert!(matches!(units_kde(&ds, &cfg()), Err(ChartError::Invalid(_))));
    }

    #[test]
    fn pairplot_drops_incomplete_rows() {
        let ds = from_csv("a,b,c\n1,2,3\n4,,6\n7,8,9\n");
        let ChartArtifact::PairGrid { columns, cells } = pairplot(&ds, &cfg()).unwrap() else {
            panic!("expected pair grid");
        };
        assert_eq!(columns, vec!["a", "b", "c"]);
        assert!(matches!(cells[0][0], PairCell::Histogram(_)));
        let PairCell::Scatter(points) = &cells[1][0] else {
            panic!("expected scatter");
        };
        assert_eq!(points, &vec![[1.0, 2.0], [7.0, 8.0]]);
    }

    #[test]
    fn heatmap_matrix_is_square() {
        let ChartArtifact::Heatmap(corr) = correlation_heatmap(&sales(), &cfg()).unwrap() else {
            panic!("expected heatmap");
        };
        let n = corr.labels.len();
        assert_eq!(n, 4);
        assert!(corr.matrix.iter().all(|row| row.len() == n));
        assert!((corr.matrix[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn joint_hex_counts_all_points() {
        let ChartArtifact::Joint { main, .. } = joint_hex(&sales(), &cfg()).unwrap() else {
            panic!("expected joint");
        };
        let JointMain::Hex(grid) = main else {
            panic!("expected hex panel");
        };
        assert_eq!(grid.cells.iter().map(|c| c.count).sum::<usize>(), 8);
    }
}
