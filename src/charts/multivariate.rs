use crate::config::DashboardConfig;
use crate::data::model::Dataset;
use crate::data::pivot::PivotTable;
use crate::data::stats::{self, complete_rows, group_sums, group_values};

use super::advanced::{correlation, first_two_hexbin};
use super::artifact::{Axes, CategoryPoints, ChartArtifact, Curve, Projected3d, TreemapTile};
use super::geometry::{Rect, View3d, andrews_curve, min_max_scale, squarify, swarm_offsets};
use super::{ChartError, companion_measure, require_that};

/// `units_sold` × companion × the next numeric column, projected to 2D.
pub fn scatter_3d(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(ds.has_column("units_sold"), "Need 'units_sold' column for 3D scatter")?;
    let y_col = companion_measure(ds);
    let third = ds
        .numeric_column_names()
        .into_iter()
        .find(|c| c != "units_sold" && Some(c) != y_col.as_ref());
    let (Some(y_col), Some(third)) = (y_col, third) else {
        return Err(ChartError::MissingColumns(
            "Need at least 3 numeric columns (including units_sold) for 3D scatter".into(),
        ));
    };

    let columns = [
        ds.numeric_values("units_sold")?,
        ds.numeric_values(&y_col)?,
        ds.numeric_values(&third)?,
    ];
    let rows = complete_rows(&[&columns[0][..], &columns[1][..], &columns[2][..]]);
    if rows.is_empty() {
        return Err(ChartError::NoData(format!("units_sold, {y_col} and {third}")));
    }
    let scaled: Vec<Vec<f64>> = (0..3)
        .map(|i| min_max_scale(&rows.iter().map(|r| r[i]).collect::<Vec<_>>()))
        .collect();

    let view = View3d::new(-60.0, 30.0);
    let points = (0..rows.len())
        .map(|i| view.project([scaled[0][i], scaled[1][i], scaled[2][i]]))
        .collect();
    let label_anchors = [
        view.project([0.5, -0.15, -0.15]),
        view.project([1.15, 0.5, -0.15]),
        view.project([-0.15, -0.15, 0.5]),
    ];
    Ok(ChartArtifact::Scatter3d(Projected3d {
        axis_labels: ["Units Sold".to_string(), y_col, third],
        points,
        edges: view.cube_edges(),
        label_anchors,
    }))
}

/// Category totals laid out as a squarified treemap on a 100×100 canvas.
pub fn treemap_by_category(
    ds: &Dataset,
    _cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["category", "units_sold"]),
        "Need category & units_sold for treemap",
    )?;
    let sums = group_sums(&ds.keys("category")?, &ds.numeric_values("units_sold")?);
    let positive: Vec<(String, f64)> = sums
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    if positive.is_empty() {
        return Err(ChartError::Invalid(
            "treemap needs at least one category with positive units_sold".into(),
        ));
    }
    let sizes: Vec<f64> = positive.iter().map(|(_, v)| *v).collect();
    let canvas = Rect {
        x: 0.0,
        y: 0.0,
        dx: 100.0,
        dy: 100.0,
    };
    let tiles = positive
        .into_iter()
        .zip(squarify(&sizes, canvas))
        .map(|((label, value), rect)| TreemapTile { label, value, rect })
        .collect();
    Ok(ChartArtifact::Treemap { tiles })
}

pub fn hexbin_alternate(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    first_two_hexbin(
        ds,
        cfg.hexbin_alt_gridsize,
        "Need 2+ numeric columns for hexbin",
    )
}

/// Numeric columns other than the class column, in file order.
fn feature_columns(ds: &Dataset, class: &str) -> Vec<String> {
    ds.numeric_column_names()
        .into_iter()
        .filter(|c| c != class)
        .collect()
}

/// Complete rows of `features` with their class label.
fn labelled_rows(
    ds: &Dataset,
    class: &str,
    features: &[String],
) -> Result<(Vec<String>, Vec<(usize, Vec<f64>)>), ChartError> {
    let labels = ds.labels(class)?;
    let columns = features
        .iter()
        .map(|c| ds.numeric_values(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for (row, label) in labels.iter().enumerate() {
        let Some(label) = label else {
            continue;
        };
        let values: Option<Vec<f64>> = columns
            .iter()
            .map(|col| col[row].filter(|v| v.is_finite()))
            .collect();
        let Some(values) = values else {
            continue;
        };
        let group = match groups.iter().position(|g| g == label) {
            Some(g) => g,
            None => {
                groups.push(label.clone());
                groups.len() - 1
            }
        };
        rows.push((group, values));
    }
    if rows.is_empty() {
        return Err(ChartError::NoData(format!("{class} and {}", features.join(", "))));
    }
    Ok((groups, rows))
}

/// One Fourier curve per row, coloured by category.
pub fn andrews_curves(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    let features = feature_columns(ds, "category");
    require_that(
        ds.has_column("category") && features.len() >= 2,
        "Need 'category' plus numeric columns for Andrews curves",
    )?;
    let (groups, rows) = labelled_rows(ds, "category", &features)?;
    let curves = rows
        .into_iter()
        .map(|(group, values)| Curve {
            group,
            points: andrews_curve(&values, cfg.andrews_samples),
        })
        .collect();
    Ok(ChartArtifact::Curves {
        axes: Axes::numeric("t", "f(t)"),
        groups,
        curves,
    })
}

/// Polyline per row across the first few numeric columns.
pub fn parallel_coordinates(
    ds: &Dataset,
    cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    let mut features = feature_columns(ds, "category");
    require_that(
        ds.has_column("category") && features.len() >= 3,
        "Need 'category' plus >=3 numeric cols for parallel coordinates",
    )?;
    features.truncate(cfg.parallel_max_columns.max(2));
    let (groups, rows) = labelled_rows(ds, "category", &features)?;
    let curves = rows
        .into_iter()
        .map(|(group, values)| Curve {
            group,
            points: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| [i as f64, v])
                .collect(),
        })
        .collect();
    Ok(ChartArtifact::Curves {
        axes: Axes::categorical("", "", features),
        groups,
        curves,
    })
}

/// Non-overlapping points per category.
pub fn swarm_by_category(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["category", "units_sold"]),
        "Need category & units_sold for swarmplot",
    )?;
    let groups = group_values(&ds.labels("category")?, &ds.numeric_values("units_sold")?);
    let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let Some((lo, hi)) = stats::min_max(&all) else {
        return Err(ChartError::NoData("category and units_sold".into()));
    };
    let ry = ((hi - lo) * 0.012).max(1e-6);
    let rx = 0.012;

    let mut points = Vec::with_capacity(all.len());
    for (idx, (_, values)) in groups.iter().enumerate() {
        for (offset, v) in swarm_offsets(values, rx, ry, 0.45).into_iter().zip(values) {
            points.push((idx, [idx as f64 + offset, *v]));
        }
    }
    Ok(ChartArtifact::Swarm(CategoryPoints {
        axes: Axes::categorical(
            "category",
            "units_sold",
            groups.into_iter().map(|(label, _)| label).collect(),
        ),
        points,
    }))
}

/// Correlation table and the downloadable product × category pivot.
pub fn extras(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    let numeric = ds.numeric_column_names();
    let has_pivot = ds.has_columns(&["product_name", "category", "units_sold"]);
    if numeric.len() < 2 && !has_pivot {
        return Err(ChartError::MissingColumns(
            "Need 2+ numeric columns or product_name, category, units_sold".into(),
        ));
    }
    let correlation = if numeric.len() >= 2 {
        Some(correlation(ds, numeric)?)
    } else {
        None
    };
    let pivot = if has_pivot {
        Some(PivotTable::build(ds, "product_name", "category", "units_sold")?)
    } else {
        None
    };
    Ok(ChartArtifact::Extras { correlation, pivot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::artifact::XAxis;
    use crate::charts::test_support::{from_csv, sales};

    fn cfg() -> DashboardConfig {
        DashboardConfig::default()
    }

    #[test]
    fn scatter_3d_picks_revenue_then_next_numeric() {
        let ChartArtifact::Scatter3d(p) = scatter_3d(&sales(), &cfg()).unwrap() else {
            panic!("expected 3d scatter");
        };
        assert_eq!(p.axis_labels[1], "revenue");
        assert_eq!(p.axis_labels[2], "sale_date_num");
        assert_eq!(p.points.len(), 8);
        assert_eq!(p.edges.len(), 12);
    }

    #[test]
    fn scatter_3d_needs_three_numeric_columns() {
        let ds = from_csv("units_sold,revenue,category\n1,2,a\n");
        assert!(matches!(
            scatter_3d(&ds, &cfg()),
            Err(ChartError::MissingColumns(_))
        ));
    }

    #[test]
    fn treemap_tiles_fill_the_canvas() {
        let ChartArtifact::Treemap { tiles } = treemap_by_category(&sales(), &cfg()).unwrap() else {
            panic!("expected treemap");
        };
        let labels: Vec<&str> = tiles.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Garden", "Tools", "Toys"]);
        let area: f64 = tiles.iter().map(|t| t.rect.area()).sum();
        assert!((area - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn treemap_orders_integer_categories_numerically() {
        let ds = from_csv("category,units_sold\n10,1\n2,3\n1,2\n10,4\n");
        let ChartArtifact::Treemap { tiles } = treemap_by_category(&ds, &cfg()).unwrap() else {
            panic!("expected treemap");
        };
        let labels: Vec<(&str, f64)> = tiles.iter().map(|t| (t.label.as_str(), t.value)).collect();
        assert_eq!(labels, vec![("1", 2.0), ("2", 3.0), ("10", 5.0)]);
    }

    #[test]
    fn treemap_drops_non_positive_categories() {
        let ds = from_csv("category,units_sold\nA,0\nB,-2\n");
        assert!(matches!(
            treemap_by_category(&ds, &cfg()),
            Err(ChartError::Invalid(_))
        ));
    }

    #[test]
    fn andrews_curves_one_per_complete_row() {
        let ChartArtifact::Curves { groups, curves, .. } = andrews_curves(&sales(), &cfg()).unwrap()
        else {
            panic!("expected curves");
        };
        assert_eq!(groups, vec!["Tools", "Toys", "Garden"]);
        assert_eq!(curves.len(), 8);
        assert_eq!(curves[0].points.len(), 200);
    }

    #[test]
    fn parallel_coordinates_uses_first_numeric_columns() {
        let mut c = cfg();
        c.parallel_max_columns = 3;
        let ChartArtifact::Curves { axes, curves, .. } =
            parallel_coordinates(&sales(), &c).unwrap()
        else {
            panic!("expected curves");
        };
        assert_eq!(
            axes.x_axis,
            XAxis::Categories(vec![
                "units_sold".into(),
                "revenue".into(),
                "sale_date_num".into()
            ])
        );
        assert_eq!(curves[0].points, vec![[0.0, 10.0], [1.0, 100.0], [2.0, 3.0]]);
    }

    #[test]
    fn parallel_coordinates_needs_three_numeric() {
        let ds = from_csv("category,a,b\nx,1,2\n");
        assert!(matches!(
            parallel_coordinates(&ds, &cfg()),
            Err(ChartError::MissingColumns(_))
        ));
    }

    #[test]
    fn swarm_keeps_every_point_in_its_lane() {
        let ChartArtifact::Swarm(swarm) = swarm_by_category(&sales(), &cfg()).unwrap() else {
            panic!("expected swarm");
        };
        assert_eq!(swarm.points.len(), 8);
        for (idx, [x, _]) in &swarm.points {
            assert!((x - *idx as f64).abs() <= 0.45);
        }
    }

    #[test]
    fn extras_offers_correlation_and_pivot() {
        let ChartArtifact::Extras { correlation, pivot } = extras(&sales(), &cfg()).unwrap() else {
            panic!("expected extras");
        };
        assert_eq!(correlation.unwrap().labels.len(), 4);
        assert_eq!(pivot.unwrap().row_labels, vec!["Gadget", "Gizmo", "Widget"]);
    }

    #[test]
    fn extras_pivot_only() {
        let ds = from_csv("product_name,category,units_sold\nA,x,1\n");
        let ChartArtifact::Extras { correlation, pivot } = extras(&ds, &cfg()).unwrap() else {
            panic!("expected extras");
        };
        assert!(correlation.is_none());
        assert!(pivot.is_some());
    }
}
