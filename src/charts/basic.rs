use crate::config::DashboardConfig;
use crate::data::model::{ColumnKind, Dataset};
use crate::data::normalize::time_column;
use crate::data::pivot::PivotTable;
use crate::data::stats::{self, complete_rows, group_sums, histogram, linear_fit};

use super::artifact::{Axes, CategoryPoints, ChartArtifact, JointMain, XAxis};
use super::geometry::{jitter, pie_wedges};
use super::{ChartError, require, require_that};

/// One bar per row, labelled with the product name.
pub fn units_per_product(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require(ds, &["product_name", "units_sold"])?;
    let labels = ds.labels("product_name")?;
    let units = ds.numeric_values("units_sold")?;
    if units.iter().all(Option::is_none) {
        return Err(ChartError::NoData("units_sold".into()));
    }
    let names = labels
        .into_iter()
        .map(|l| l.unwrap_or_else(|| "NaN".to_string()))
        .collect();
    Ok(ChartArtifact::Bars {
        axes: Axes::categorical("Product", "Units Sold", names),
        values: units.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
    })
}

/// Units against the first `*date` column, nulls dropped, sorted by time.
pub fn units_over_time(ds: &Dataset, _cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    let date_col = time_column(ds.column_names());
    let Some(date_col) = date_col.filter(|_| ds.has_column("units_sold")) else {
        return Err(ChartError::MissingColumns(
            "Need a date column and 'units_sold'".into(),
        ));
    };
    let time_is_date = ds
        .column(date_col)
        .is_some_and(|c| c.kind == ColumnKind::DateTime);
    let x = ds.axis_values(date_col)?;
    let y = ds.numeric_values("units_sold")?;
    let mut points: Vec<[f64; 2]> = complete_rows(&[&x[..], &y[..]])
        .into_iter()
        .map(|r| [r[0], r[1]])
        .collect();
    if points.is_empty() {
        return Err(ChartError::NoData(format!("{date_col} and units_sold")));
    }
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    Ok(ChartArtifact::Line {
        axes: Axes {
            x_label: date_col.to_string(),
            y_label: "Units Sold".into(),
            x_axis: if time_is_date { XAxis::Time } else { XAxis::Numeric },
        },
        points,
    })
}

/// Category totals, largest first.
pub fn units_by_category_pie(
    ds: &Dataset,
    _cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    require(ds, &["category", "units_sold"])?;
    let sums = group_sums(&ds.keys("category")?, &ds.numeric_values("units_sold")?);
    if sums.is_empty() {
        return Err(ChartError::NoData("category and units_sold".into()));
    }
    let mut slices: Vec<(String, f64)> = sums.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    slices.sort_by(|a, b| b.1.total_cmp(&a.1));
    let wedges = pie_wedges(&slices, 90.0).ok_or_else(|| {
        ChartError::Invalid("wedge sizes must be non-negative with a positive total".into())
    })?;
    Ok(ChartArtifact::Pie { wedges })
}

pub fn units_histogram(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require(ds, &["units_sold"])?;
    let values = stats::finite(&ds.numeric_values("units_sold")?);
    if values.is_empty() {
        return Err(ChartError::NoData("units_sold".into()));
    }
    Ok(ChartArtifact::Histogram {
        axes: Axes::numeric("Units Sold", "Count"),
        bins: histogram(&values, cfg.histogram_bins),
    })
}

/// Product × category pivot drawn as stacked bars.
pub fn stacked_product_category(
    ds: &Dataset,
    _cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    require(ds, &["product_name", "category", "units_sold"])?;
    let pivot = PivotTable::build(ds, "product_name", "category", "units_sold")?;
    if pivot.is_empty() {
        return Err(ChartError::NoData("product_name, category and units_sold".into()));
    }
    let series = pivot
        .column_labels
        .iter()
        .enumerate()
        .map(|(c, label)| (label.clone(), pivot.cells.iter().map(|row| row[c]).collect()))
        .collect();
    Ok(ChartArtifact::StackedBars {
        axes: Axes::categorical("Product", "Units Sold", pivot.row_labels.clone()),
        legend_title: "Category".into(),
        series,
    })
}

pub fn strip_by_category(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    category_strip(ds, cfg)
}

/// Jittered units per category, categories in order of first appearance.
pub(super) fn category_strip(
    ds: &Dataset,
    cfg: &DashboardConfig,
) -> Result<ChartArtifact, ChartError> {
    require(ds, &["category", "units_sold"])?;
    let groups = stats::group_values(&ds.labels("category")?, &ds.numeric_values("units_sold")?);
    if groups.is_empty() {
        return Err(ChartError::NoData("category and units_sold".into()));
    }
    let mut points = Vec::new();
    let mut seed = 0;
    for (idx, (_, values)) in groups.iter().enumerate() {
        for &v in values {
            points.push((idx, [idx as f64 + jitter(seed, cfg.strip_jitter), v]));
            seed += 1;
        }
    }
    Ok(ChartArtifact::Strip(CategoryPoints {
        axes: Axes::categorical(
            "category",
            "units_sold",
            groups.into_iter().map(|(label, _)| label).collect(),
        ),
        points,
    }))
}

/// Scatter with a least-squares line and marginal histograms.
pub fn joint_regression(ds: &Dataset, cfg: &DashboardConfig) -> Result<ChartArtifact, ChartError> {
    require_that(
        ds.has_columns(&["sale_date_num", "units_sold"]),
        "Need 'sale_date_num' & 'units_sold' for jointplot",
    )?;
    let points = joint_points(ds)?;
    let fit = linear_fit(&points).map(|(slope, intercept)| {
        let (lo, hi) = stats::min_max(&points.iter().map(|p| p[0]).collect::<Vec<_>>())
            .unwrap_or((0.0, 0.0));
        [[lo, slope * lo + intercept], [hi, slope * hi + intercept]]
    });
    let main = JointMain::Regression {
        points: points.clone(),
        fit,
    };
    Ok(joint_artifact(&points, main, cfg))
}

/// Complete `(sale_date_num, units_sold)` pairs.
pub(super) fn joint_points(ds: &Dataset) -> Result<Vec<[f64; 2]>, ChartError> {
    let x = ds.numeric_values("sale_date_num")?;
    let y = ds.numeric_values("units_sold")?;
    let points: Vec<[f64; 2]> = complete_rows(&[&x[..], &y[..]])
        .into_iter()
        .map(|r| [r[0], r[1]])
        .collect();
    if points.is_empty() {
        return Err(ChartError::NoData("sale_date_num and units_sold".into()));
    }
    Ok(points)
}

/// Wrap a main panel with marginal histograms of `points`.
pub(super) fn joint_artifact(
    points: &[[f64; 2]],
    main: JointMain,
    cfg: &DashboardConfig,
) -> ChartArtifact {
    let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
    let ys: Vec<f64> = points.iter().map(|p| p[1]).collect();
    ChartArtifact::Joint {
        axes: Axes::numeric("sale_date_num", "units_sold"),
        main,
        top: histogram(&xs, cfg.joint_bins),
        right: histogram(&ys, cfg.joint_bins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::{from_csv, sales};

    fn cfg() -> DashboardConfig {
        DashboardConfig::default()
    }

    #[test]
    fn bar_has_one_bar_per_row() {
        let ChartArtifact::Bars { axes, values } = units_per_product(&sales(), &cfg()).unwrap() else {
            panic!("expected bars");
        };
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 10.0);
        let XAxis::Categories(labels) = axes.x_axis else {
            panic!("expected categories");
        };
        assert_eq!(labels[1], "Gadget");
    }

    #[test]
    fn line_is_sorted_by_date() {
        let ChartArtifact::Line { axes, points } = units_over_time(&sales(), &cfg()).unwrap() else {
            panic!("expected line");
        };
        assert_eq!(axes.x_label, "sale_date");
        assert_eq!(axes.x_axis, XAxis::Time);
        assert!(points.windows(2).all(|w| w[0][0] <= w[1][0]));
        // 2024-01-01 sold 4
        assert_eq!(points[0][1], 4.0);
    }

    #[test]
    fn line_needs_a_column_ending_in_date() {
        let ds = from_csv("sale_day,units_sold\n2024-01-01,3\n");
        let err = units_over_time(&ds, &cfg()).unwrap_err();
        assert!(matches!(err, ChartError::MissingColumns(_)));
    }

    #[test]
    fn pie_slices_descend() {
        let ChartArtifact::Pie { wedges } = units_by_category_pie(&sales(), &cfg()).unwrap() else {
            panic!("expected pie");
        };
        let labels: Vec<&str> = wedges.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["Tools", "Garden", "Toys"]);
        assert_eq!(wedges[0].value, 34.0);
        let total: f64 = wedges.iter().map(|w| w.fraction).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pie_rejects_negative_totals() {
        let ds = from_csv("category,units_sold\nA,5\nB,-3\n");
        let err = units_by_category_pie(&ds, &cfg()).unwrap_err();
        assert!(matches!(err, ChartError::Invalid(_)));
    }

    #[test]
    fn histogram_uses_configured_bins() {
        let mut c = cfg();
        c.histogram_bins = 5;
        let ChartArtifact::Histogram { bins, .. } = units_histogram(&sales(), &c).unwrap() else {
            panic!("expected histogram");
        };
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 8);
    }

    #[test]
    fn stacked_series_follow_sorted_categories() {
        let ChartArtifact::StackedBars { axes, series, .. } =
            stacked_product_category(&sales(), &cfg()).unwrap()
        else {
            panic!("expected stacked bars");
        };
        let names: Vec<&str> = series.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Garden", "Tools", "Toys"]);
        assert_eq!(
            axes.x_axis,
            XAxis::Categories(vec!["Gadget".into(), "Gizmo".into(), "Widget".into()])
        );
        // Widget / Tools = 10 + 7
        assert_eq!(series[1].1[2], 17.0);
    }

    #[test]
    fn strip_points_stay_near_their_category() {
        let ChartArtifact::Strip(strip) = strip_by_category(&sales(), &cfg()).unwrap() else {
            panic!("expected strip");
        };
        assert_eq!(strip.points.len(), 8);
        for (idx, [x, _]) in &strip.points {
            assert!((x - *idx as f64).abs() <= 0.1 + 1e-12);
        }
    }

    #[test]
    fn joint_regression_fits_a_line() {
        let ChartArtifact::Joint { main, top, right, .. } =
            joint_regression(&sales(), &cfg()).unwrap()
        else {
            panic!("expected joint");
        };
        let JointMain::Regression { points, fit } = main else {
            panic!("expected regression panel");
        };
        assert_eq!(points.len(), 8);
        assert!(fit.is_some());
        assert_eq!(top.iter().map(|b| b.count).sum::<usize>(), 8);
        assert_eq!(right.iter().map(|b| b.count).sum::<usize>(), 8);
    }

    #[test]
    fn joint_skips_without_sale_date_num() {
        let ds = from_csv("units_sold\n1\n");
        assert!(matches!(
            joint_regression(&ds, &cfg()),
            Err(ChartError::MissingColumns(_))
        ));
    }
}
