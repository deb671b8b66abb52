use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint, Points,
    Polygon, Text,
};

use crate::charts::artifact::{
    Axes, CategoryPoints, Correlation, Curve, HexGrid, JointMain, PairCell, Projected3d,
    TreemapTile, ViolinShape, XAxis,
};
use crate::charts::geometry::{Wedge, hexagon};
use crate::charts::{ChartArtifact, ChartOutcome, ChartStatus};
use crate::color::{self, ColorMap};
use crate::data::pivot::PivotTable;
use crate::data::stats::{Bin, BoxStats};
use crate::ui::table;

const CHART_HEIGHT: f32 = 320.0;
const MARGINAL: f32 = 80.0;

// ---------------------------------------------------------------------------
// Chart block
// ---------------------------------------------------------------------------

/// Render one chart outcome. Returns the pivot when its download button was
/// clicked.
pub fn chart_block(ui: &mut Ui, outcome: &ChartOutcome) -> Option<PivotTable> {
    ui.heading(outcome.title);
    let mut download = None;
    match &outcome.status {
        ChartStatus::Rendered(artifact) => {
            ui.push_id(outcome.title, |ui: &mut Ui| {
                download = artifact_view(ui, artifact);
            });
        }
        ChartStatus::Skipped(msg) => {
            ui.label(RichText::new(format!("ℹ {msg}")).color(Color32::LIGHT_BLUE));
        }
        ChartStatus::Failed(msg) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    }
    ui.add_space(12.0);
    download
}

fn artifact_view(ui: &mut Ui, artifact: &ChartArtifact) -> Option<PivotTable> {
    match artifact {
        ChartArtifact::Bars { axes, values } => bars(ui, axes, values),
        ChartArtifact::StackedBars {
            axes,
            legend_title,
            series,
        } => stacked_bars(ui, axes, legend_title, series),
        ChartArtifact::Line { axes, points } => {
            base_plot("line", axes).show(ui, |plot_ui| {
                plot_ui.line(Line::new(points.clone()).width(1.5));
                plot_ui.points(Points::new(points.clone()).radius(3.0));
            });
        }
        ChartArtifact::Pie { wedges } => pie(ui, wedges),
        ChartArtifact::Histogram { axes, bins } => {
            base_plot("histogram", axes).show(ui, |plot_ui| {
                plot_ui.bar_chart(histogram_bars(bins, Color32::LIGHT_BLUE));
            });
        }
        ChartArtifact::Scatter { axes, points } => {
            base_plot("scatter", axes).show(ui, |plot_ui| {
                plot_ui.points(Points::new(points.clone()).radius(3.0));
            });
        }
        ChartArtifact::Hexbin { axes, grid } => {
            base_plot("hexbin", axes).show(ui, |plot_ui| hex_cells(plot_ui, grid));
        }
        ChartArtifact::Density { axes, curve } => {
            base_plot("density", axes).show(ui, |plot_ui| {
                plot_ui.line(Line::new(curve.clone()).fill(0.0).width(1.5));
            });
        }
        ChartArtifact::BoxPlot { axes, boxes } => box_plot(ui, axes, boxes),
        ChartArtifact::Violin { axes, violins } => violin(ui, axes, violins),
        ChartArtifact::Strip(points) | ChartArtifact::Swarm(points) => category_points(ui, points),
        ChartArtifact::Joint {
            axes,
            main,
            top,
            right,
        } => joint(ui, axes, main, top, right),
        ChartArtifact::PairGrid { columns, cells } => pair_grid(ui, columns, cells),
        ChartArtifact::Heatmap(correlation) => heatmap(ui, correlation),
        ChartArtifact::Scatter3d(projected) => scatter_3d(ui, projected),
        ChartArtifact::Treemap { tiles } => treemap(ui, tiles),
        ChartArtifact::Curves {
            axes,
            groups,
            curves,
        } => curves_plot(ui, axes, groups, curves),
        ChartArtifact::Extras { correlation, pivot } => {
            return extras(ui, correlation.as_ref(), pivot.as_ref());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Plot scaffolding
// ---------------------------------------------------------------------------

/// A plot with axis labels and the x-axis formatter for `axes`.
fn base_plot(id: &str, axes: &Axes) -> Plot<'static> {
    let plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(axes.x_label.clone())
        .y_axis_label(axes.y_label.clone());
    match &axes.x_axis {
        XAxis::Numeric => plot,
        XAxis::Time => plot.x_axis_formatter(time_label),
        XAxis::Categories(labels) => {
            let labels = labels.clone();
            plot.x_axis_formatter(move |mark: GridMark, _: &RangeInclusive<f64>| {
                category_label(&labels, mark.value)
            })
        }
    }
}

/// Label for integer positions only; blank between categories.
fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

fn time_label(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    chrono::DateTime::from_timestamp(mark.value as i64, 0)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Plot with equal axis scaling and no axes, for shapes.
fn canvas_plot(id: &str) -> Plot<'static> {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes([false, false])
        .show_grid(false)
        .legend(Legend::default())
}

fn category_colors(labels: &[String]) -> ColorMap {
    ColorMap::new(labels.iter().map(String::as_str))
}

fn fill(c: Color32) -> Color32 {
    c.gamma_multiply(0.6)
}

// ---------------------------------------------------------------------------
// Bar-like charts
// ---------------------------------------------------------------------------

fn bars(ui: &mut Ui, axes: &Axes, values: &[f64]) {
    let chart = BarChart::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Bar::new(i as f64, *v).width(0.7))
            .collect(),
    )
    .color(Color32::LIGHT_BLUE)
    .name(axes.y_label.clone());
    base_plot("bars", axes).show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn stacked_bars(ui: &mut Ui, axes: &Axes, legend_title: &str, series: &[(String, Vec<f64>)]) {
    let names: Vec<String> = series.iter().map(|(name, _)| name.clone()).collect();
    let colors = category_colors(&names);
    let mut charts: Vec<BarChart> = Vec::with_capacity(series.len());
    for (name, values) in series {
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, v)| Bar::new(i as f64, *v).width(0.7))
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .color(colors.color_for(name))
            .name(format!("{legend_title}: {name}"))
            .stack_on(&below);
        charts.push(chart);
    }
    base_plot("stacked", axes).show(ui, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

fn histogram_bars(bins: &[Bin], color: Color32) -> BarChart {
    BarChart::new(
        bins.iter()
            .map(|b| Bar::new(b.center(), b.count as f64).width(b.width()))
            .collect(),
    )
    .color(color)
}

// ---------------------------------------------------------------------------
// Shapes: pie, hexbin, treemap, heatmap
// ---------------------------------------------------------------------------

fn pie(ui: &mut Ui, wedges: &[Wedge]) {
    let labels: Vec<String> = wedges.iter().map(|w| w.label.clone()).collect();
    let colors = category_colors(&labels);
    canvas_plot("pie").show(ui, |plot_ui| {
        for w in wedges {
            let c = colors.color_for(&w.label);
            for piece in w.pieces(1.0) {
                plot_ui.polygon(
                    Polygon::new(piece)
                        .fill_color(c)
                        .stroke(Stroke::NONE)
                        .name(&w.label),
                );
            }
            let mut outline = w.polygon(1.0);
            outline.push([0.0, 0.0]);
            plot_ui.line(Line::new(outline).color(Color32::WHITE).width(1.0));
            let [x, y] = w.label_anchor(0.65);
            plot_ui.text(Text::new(
                PlotPoint::new(x, y),
                format!("{:.1}%", w.fraction * 100.0),
            ));
            let [x, y] = w.label_anchor(1.15);
            plot_ui.text(Text::new(PlotPoint::new(x, y), w.label.clone()));
        }
    });
}

fn hex_cells(plot_ui: &mut egui_plot::PlotUi, grid: &HexGrid) {
    let max = grid.max_count.max(1) as f64;
    for cell in &grid.cells {
        plot_ui.polygon(
            Polygon::new(hexagon(cell.center, grid.sx, grid.sy))
                .fill_color(color::sequential(cell.count as f64 / max))
                .stroke(Stroke::NONE),
        );
    }
}

fn treemap(ui: &mut Ui, tiles: &[TreemapTile]) {
    let labels: Vec<String> = tiles.iter().map(|t| t.label.clone()).collect();
    let colors = category_colors(&labels);
    canvas_plot("treemap").show(ui, |plot_ui| {
        for tile in tiles {
            plot_ui.polygon(
                Polygon::new(tile.rect.corners())
                    .fill_color(fill(colors.color_for(&tile.label)))
                    .stroke(Stroke::new(2.0, Color32::WHITE)),
            );
            let [x, y] = tile.rect.center();
            plot_ui.text(Text::new(
                PlotPoint::new(x, y),
                format!("{}\n{}", tile.label, tile.value),
            ));
        }
    });
}

fn heatmap(ui: &mut Ui, correlation: &Correlation) {
    let n = correlation.labels.len();
    // Row 0 is drawn at the top.
    let x_labels = correlation.labels.clone();
    let y_labels: Vec<String> = correlation.labels.iter().rev().cloned().collect();
    Plot::new("heatmap")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_grid(false)
        .x_axis_formatter(move |mark: GridMark, _: &RangeInclusive<f64>| {
            category_label(&x_labels, mark.value)
        })
        .y_axis_formatter(move |mark: GridMark, _: &RangeInclusive<f64>| {
            category_label(&y_labels, mark.value)
        })
        .show(ui, |plot_ui| {
            for (r, row) in correlation.matrix.iter().enumerate() {
                let y = (n - 1 - r) as f64;
                for (c, v) in row.iter().enumerate() {
                    let x = c as f64;
                    plot_ui.polygon(
                        Polygon::new(vec![
                            [x - 0.5, y - 0.5],
                            [x + 0.5, y - 0.5],
                            [x + 0.5, y + 0.5],
                            [x - 0.5, y + 0.5],
                        ])
                        .fill_color(color::diverging(*v))
                        .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                    let text = if v.is_nan() {
                        "NaN".to_string()
                    } else {
                        format!("{v:.2}")
                    };
                    plot_ui.text(Text::new(PlotPoint::new(x, y), text).color(Color32::BLACK));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Distributions by category
// ---------------------------------------------------------------------------

fn axis_categories(axes: &Axes) -> Vec<String> {
    match &axes.x_axis {
        XAxis::Categories(labels) => labels.clone(),
        _ => Vec::new(),
    }
}

fn box_elem(position: f64, stats: &BoxStats, name: &str, color: Color32) -> BoxElem {
    BoxElem::new(
        position,
        BoxSpread::new(
            stats.lower_whisker,
            stats.q1,
            stats.median,
            stats.q3,
            stats.upper_whisker,
        ),
    )
    .name(name)
    .box_width(0.5)
    .whisker_width(0.3)
    .fill(fill(color))
    .stroke(Stroke::new(1.5, color))
}

fn box_plot(ui: &mut Ui, axes: &Axes, boxes: &[BoxStats]) {
    let labels = axis_categories(axes);
    let colors = category_colors(&labels);
    base_plot("box", axes).show(ui, |plot_ui| {
        for (i, (stats, label)) in boxes.iter().zip(&labels).enumerate() {
            let c = colors.color_for(label);
            plot_ui.box_plot(BoxPlot::new(vec![box_elem(i as f64, stats, label, c)]).name(label));
            if !stats.outliers.is_empty() {
                let outliers: Vec<[f64; 2]> =
                    stats.outliers.iter().map(|v| [i as f64, *v]).collect();
                plot_ui.points(Points::new(outliers).radius(2.5).color(c));
            }
        }
    });
}

fn violin(ui: &mut Ui, axes: &Axes, violins: &[ViolinShape]) {
    let labels: Vec<String> = violins.iter().map(|v| v.label.clone()).collect();
    let colors = category_colors(&labels);
    base_plot("violin", axes).show(ui, |plot_ui| {
        for (i, shape) in violins.iter().enumerate() {
            let c = colors.color_for(&shape.label);
            let x = i as f64;
            for band in &shape.bands {
                plot_ui.polygon(
                    Polygon::new(band.to_vec())
                        .fill_color(fill(c))
                        .stroke(Stroke::NONE)
                        .name(&shape.label),
                );
            }
            let mut outline = shape.outline.clone();
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            plot_ui.line(Line::new(outline).color(c).width(1.0).name(&shape.label));
            plot_ui.line(
                Line::new(vec![[x, shape.stats.q1], [x, shape.stats.q3]])
                    .color(Color32::BLACK)
                    .width(4.0),
            );
            plot_ui.points(
                Points::new(vec![[x, shape.stats.median]])
                    .radius(3.0)
                    .color(Color32::WHITE),
            );
        }
    });
}

fn category_points(ui: &mut Ui, data: &CategoryPoints) {
    let labels = axis_categories(&data.axes);
    let colors = category_colors(&labels);
    base_plot("category_points", &data.axes).show(ui, |plot_ui| {
        for (idx, label) in labels.iter().enumerate() {
            let pts: Vec<[f64; 2]> = data
                .points
                .iter()
                .filter(|(i, _)| *i == idx)
                .map(|(_, p)| *p)
                .collect();
            plot_ui.points(
                Points::new(pts)
                    .radius(3.0)
                    .color(colors.color_for(label))
                    .name(label),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Composite charts
// ---------------------------------------------------------------------------

fn joint(ui: &mut Ui, axes: &Axes, main: &JointMain, top: &[Bin], right: &[Bin]) {
    let width = (ui.available_width() - MARGINAL - 16.0).max(200.0);
    ui.vertical(|ui: &mut Ui| {
        Plot::new("joint_top")
            .width(width)
            .height(MARGINAL)
            .show_axes([false, true])
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(histogram_bars(top, Color32::LIGHT_BLUE));
            });
        ui.horizontal(|ui: &mut Ui| {
            base_plot("joint_main", axes)
                .width(width)
                .show(ui, |plot_ui| match main {
                    JointMain::Regression { points, fit } => {
                        plot_ui.points(Points::new(points.clone()).radius(3.0));
                        if let Some(fit) = fit {
                            plot_ui.line(
                                Line::new(fit.to_vec())
                                    .color(Color32::ORANGE)
                                    .width(2.0)
                                    .name("fit"),
                            );
                        }
                    }
                    JointMain::Hex(grid) => hex_cells(plot_ui, grid),
                });
            Plot::new("joint_right")
                .width(MARGINAL)
                .height(CHART_HEIGHT)
                .show_axes([true, false])
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(histogram_bars(right, Color32::LIGHT_BLUE).horizontal());
                });
        });
    });
}

fn pair_grid(ui: &mut Ui, columns: &[String], cells: &[Vec<PairCell>]) {
    let n = columns.len().max(1) as f32;
    let size = ((ui.available_width() - 40.0) / n).clamp(100.0, 200.0);
    eframe::egui::Grid::new("pair_grid")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (r, row) in cells.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    ui.vertical(|ui: &mut Ui| {
                        if r == 0 {
                            ui.small(&columns[c]);
                        }
                        Plot::new(("pair", r, c))
                            .width(size)
                            .height(size)
                            .show_axes([r + 1 == cells.len(), c == 0])
                            .allow_drag(false)
                            .allow_scroll(false)
                            .show(ui, |plot_ui| match cell {
                                PairCell::Histogram(bins) => {
                                    plot_ui.bar_chart(histogram_bars(bins, Color32::LIGHT_BLUE));
                                }
                                PairCell::Scatter(points) => {
                                    plot_ui.points(Points::new(points.clone()).radius(2.0));
                                }
                            });
                    });
                }
                ui.small(&columns[r]);
                ui.end_row();
            }
        });
}

fn scatter_3d(ui: &mut Ui, projected: &Projected3d) {
    canvas_plot("scatter_3d").show(ui, |plot_ui| {
        for edge in &projected.edges {
            plot_ui.line(Line::new(edge.to_vec()).color(Color32::GRAY).width(1.0));
        }
        plot_ui.points(
            Points::new(projected.points.clone())
                .radius(3.5)
                .color(Color32::LIGHT_BLUE),
        );
        for (label, [x, y]) in projected.axis_labels.iter().zip(projected.label_anchors) {
            plot_ui.text(Text::new(PlotPoint::new(x, y), label.clone()));
        }
    });
}

fn curves_plot(ui: &mut Ui, axes: &Axes, groups: &[String], curves: &[Curve]) {
    let colors = category_colors(groups);
    base_plot("curves", axes).show(ui, |plot_ui| {
        for curve in curves {
            let label = &groups[curve.group];
            plot_ui.line(
                Line::new(curve.points.clone())
                    .color(colors.color_for(label).gamma_multiply(0.7))
                    .width(1.0)
                    .name(label),
            );
        }
    });
}

fn extras(
    ui: &mut Ui,
    correlation: Option<&Correlation>,
    pivot: Option<&PivotTable>,
) -> Option<PivotTable> {
    if let Some(correlation) = correlation {
        ui.strong("Correlation matrix");
        table::correlation_table(ui, correlation);
        ui.add_space(8.0);
    }
    let pivot = pivot?;
    ui.strong("Pivot: Units Sold by Product and Category");
    table::pivot_table(ui, pivot);
    if ui.button("⬇ Download pivot as CSV").clicked() {
        return Some(pivot.clone());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_integer_marks() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 5.0), "");
    }

    #[test]
    fn time_marks_format_as_dates() {
        let mark = GridMark {
            value: 1_704_067_200.0,
            step_size: 86_400.0,
        };
        assert_eq!(time_label(mark, &(0.0..=1.0)), "2024-01-01");
    }
}
