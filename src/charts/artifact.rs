use crate::data::pivot::PivotTable;
use crate::data::stats::{Bin, BoxStats};

use super::geometry::{HexCell, Rect, Wedge};

// ---------------------------------------------------------------------------
// Rendering artifacts: fully computed chart data, in plot coordinates
// ---------------------------------------------------------------------------

/// How the x axis of a chart is labelled.
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    Numeric,
    /// Values are unix seconds.
    Time,
    /// Integer positions `0..n` carry these labels.
    Categories(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub x_label: String,
    pub y_label: String,
    pub x_axis: XAxis,
}

impl Axes {
    pub fn numeric(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_axis: XAxis::Numeric,
        }
    }

    pub fn categorical(
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_axis: XAxis::Categories(categories),
        }
    }
}

/// Hexagonal binning result; each hexagon spans `sx` by `2/3·sy`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexGrid {
    pub cells: Vec<HexCell>,
    pub sx: f64,
    pub sy: f64,
    pub max_count: usize,
}

/// Points scattered around integer category positions (strip and swarm).
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPoints {
    pub axes: Axes,
    /// `(category index, [x, y])`.
    pub points: Vec<(usize, [f64; 2])>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolinShape {
    pub label: String,
    /// Closed outline around `x = position`.
    pub outline: Vec<[f64; 2]>,
    /// Symmetric trapezoids between consecutive density samples; each one
    /// is convex, together they fill the outline.
    pub bands: Vec<[[f64; 2]; 4]>,
    pub stats: BoxStats,
}

/// Main panel of a joint plot.
#[derive(Debug, Clone, PartialEq)]
pub enum JointMain {
    Regression {
        points: Vec<[f64; 2]>,
        /// Fitted line endpoints, absent when x is constant.
        fit: Option<[[f64; 2]; 2]>,
    },
    Hex(HexGrid),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PairCell {
    Histogram(Vec<Bin>),
    Scatter(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Index into the owning artifact's `groups`.
    pub group: usize,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreemapTile {
    pub label: String,
    pub value: f64,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projected3d {
    pub axis_labels: [String; 3],
    pub points: Vec<[f64; 2]>,
    /// The twelve edges of the bounding cube.
    pub edges: Vec<[[f64; 2]; 2]>,
    /// Where each axis label sits.
    pub label_anchors: [[f64; 2]; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

/// Everything a chart block can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartArtifact {
    Bars {
        axes: Axes,
        values: Vec<f64>,
    },
    StackedBars {
        axes: Axes,
        legend_title: String,
        /// `(series name, value per x category)`.
        series: Vec<(String, Vec<f64>)>,
    },
    Line {
        axes: Axes,
        points: Vec<[f64; 2]>,
    },
    Pie {
        wedges: Vec<Wedge>,
    },
    Histogram {
        axes: Axes,
        bins: Vec<Bin>,
    },
    Scatter {
        axes: Axes,
        points: Vec<[f64; 2]>,
    },
    Hexbin {
        axes: Axes,
        grid: HexGrid,
    },
    Density {
        axes: Axes,
        curve: Vec<[f64; 2]>,
    },
    BoxPlot {
        axes: Axes,
        boxes: Vec<BoxStats>,
    },
    Violin {
        axes: Axes,
        violins: Vec<ViolinShape>,
    },
    Strip(CategoryPoints),
    Swarm(CategoryPoints),
    Joint {
        axes: Axes,
        main: JointMain,
        top: Vec<Bin>,
        right: Vec<Bin>,
    },
    PairGrid {
        columns: Vec<String>,
        /// `cells[row][col]`; the diagonal holds histograms.
        cells: Vec<Vec<PairCell>>,
    },
    Heatmap(Correlation),
    Scatter3d(Projected3d),
    Treemap {
        tiles: Vec<TreemapTile>,
    },
    Curves {
        axes: Axes,
        groups: Vec<String>,
        curves: Vec<Curve>,
    },
    Extras {
        correlation: Option<Correlation>,
        pivot: Option<PivotTable>,
    },
}

impl ChartArtifact {
    /// Short name of the artifact kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartArtifact::Bars { .. } => "bars",
            ChartArtifact::StackedBars { .. } => "stacked-bars",
            ChartArtifact::Line { .. } => "line",
            ChartArtifact::Pie { .. } => "pie",
            ChartArtifact::Histogram { .. } => "histogram",
            ChartArtifact::Scatter { .. } => "scatter",
            ChartArtifact::Hexbin { .. } => "hexbin",
            ChartArtifact::Density { .. } => "density",
            ChartArtifact::BoxPlot { .. } => "box",
            ChartArtifact::Violin { .. } => "violin",
            ChartArtifact::Strip(_) => "strip",
            ChartArtifact::Swarm(_) => "swarm",
            ChartArtifact::Joint { .. } => "joint",
            ChartArtifact::PairGrid { .. } => "pair-grid",
            ChartArtifact::Heatmap(_) => "heatmap",
            ChartArtifact::Scatter3d(_) => "scatter-3d",
            ChartArtifact::Treemap { .. } => "treemap",
            ChartArtifact::Curves { .. } => "curves",
            ChartArtifact::Extras { .. } => "extras",
        }
    }
}
