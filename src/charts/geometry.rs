//! Layout math for the chart kinds the plotting widget has no primitive
//! for: hexagonal bins, pie wedges, treemaps, beeswarms, Andrews curves
//! and the 3D projection.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use super::artifact::HexGrid;

// ---------------------------------------------------------------------------
// Hexagonal binning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    pub center: [f64; 2],
    pub count: usize,
}

/// Bin points into a hexagonal lattice with `gridsize` hexagons across x.
///
/// Two offset rectangular lattices are overlaid; each point goes to the
/// nearer centre, which yields hexagonal cells.
pub fn hexbin(points: &[[f64; 2]], gridsize: usize) -> Option<HexGrid> {
    let gridsize = gridsize.max(1);
    let (mut xmin, mut xmax) = bounds(points.iter().map(|p| p[0]))?;
    let (mut ymin, mut ymax) = bounds(points.iter().map(|p| p[1]))?;
    if xmin == xmax {
        xmin -= 0.5;
        xmax += 0.5;
    }
    if ymin == ymax {
        ymin -= 0.5;
        ymax += 0.5;
    }
    let nx = gridsize as f64;
    let ny = ((gridsize as f64) / 3f64.sqrt()).floor().max(1.0);
    let pad = 1e-9 * (xmax - xmin);
    xmin -= pad;
    xmax += pad;
    let sx = (xmax - xmin) / nx;
    let sy = (ymax - ymin) / ny;

    // (lattice, ix, iy) → count
    let mut counts: BTreeMap<(u8, i64, i64), usize> = BTreeMap::new();
    for p in points {
        let x = (p[0] - xmin) / sx;
        let y = (p[1] - ymin) / sy;
        let (ix1, iy1) = (x.round(), y.round());
        let (ix2, iy2) = (x.floor(), y.floor());
        let d1 = (x - ix1).powi(2) + 3.0 * (y - iy1).powi(2);
        let d2 = (x - ix2 - 0.5).powi(2) + 3.0 * (y - iy2 - 0.5).powi(2);
        let key = if d1 < d2 {
            (0, ix1 as i64, iy1 as i64)
        } else {
            (1, ix2 as i64, iy2 as i64)
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let cells: Vec<HexCell> = counts
        .into_iter()
        .map(|((lattice, ix, iy), count)| {
            let offset = if lattice == 0 { 0.0 } else { 0.5 };
            HexCell {
                center: [
                    xmin + (ix as f64 + offset) * sx,
                    ymin + (iy as f64 + offset) * sy,
                ],
                count,
            }
        })
        .collect();
    let max_count = cells.iter().map(|c| c.count).max().unwrap_or(0);
    Some(HexGrid {
        cells,
        sx,
        sy,
        max_count,
    })
}

/// Vertices of the hexagon around `center` for a grid with spacing `sx`, `sy`.
pub fn hexagon(center: [f64; 2], sx: f64, sy: f64) -> Vec<[f64; 2]> {
    const UNIT: [[f64; 2]; 6] = [
        [0.5, -0.5],
        [0.5, 0.5],
        [0.0, 1.0],
        [-0.5, 0.5],
        [-0.5, -0.5],
        [0.0, -1.0],
    ];
    UNIT.iter()
        .map(|[dx, dy]| [center[0] + dx * sx, center[1] + dy * sy / 3.0])
        .collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// Pie wedges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    /// Degrees, counter-clockwise from the positive x axis.
    pub start_deg: f64,
    pub end_deg: f64,
}

impl Wedge {
    /// Closed outline of the wedge on a circle of `radius` at the origin.
    /// Concave once the wedge spans more than 180°; fill with [`Self::pieces`].
    pub fn polygon(&self, radius: f64) -> Vec<[f64; 2]> {
        let mut pts = vec![[0.0, 0.0]];
        pts.extend(arc(self.start_deg, self.end_deg, radius));
        pts
    }

    /// The wedge cut into convex sectors of at most 90° each.
    pub fn pieces(&self, radius: f64) -> Vec<Vec<[f64; 2]>> {
        let span = self.end_deg - self.start_deg;
        let n = ((span.abs() / 90.0).ceil() as usize).max(1);
        (0..n)
            .map(|i| {
                let from = self.start_deg + span * i as f64 / n as f64;
                let to = self.start_deg + span * (i + 1) as f64 / n as f64;
                let mut pts = vec![[0.0, 0.0]];
                pts.extend(arc(from, to, radius));
                pts
            })
            .collect()
    }

    /// Point halfway along the wedge at `radius`, for labels.
    pub fn label_anchor(&self, radius: f64) -> [f64; 2] {
        let a = ((self.start_deg + self.end_deg) / 2.0).to_radians();
        [radius * a.cos(), radius * a.sin()]
    }
}

/// Points along an arc in steps of at most 3°, both ends included.
fn arc(from_deg: f64, to_deg: f64, radius: f64) -> impl Iterator<Item = [f64; 2]> {
    let span = to_deg - from_deg;
    let steps = ((span.abs() / 3.0).ceil() as usize).max(1);
    (0..=steps).map(move |i| {
        let a = (from_deg + span * i as f64 / steps as f64).to_radians();
        [radius * a.cos(), radius * a.sin()]
    })
}

/// True when every turn along the closed polygon bends the same way.
/// Collinear and repeated vertices are allowed.
#[cfg(test)]
pub(crate) fn is_convex(polygon: &[[f64; 2]]) -> bool {
    let n = polygon.len();
    if n < 4 {
        return true;
    }
    let (mut left, mut right) = (false, false);
    for i in 0..n {
        let [ax, ay] = polygon[i];
        let [bx, by] = polygon[(i + 1) % n];
        let [cx, cy] = polygon[(i + 2) % n];
        let cross = (bx - ax) * (cy - by) - (by - ay) * (cx - bx);
        if cross > 1e-12 {
            left = true;
        } else if cross < -1e-12 {
            right = true;
        }
    }
    !(left && right)
}

/// Lay wedges out counter-clockwise starting at `start_deg`.
/// Returns `None` when a value is negative or the total is not positive.
pub fn pie_wedges(slices: &[(String, f64)], start_deg: f64) -> Option<Vec<Wedge>> {
    if slices.iter().any(|(_, v)| *v < 0.0 || !v.is_finite()) {
        return None;
    }
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return None;
    }
    let mut angle = start_deg;
    Some(
        slices
            .iter()
            .map(|(label, value)| {
                let fraction = value / total;
                let start = angle;
                angle += fraction * 360.0;
                Wedge {
                    label: label.clone(),
                    value: *value,
                    fraction,
                    start_deg: start,
                    end_deg: angle,
                }
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Squarified treemap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Rect {
    pub fn corners(&self) -> Vec<[f64; 2]> {
        vec![
            [self.x, self.y],
            [self.x + self.dx, self.y],
            [self.x + self.dx, self.y + self.dy],
            [self.x, self.y + self.dy],
        ]
    }

    pub fn center(&self) -> [f64; 2] {
        [self.x + self.dx / 2.0, self.y + self.dy / 2.0]
    }

    pub fn area(&self) -> f64 {
        self.dx * self.dy
    }
}

/// Squarified treemap of positive `sizes` filling `bounds`, one rectangle
/// per size in input order.
pub fn squarify(sizes: &[f64], bounds: Rect) -> Vec<Rect> {
    let total: f64 = sizes.iter().sum();
    if sizes.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    let scale = bounds.area() / total;
    let mut remaining: Vec<f64> = sizes.iter().map(|s| s * scale).collect();
    let mut area = bounds;
    let mut rects = Vec::with_capacity(sizes.len());

    while !remaining.is_empty() {
        if remaining.len() == 1 {
            rects.extend(layout(&remaining, area));
            break;
        }
        let mut i = 1;
        while i < remaining.len()
            && worst_ratio(&remaining[..i], area) >= worst_ratio(&remaining[..=i], area)
        {
            i += 1;
        }
        rects.extend(layout(&remaining[..i], area));
        area = leftover(&remaining[..i], area);
        remaining.drain(..i);
    }
    rects
}

fn layout(sizes: &[f64], area: Rect) -> Vec<Rect> {
    let covered: f64 = sizes.iter().sum();
    let mut out = Vec::with_capacity(sizes.len());
    if area.dx >= area.dy {
        let width = covered / area.dy;
        let mut y = area.y;
        for s in sizes {
            out.push(Rect {
                x: area.x,
                y,
                dx: width,
                dy: s / width,
            });
            y += s / width;
        }
    } else {
        let height = covered / area.dx;
        let mut x = area.x;
        for s in sizes {
            out.push(Rect {
                x,
                y: area.y,
                dx: s / height,
                dy: height,
            });
            x += s / height;
        }
    }
    out
}

fn leftover(sizes: &[f64], area: Rect) -> Rect {
    let covered: f64 = sizes.iter().sum();
    if area.dx >= area.dy {
        let width = covered / area.dy;
        Rect {
            x: area.x + width,
            y: area.y,
            dx: area.dx - width,
            dy: area.dy,
        }
    } else {
        let height = covered / area.dx;
        Rect {
            x: area.x,
            y: area.y + height,
            dx: area.dx,
            dy: area.dy - height,
        }
    }
}

fn worst_ratio(sizes: &[f64], area: Rect) -> f64 {
    layout(sizes, area)
        .iter()
        .map(|r| (r.dx / r.dy).max(r.dy / r.dx))
        .fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
// Strip jitter and beeswarm
// ---------------------------------------------------------------------------

/// Deterministic offset in `[-half_width, half_width]` for row `seed`.
pub fn jitter(seed: usize, half_width: f64) -> f64 {
    // splitmix64
    let mut z = (seed as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    let unit = (z >> 11) as f64 / (1u64 << 53) as f64;
    (unit * 2.0 - 1.0) * half_width
}

/// Horizontal offsets that keep markers of radius `rx` × `ry` (in data
/// units) from overlapping. Offsets never exceed `max_offset`.
pub fn swarm_offsets(values: &[f64], rx: f64, ry: f64, max_offset: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut offsets = vec![0.0; values.len()];
    let mut placed: Vec<(f64, f64)> = Vec::with_capacity(values.len());
    for idx in order {
        let y = values[idx];
        let neighbours: Vec<(f64, f64)> = placed
            .iter()
            .copied()
            .filter(|(_, py)| ((y - py) / ry).abs() < 2.0)
            .collect();

        let mut candidates = vec![0.0];
        for (px, py) in &neighbours {
            let dy = (y - py) / ry;
            let dx = (4.0 - dy * dy).max(0.0).sqrt() * rx;
            candidates.push(px + dx);
            candidates.push(px - dx);
        }
        candidates.sort_by(|a: &f64, b: &f64| a.abs().total_cmp(&b.abs()));

        let fits = |x: f64| {
            neighbours.iter().all(|(px, py)| {
                let nx = (x - px) / rx;
                let ny = (y - py) / ry;
                nx * nx + ny * ny >= 4.0 - 1e-9
            })
        };
        let x = candidates
            .into_iter()
            .find(|&c| fits(c))
            .unwrap_or(0.0)
            .clamp(-max_offset, max_offset);
        offsets[idx] = x;
        placed.push((x, y));
    }
    offsets
}

// ---------------------------------------------------------------------------
// Andrews curves
// ---------------------------------------------------------------------------

/// `f(t) = x1/√2 + x2·sin t + x3·cos t + x4·sin 2t + x5·cos 2t + …`
/// sampled at `samples` points over `[-π, π]`.
pub fn andrews_curve(row: &[f64], samples: usize) -> Vec<[f64; 2]> {
    let samples = samples.max(2);
    (0..samples)
        .map(|i| {
            let t = -PI + 2.0 * PI * i as f64 / (samples - 1) as f64;
            let mut f = row.first().copied().unwrap_or(0.0) * FRAC_1_SQRT_2;
            for (k, x) in row.iter().enumerate().skip(1) {
                let harmonic = ((k + 1) / 2) as f64;
                f += if k % 2 == 1 {
                    x * (harmonic * t).sin()
                } else {
                    x * (harmonic * t).cos()
                };
            }
            [t, f]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 3D projection
// ---------------------------------------------------------------------------

/// Orthographic view of the unit cube from azimuth/elevation in degrees.
#[derive(Debug, Clone, Copy)]
pub struct View3d {
    right: [f64; 3],
    up: [f64; 3],
}

impl View3d {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        let (az, el) = (azimuth_deg.to_radians(), elevation_deg.to_radians());
        Self {
            right: [-az.sin(), az.cos(), 0.0],
            up: [-el.sin() * az.cos(), -el.sin() * az.sin(), el.cos()],
        }
    }

    /// Project a point of the unit cube (centred on 0.5) to the screen plane.
    pub fn project(&self, p: [f64; 3]) -> [f64; 2] {
        let c = [p[0] - 0.5, p[1] - 0.5, p[2] - 0.5];
        let dot = |v: [f64; 3]| c[0] * v[0] + c[1] * v[1] + c[2] * v[2];
        [dot(self.right), dot(self.up)]
    }

    /// The twelve cube edges, projected.
    pub fn cube_edges(&self) -> Vec<[[f64; 2]; 2]> {
        let mut edges = Vec::with_capacity(12);
        for a in [0.0, 1.0] {
            for b in [0.0, 1.0] {
                edges.push([self.project([0.0, a, b]), self.project([1.0, a, b])]);
                edges.push([self.project([a, 0.0, b]), self.project([a, 1.0, b])]);
                edges.push([self.project([a, b, 0.0]), self.project([a, b, 1.0])]);
            }
        }
        edges
    }
}

/// Scale values into `[0, 1]`; a constant column maps to 0.5.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = bounds(values.iter().copied()) else {
        return Vec::new();
    };
    let range = hi - lo;
    if range.abs() < f64::EPSILON {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - lo) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn hexbin_counts_every_point() {
        let points: Vec<[f64; 2]> = (0..200)
            .map(|i| [i as f64 * 0.37 % 11.0, (i * i) as f64 % 17.0])
            .collect();
        let grid = hexbin(&points, 10).unwrap();
        assert_eq!(grid.cells.iter().map(|c| c.count).sum::<usize>(), 200);
        assert!(grid.max_count >= 1);
        assert!(hexbin(&[], 10).is_none());
    }

    #[test]
    fn hexbin_handles_a_single_point() {
        let grid = hexbin(&[[2.0, 3.0]], 30).unwrap();
        assert_eq!(grid.cells.len(), 1);
        assert_eq!(grid.max_count, 1);
    }

    #[test]
    fn pie_wedges_cover_the_circle() {
        let slices = vec![("a".to_string(), 3.0), ("b".to_string(), 1.0)];
        let wedges = pie_wedges(&slices, 90.0).unwrap();
        assert!(approx(wedges[0].fraction, 0.75));
        assert!(approx(wedges[0].start_deg, 90.0));
        assert!(approx(wedges[1].end_deg, 450.0));
        assert!(pie_wedges(&[("x".to_string(), -1.0)], 90.0).is_none());
        assert!(pie_wedges(&[("x".to_string(), 0.0)], 90.0).is_none());
    }

    #[test]
    fn large_wedges_split_into_convex_pieces() {
        let slices = vec![("a".to_string(), 3.0), ("b".to_string(), 1.0)];
        let wedges = pie_wedges(&slices, 90.0).unwrap();
        assert!(!is_convex(&wedges[0].polygon(1.0)));

        let pieces = wedges[0].pieces(1.0);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| is_convex(p)));
        // Pieces meet exactly: the last arc point of one is the first of the next.
        for pair in pieces.windows(2) {
            let end = pair[0].last().unwrap();
            let start = pair[1][1];
            assert!(approx(end[0], start[0]) && approx(end[1], start[1]));
        }
        assert_eq!(wedges[1].pieces(1.0).len(), 1);
    }

    #[test]
    fn convexity_check() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(is_convex(&square));
        let dart = [[0.0, 0.0], [2.0, 1.0], [0.0, 2.0], [1.0, 1.0]];
        assert!(!is_convex(&dart));
        let flat = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        assert!(is_convex(&flat));
    }

    #[test]
    fn squarify_preserves_areas() {
        let sizes = [6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0];
        let bounds = Rect {
            x: 0.0,
            y: 0.0,
            dx: 100.0,
            dy: 100.0,
        };
        let rects = squarify(&sizes, bounds);
        assert_eq!(rects.len(), sizes.len());
        let total: f64 = sizes.iter().sum();
        for (r, s) in rects.iter().zip(sizes) {
            assert!((r.area() - s / total * 10_000.0).abs() < 1e-6);
            assert!(r.x >= -1e-9 && r.y >= -1e-9);
            assert!(r.x + r.dx <= 100.0 + 1e-6 && r.y + r.dy <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn jitter_is_bounded_and_deterministic() {
        for seed in 0..500 {
            let j = jitter(seed, 0.1);
            assert!((-0.1..=0.1).contains(&j));
            assert_eq!(j, jitter(seed, 0.1));
        }
    }

    #[test]
    fn swarm_points_do_not_overlap() {
        let values = [1.0, 1.0, 1.0, 1.05, 2.0, 1.02];
        let (rx, ry) = (0.02, 0.05);
        let offsets = swarm_offsets(&values, rx, ry, 0.45);
        for i in 0..values.len() {
            for j in i + 1..values.len() {
                let nx = (offsets[i] - offsets[j]) / rx;
                let ny = (values[i] - values[j]) / ry;
                assert!(nx * nx + ny * ny >= 4.0 - 1e-6, "{i} overlaps {j}");
            }
        }
        assert_eq!(offsets[4], 0.0);
    }

    #[test]
    fn andrews_curve_at_zero() {
        // t = 0: x1/√2 + x3 + x5
        let curve = andrews_curve(&[2.0, 5.0, 3.0, 7.0, 1.0], 3);
        assert!(approx(curve[1][0], 0.0));
        assert!(approx(curve[1][1], 2.0 * FRAC_1_SQRT_2 + 3.0 + 1.0));
    }

    #[test]
    fn projection_keeps_cube_centre_at_origin() {
        let view = View3d::new(-60.0, 30.0);
        assert_eq!(view.project([0.5, 0.5, 0.5]), [0.0, 0.0]);
        assert_eq!(view.cube_edges().len(), 12);
    }

    #[test]
    fn min_max_scale_handles_constants() {
        assert_eq!(min_max_scale(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(min_max_scale(&[7.0, 7.0]), vec![0.5, 0.5]);
    }
}
