//! Small numeric routines behind the charts: binning, densities,
//! quartiles, correlation and grouping.

use std::collections::BTreeMap;

/// Keep only the finite values.
pub fn finite(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect()
}

/// Rows where every column has a finite value (a `dropna` over the subset).
pub fn complete_rows(columns: &[&[Option<f64>]]) -> Vec<Vec<f64>> {
    let Some(first) = columns.first() else {
        return Vec::new();
    };
    (0..first.len())
        .filter_map(|row| {
            columns
                .iter()
                .map(|col| col.get(row).copied().flatten().filter(|v| v.is_finite()))
                .collect::<Option<Vec<f64>>>()
        })
        .collect()
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One histogram bin: `[start, end)` (the last bin is closed) and its count.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bins over `[min, max]`. A constant sample gets a unit-wide
/// range centred on the value.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let Some((mut lo, mut hi)) = min_max(values) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Kernel density estimate
// ---------------------------------------------------------------------------

/// Gaussian KDE with Scott's bandwidth, evaluated on `points` grid points
/// that extend three bandwidths past the data.
///
/// Returns `None` when the sample has fewer than two distinct values.
pub fn kde(values: &[f64], points: usize) -> Option<Vec<[f64; 2]>> {
    let (lo, hi) = min_max(values)?;
    if lo == hi || points < 2 {
        return None;
    }
    let n = values.len() as f64;
    let bw = std_dev(values)? * n.powf(-1.0 / 5.0);
    if bw <= 0.0 || !bw.is_finite() {
        return None;
    }
    let start = lo - 3.0 * bw;
    let end = hi + 3.0 * bw;
    let step = (end - start) / (points - 1) as f64;
    let norm = 1.0 / (n * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        (0..points)
            .map(|i| {
                let x = start + i as f64 * step;
                let density: f64 = values
                    .iter()
                    .map(|&v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                    .sum();
                [x, density * norm]
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Quartiles / box statistics
// ---------------------------------------------------------------------------

/// Quantile by linear interpolation between closest ranks; `sorted` must be
/// ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Tukey box: whiskers reach the most extreme points within 1.5 IQR.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;
    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);
    let outliers = sorted
        .into_iter()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();
    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

// ---------------------------------------------------------------------------
// Correlation / regression
// ---------------------------------------------------------------------------

/// Pearson correlation over rows where both values are present.
/// `NaN` when undefined.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Square correlation matrix over the given columns.
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

/// Ordinary least squares `y = slope * x + intercept`.
pub fn linear_fit(points: &[[f64; 2]]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p[0] - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|p| (p[0] - mx) * (p[1] - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Sum of `values` per label, labels in sorted order. Rows with a missing
/// label or value are dropped.
pub fn group_sums<K: Ord + Clone>(labels: &[Option<K>], values: &[Option<f64>]) -> BTreeMap<K, f64> {
    let mut sums = BTreeMap::new();
    for (label, value) in labels.iter().zip(values) {
        if let (Some(label), Some(value)) = (label, value) {
            if value.is_finite() {
                *sums.entry(label.clone()).or_insert(0.0) += value;
            }
        }
    }
    sums
}

/// Values per label with labels in order of first appearance.
pub fn group_values(labels: &[Option<String>], values: &[Option<f64>]) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (label, value) in labels.iter().zip(values) {
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        match groups.iter_mut().find(|(l, _)| l == label) {
            Some((_, vals)) => vals.push(*value),
            None => groups.push((label.clone(), vec![*value])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let values = [1.0, 2.0, 2.5, 3.0, 10.0];
        let bins = histogram(&values, 3);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[2].count, 1, "max lands in the closed last bin");
        assert!(approx(bins[0].start, 1.0));
        assert!(approx(bins[2].end, 10.0));
    }

    #[test]
    fn histogram_of_constant_sample() {
        let bins = histogram(&[4.0, 4.0], 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(approx(bins[0].start, 3.5));
        assert!(histogram(&[], 4).is_empty());
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.0, 3.0, 5.0, 8.0];
        let curve = kde(&values, 400).unwrap();
        let step = curve[1][0] - curve[0][0];
        let area: f64 = curve.iter().map(|p| p[1] * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area = {area}");
        assert!(kde(&[3.0, 3.0], 100).is_none());
    }

    #[test]
    fn quartiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&sorted, 0.5), 2.5));
        assert!(approx(quantile(&sorted, 0.25), 1.75));
    }

    #[test]
    fn box_stats_split_outliers() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!(approx(stats.median, 3.0));
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(approx(stats.upper_whisker, 4.0));
        assert!(approx(stats.lower_whisker, 1.0));
    }

    #[test]
    fn pearson_uses_pairwise_complete_rows() {
        let a = [Some(1.0), Some(2.0), None, Some(4.0)];
        let b = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        assert!(approx(pearson(&a, &b), 1.0));
        let c = [Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert!(pearson(&a, &c).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let cols = vec![
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![Some(3.0), Some(1.0), Some(2.0)],
        ];
        let m = correlation_matrix(&cols);
        assert!(approx(m[0][0], 1.0));
        assert!(approx(m[1][1], 1.0));
        assert!(approx(m[0][1], m[1][0]));
    }

    #[test]
    fn linear_fit_recovers_line() {
        let pts = [[0.0, 1.0], [1.0, 3.0], [2.0, 5.0]];
        let (slope, intercept) = linear_fit(&pts).unwrap();
        assert!(approx(slope, 2.0));
        assert!(approx(intercept, 1.0));
        assert!(linear_fit(&[[1.0, 1.0], [1.0, 2.0]]).is_none());
    }

    #[test]
    fn group_sums_drop_missing_rows() {
        let labels = [Some("b".to_string()), Some("a".to_string()), None, Some("b".to_string())];
        let values = [Some(1.0), Some(2.0), Some(5.0), None];
        let sums = group_sums(&labels, &values);
        assert_eq!(
            sums.into_iter().collect::<Vec<_>>(),
            vec![("a".to_string(), 2.0), ("b".to_string(), 1.0)]
        );
    }

    #[test]
    fn group_values_keep_first_appearance_order() {
        let labels = [Some("z".to_string()), Some("a".to_string()), Some("z".to_string())];
        let values = [Some(1.0), Some(2.0), Some(3.0)];
        let groups = group_values(&labels, &values);
        assert_eq!(groups[0], ("z".to_string(), vec![1.0, 3.0]));
        assert_eq!(groups[1], ("a".to_string(), vec![2.0]));
    }

    #[test]
    fn complete_rows_drop_any_missing() {
        let a = [Some(1.0), None, Some(3.0)];
        let b = [Some(4.0), Some(5.0), Some(f64::NAN)];
        assert_eq!(complete_rows(&[&a[..], &b[..]]), vec![vec![1.0, 4.0]]);
    }
}
