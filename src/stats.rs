//! Small numeric helpers behind box plots, trendlines and histograms.

use serde::{Deserialize, Serialize};

/// Linear-interpolated quantile of sorted data (`q` in `[0, 1]`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_fence: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_fence: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let lo_limit = q1 - 1.5 * iqr;
        let hi_limit = q3 + 1.5 * iqr;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= lo_limit && *v <= hi_limit)
            .collect();
        let outliers: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_limit || *v > hi_limit)
            .collect();

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_fence: inside.first().copied().unwrap_or(q1),
            upper_fence: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }
}

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    /// `None` when fewer than two distinct x values are present.
    pub fn ols(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let mx = mean(xs)?;
        let my = mean(ys)?;
        let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
        if sxx <= f64::EPSILON {
            return None;
        }
        let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
        let syy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
        let slope = sxy / sxx;
        let intercept = my - slope * mx;
        let r_squared = if syy > 0.0 {
            (sxy * sxy) / (sxx * syy)
        } else {
            1.0
        };
        Some(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bin edges over `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    pub min: f64,
    pub width: f64,
    pub bins: usize,
}

impl BinEdges {
    /// Edges spanning the finite values; a constant series gets one unit-wide bin.
    pub fn spanning(values: &[f64], bins: usize) -> Option<Self> {
        let sorted = sorted_finite(values);
        let (min, max) = (*sorted.first()?, *sorted.last()?);
        if bins == 0 {
            return None;
        }
        if max == min {
            return Some(Self {
                min,
                width: 1.0,
                bins: 1,
            });
        }
        Some(Self {
            min,
            width: (max - min) / bins as f64,
            bins,
        })
    }

    /// Bin index for `v`; the upper edge belongs to the last bin.
    pub fn index(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.min {
            return None;
        }
        let idx = ((v - self.min) / self.width).floor() as usize;
        if idx >= self.bins {
            let end = self.min + self.width * self.bins as f64;
            if v <= end + self.width * 1e-9 {
                Some(self.bins - 1)
            } else {
                None
            }
        } else {
            Some(idx)
        }
    }

    pub fn count(&self, values: &[f64]) -> Vec<Bin> {
        let mut bins: Vec<Bin> = (0..self.bins)
            .map(|i| Bin {
                start: self.min + self.width * i as f64,
                end: self.min + self.width * (i + 1) as f64,
                count: 0,
            })
            .collect();
        for v in values {
            if let Some(i) = self.index(*v) {
                bins[i].count += 1;
            }
        }
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&v, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&v, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn box_stats_flag_outliers() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_fence, 4.0);
        assert_eq!(stats.lower_fence, 1.0);
        assert_eq!(stats.max, 100.0);
    }

    #[test]
    fn box_stats_single_value() {
        let stats = BoxStats::from_values(&[7.0]).unwrap();
        assert_eq!(stats.q1, 7.0);
        assert_eq!(stats.q3, 7.0);
        assert!(stats.outliers.is_empty());
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn ols_recovers_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        let fit = LinearFit::ols(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(LinearFit::ols(&[2.0, 2.0], &[1.0, 3.0]).is_none());
        assert!(LinearFit::ols(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn bins_cover_range_and_keep_max() {
        let values = [0.0, 1.0, 2.0, 3.0, 10.0];
        let edges = BinEdges::spanning(&values, 5).unwrap();
        let bins = edges.count(&values);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[4].count, 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn constant_series_gets_one_bin() {
        let edges = BinEdges::spanning(&[5.0, 5.0, 5.0], 15).unwrap();
        assert_eq!(edges.bins, 1);
        assert_eq!(edges.count(&[5.0, 5.0, 5.0])[0].count, 3);
    }
}
