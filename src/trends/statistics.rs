//! Trend statistics
//!
//! Everything here works on a `(date, value)` series and uses the point index
//! as x, so spacing between dates is treated as uniform.

use serde::{Deserialize, Serialize};

use super::{TrendPoint, TrendSummary};

/// Peaks and valleys must sit further than this many standard deviations from the mean
pub const SIGNIFICANCE_STD_DEVS: f64 = 0.5;

/// Ordinary least squares fit `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Value of the fit at index `x`
    pub fn at(&self, x: usize) -> f64 {
        self.slope * x as f64 + self.intercept
    }
}

/// Fit a trend line with x = 0..n-1. Fewer than two points give a flat zero line.
pub fn calculate_trend_line(values: &[f64]) -> LinearTrend {
    let n = values.len();
    if n < 2 {
        return LinearTrend::default();
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    LinearTrend {
        slope,
        intercept: y_mean - slope * x_mean,
    }
}

/// Evaluate the fit at every index of a series of length `len`
pub fn trend_line_values(trend: &LinearTrend, len: usize) -> Vec<f64> {
    (0..len).map(|i| trend.at(i)).collect()
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Global maximum and minimum points. The first occurrence wins ties.
pub fn find_max_and_min(series: &[TrendPoint]) -> Option<(TrendPoint, TrendPoint)> {
    let first = series.first()?;
    let mut max = first;
    let mut min = first;

    for point in &series[1..] {
        if point.value > max.value {
            max = point;
        }
        if point.value < min.value {
            min = point;
        }
    }

    Some((max.clone(), min.clone()))
}

/// Significant local maxima and minima.
///
/// An interior point is a peak when it is strictly above both neighbours and
/// its distance from the mean exceeds [`SIGNIFICANCE_STD_DEVS`] standard
/// deviations; valleys mirror this. When nothing qualifies, the global max
/// (or min) stands in, so both lists are non-empty whenever data exists.
pub fn find_peaks_and_valleys(series: &[TrendPoint]) -> (Vec<TrendPoint>, Vec<TrendPoint>) {
    let mut peaks = Vec::new();
    let mut valleys = Vec::new();

    if series.len() >= 3 {
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        let m = mean(&values);
        let threshold = population_std_dev(&values) * SIGNIFICANCE_STD_DEVS;

        for window in series.windows(3) {
            let (prev, current, next) = (&window[0], &window[1], &window[2]);
            let significant = (current.value - m).abs() > threshold;

            if significant && current.value > prev.value && current.value > next.value {
                peaks.push(current.clone());
            }
            if significant && current.value < prev.value && current.value < next.value {
                valleys.push(current.clone());
            }
        }
    }

    if let Some((max, min)) = find_max_and_min(series) {
        if peaks.is_empty() {
            peaks.push(max);
        }
        if valleys.is_empty() {
            valleys.push(min);
        }
    }

    (peaks, valleys)
}

/// Direction of a series judged from its first and last values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Flat,
}

impl TrendDirection {
    /// Compare the last value against the first; fewer than two points is flat
    pub fn from_values(values: &[f64]) -> Self {
        match (values.first(), values.last()) {
            (Some(first), Some(last)) if values.len() >= 2 => {
                if last > first {
                    Self::Increasing
                } else if last < first {
                    Self::Decreasing
                } else {
                    Self::Flat
                }
            }
            _ => Self::Flat,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Flat => "flat",
        }
    }
}

/// Percentage change from the first to the last value.
///
/// A zero starting value yields 100 when the series ends positive, else 0.
pub fn growth_rate(values: &[f64]) -> f64 {
    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };

    if first == 0.0 {
        if last > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (last - first) / first * 100.0
    }
}

/// Population standard deviation over mean; 0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    population_std_dev(values) / m.abs()
}

/// Compute the full set of trend statistics for a series.
///
/// The input is sorted by date first; point details are left empty for the
/// caller to attach.
pub fn compute_trend(series: &[TrendPoint]) -> TrendSummary {
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let values: Vec<f64> = sorted.iter().map(|p| p.value).collect();
    let trend_line = calculate_trend_line(&values);
    let trend_values = trend_line_values(&trend_line, values.len());
    let (peaks, valleys) = find_peaks_and_valleys(&sorted);
    let extrema = find_max_and_min(&sorted);

    TrendSummary {
        dates: sorted.iter().map(|p| p.date.clone()).collect(),
        mean: mean(&values),
        values,
        trend_values,
        trend_line,
        max: extrema.as_ref().map(|(max, _)| max.clone()),
        min: extrema.map(|(_, min)| min),
        peaks,
        valleys,
        point_details: Default::default(),
    }
}
