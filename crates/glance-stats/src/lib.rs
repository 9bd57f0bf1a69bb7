//! Pure, stateless numeric functions over `f64` slices.
//!
//! Every function degrades to NaN on degenerate input (empty slice, zero
//! variance) instead of returning an error — callers are expected to guard
//! before display.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. Empty input yields NaN.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the average of the two middle elements on even length.
/// Empty input yields NaN.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Population standard deviation (divide by N, not N-1).
pub fn std_dev(values: &[f64]) -> f64 {
    let avg = mean(values);
    let variance = values.iter().map(|n| (n - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient. Zero variance in either series yields
/// NaN via division by zero.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();
    let sum_y2: f64 = y.iter().map(|yi| yi * yi).sum();

    (n * sum_xy - sum_x * sum_y)
        / ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt()
}

/// Ordinary-least-squares fit of y over x.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearRegression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through (x, y) pairs. Degenerate input (empty, constant x)
/// produces NaN coefficients.
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearRegression {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    LinearRegression { slope, intercept }
}

/// Extrapolate `periods` future points by fitting a line over the series
/// with its index as x.
pub fn forecast(values: &[f64], periods: usize) -> Vec<f64> {
    let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let fit = linear_regression(&x, values);
    (0..periods)
        .map(|i| fit.predict((values.len() + i) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_std_dev_constant_series() {
        assert_eq!(std_dev(&[2.0, 2.0, 2.0, 2.0]), 0.0);
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((correlation(&x, &y) - 1.0).abs() < 1e-12);

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((correlation(&x, &inverse) + 1.0).abs() < 1e-12);

        // Zero variance degrades to NaN, never panics.
        assert!(correlation(&x, &[5.0, 5.0, 5.0, 5.0]).is_nan());
    }

    #[test]
    fn test_linear_regression_exact_fit() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_regression(&x, &y);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_forecast_extends_trend() {
        let values = [10.0, 20.0, 30.0];
        let next = forecast(&values, 2);
        assert_eq!(next.len(), 2);
        assert!((next[0] - 40.0).abs() < 1e-9);
        assert!((next[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_empty_is_nan() {
        let next = forecast(&[], 3);
        assert_eq!(next.len(), 3);
        assert!(next.iter().all(|v| v.is_nan()));
    }
}
