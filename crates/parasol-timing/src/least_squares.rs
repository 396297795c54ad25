//! Ordinary least squares for `y = slope * x + intercept`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit through centered sums. A single sample (or samples sharing one `x`)
/// yields a flat line through the mean.
pub fn fit(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len());
    if n == 0 {
        return LinearFit::default();
    }
    if n == 1 {
        return LinearFit {
            slope: 0.0,
            intercept: y[0],
        };
    }

    let xbar = x[..n].iter().sum::<f64>() / n as f64;
    let ybar = y[..n].iter().sum::<f64>() / n as f64;

    let (top, bot) = x[..n]
        .iter()
        .zip(&y[..n])
        .fold((0.0, 0.0), |(top, bot), (&xi, &yi)| {
            (top + (xi - xbar) * (yi - ybar), bot + (xi - xbar) * (xi - xbar))
        });
    if bot == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: ybar,
        };
    }

    let slope = top / bot;
    LinearFit {
        slope,
        intercept: ybar - slope * xbar,
    }
}

/// Sum of squared residuals of `fit` over the samples
pub fn sum_squared_error(x: &[f64], y: &[f64], fit: &LinearFit) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - fit.at(xi)).powi(2))
        .sum()
}

/// Root mean squared error `sqrt(SSE / (n - 2))`; zero when `n <= 2`
pub fn rms_error(sse: f64, n: usize) -> f64 {
    if n <= 2 {
        0.0
    } else {
        (sse / (n - 2) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x: Vec<f64> = (0..=32).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|h| 3.0 * h + 7.0).collect();
        let line = fit(&x, &y);
        assert!((line.slope - 3.0).abs() < 1e-9);
        assert!((line.intercept - 7.0).abs() < 1e-9);
        assert!(sum_squared_error(&x, &y, &line) < 1e-18);
    }

    #[test]
    fn test_single_sample() {
        let line = fit(&[4.0], &[9.5]);
        assert_eq!(line, LinearFit { slope: 0.0, intercept: 9.5 });
    }

    #[test]
    fn test_noisy_residuum() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 2.0, 2.0, 3.0];
        let line = fit(&x, &y);
        assert!((line.slope - 0.6).abs() < 1e-12);
        assert!((line.intercept - 1.1).abs() < 1e-12);

        let sse = sum_squared_error(&x, &y, &line);
        assert!((sse - 0.2).abs() < 1e-12);
        assert!((rms_error(sse, 4) - 0.1f64.sqrt()).abs() < 1e-12);
        assert_eq!(rms_error(sse, 2), 0.0);
    }
}
