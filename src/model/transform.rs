use super::*;
use crate::*;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use serde::Deserialize;
use serde::Serialize;

/// Requested target transformation, as named in a training config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    None,
    #[default]
    Power,
    Standard,
    Minmax,
}

impl Transformation {
    /// Fits the transform column-wise on `targets`. `None` yields no transformer.
    pub fn fit(self, targets: &Array2<f64>) -> anyhow::Result<Option<Transformer>> {
        anyhow::ensure!(targets.nrows() > 0, "cannot fit a target transform on zero rows");
        Ok(match self {
            Self::None => None,
            Self::Standard => {
                let (mean, scale) = moments(targets);
                Some(Transformer::Standard { mean, scale })
            }
            Self::Minmax => {
                let min = targets.fold_axis(Axis(0), f64::INFINITY, |a, &b| a.min(b));
                let max = targets.fold_axis(Axis(0), f64::NEG_INFINITY, |a, &b| a.max(b));
                let range = (&max - &min).mapv(nonzero);
                Some(Transformer::Minmax { min, range })
            }
            Self::Power => {
                let lambdas = targets
                    .axis_iter(Axis(1))
                    .map(optimize_lambda)
                    .collect::<Array1<f64>>();
                let (mean, scale) = moments(&yeo_johnson_columns(targets, &lambdas));
                Some(Transformer::Power {
                    lambdas,
                    mean,
                    scale,
                })
            }
        })
    }
}

/// A fitted, invertible, column-wise target transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transformer {
    /// Yeo-Johnson with a per-column lambda, then standardisation.
    Power {
        lambdas: Array1<f64>,
        mean: Array1<f64>,
        scale: Array1<f64>,
    },
    Standard {
        mean: Array1<f64>,
        scale: Array1<f64>,
    },
    Minmax {
        min: Array1<f64>,
        range: Array1<f64>,
    },
}

impl Transformer {
    pub fn width(&self) -> usize {
        match self {
            Self::Power { lambdas, .. } => lambdas.len(),
            Self::Standard { mean, .. } => mean.len(),
            Self::Minmax { min, .. } => min.len(),
        }
    }

    pub fn transform(&self, targets: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        self.check(targets)?;
        Ok(match self {
            Self::Power {
                lambdas,
                mean,
                scale,
            } => (yeo_johnson_columns(targets, lambdas) - mean) / scale,
            Self::Standard { mean, scale } => (targets - mean) / scale,
            Self::Minmax { min, range } => (targets - min) / range,
        })
    }

    pub fn inverse(&self, transformed: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        self.check(transformed)?;
        Ok(match self {
            Self::Power {
                lambdas,
                mean,
                scale,
            } => {
                let mut values = transformed * scale + mean;
                values
                    .axis_iter_mut(Axis(1))
                    .zip(lambdas.iter())
                    .for_each(|(mut column, &lambda)| {
                        column.mapv_inplace(|y| yeo_johnson_inverse(y, lambda))
                    });
                values
            }
            Self::Standard { mean, scale } => transformed * scale + mean,
            Self::Minmax { min, range } => transformed * range + min,
        })
    }

    fn check(&self, values: &Array2<f64>) -> anyhow::Result<()> {
        anyhow::ensure!(
            values.ncols() == self.width(),
            "target transform fit on {} columns, got {}",
            self.width(),
            values.ncols()
        );
        Ok(())
    }
}

/// Statistics live on the host; nothing to move.
impl Place for Transformer {
    fn place(&mut self, _: Device) {}
}

fn nonzero(scale: f64) -> f64 {
    if scale.abs() < f64::EPSILON { 1.0 } else { scale }
}

/// Column means and population standard deviations (zero spread maps to 1).
fn moments(values: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let mean = values
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(values.ncols()));
    let scale = values.std_axis(Axis(0), 0.0).mapv(nonzero);
    (mean, scale)
}

fn yeo_johnson_columns(values: &Array2<f64>, lambdas: &Array1<f64>) -> Array2<f64> {
    let mut out = values.to_owned();
    out.axis_iter_mut(Axis(1))
        .zip(lambdas.iter())
        .for_each(|(mut column, &lambda)| column.mapv_inplace(|x| yeo_johnson(x, lambda)));
    out
}

fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < f64::EPSILON {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

fn yeo_johnson_inverse(y: f64, lambda: f64) -> f64 {
    if y >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            y.exp_m1()
        } else {
            (y * lambda + 1.0).powf(1.0 / lambda) - 1.0
        }
    } else if (lambda - 2.0).abs() < f64::EPSILON {
        1.0 - (-y).exp()
    } else {
        1.0 - (1.0 - (2.0 - lambda) * y).powf(1.0 / (2.0 - lambda))
    }
}

/// Negative Yeo-Johnson log-likelihood of `column` under `lambda`.
fn negative_likelihood(column: ArrayView1<f64>, lambda: f64) -> f64 {
    let n = column.len() as f64;
    let transformed = column.mapv(|x| yeo_johnson(x, lambda));
    let mean = transformed.sum() / n;
    let variance = transformed.mapv(|t| (t - mean).powi(2)).sum() / n;
    if variance < f64::MIN_POSITIVE {
        return f64::INFINITY;
    }
    let jacobian = column
        .iter()
        .map(|x| x.signum() * x.abs().ln_1p())
        .sum::<f64>();
    n / 2.0 * variance.ln() - (lambda - 1.0) * jacobian
}

/// Maximum-likelihood lambda by golden-section search over the lambda bounds.
fn optimize_lambda(column: ArrayView1<f64>) -> f64 {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let (mut lo, mut hi) = POWER_LAMBDA_BOUNDS;
    for _ in 0..POWER_LAMBDA_ITERATIONS {
        let a = hi - ratio * (hi - lo);
        let b = lo + ratio * (hi - lo);
        if negative_likelihood(column, a) < negative_likelihood(column, b) {
            hi = b;
        } else {
            lo = a;
        }
    }
    (lo + hi) / 2.0
}
