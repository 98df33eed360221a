use super::*;
use crate::*;
use anyhow::Context;
use linfa::prelude::*;
use linfa_elasticnet::MultiTaskElasticNet;
use ndarray::Array1;
use ndarray::Array2;
use serde::Deserialize;
use serde::Serialize;

/// A fitted multi-output linear model.
///
/// Fitting runs linfa's multi-task elastic net, which shares sparsity across
/// the ten target properties. Only the learned hyperplane and intercepts are
/// kept, so the estimator serializes without the solver's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    coefficients: Array2<f64>,
    intercept: Array1<f64>,
    device: Device,
}

impl Estimator {
    pub fn fit(features: &Array2<f64>, targets: &Array2<f64>, device: Device) -> anyhow::Result<Self> {
        anyhow::ensure!(
            features.nrows() == targets.nrows(),
            "{} feature rows but {} target rows",
            features.nrows(),
            targets.nrows()
        );
        anyhow::ensure!(features.nrows() > 0, "cannot fit on zero rows");
        anyhow::ensure!(targets.ncols() > 0, "cannot fit without target columns");
        let dataset = Dataset::new(features.to_owned(), targets.to_owned());
        let model = MultiTaskElasticNet::<f64>::params()
            .penalty(ELASTICNET_PENALTY)
            .l1_ratio(ELASTICNET_L1_RATIO)
            .max_iterations(ELASTICNET_MAX_ITERATIONS)
            .fit(&dataset)
            .context("fit multi-task elastic net")?;
        log::debug!(
            "fit elastic net on {} rows, {} features, {} targets",
            features.nrows(),
            features.ncols(),
            targets.ncols()
        );
        Ok(Self {
            coefficients: model.hyperplane().to_owned(),
            intercept: model.intercept().to_owned(),
            device,
        })
    }

    pub fn predict(&self, features: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        anyhow::ensure!(
            features.ncols() == self.n_features(),
            "estimator expects {} features, got {}",
            self.n_features(),
            features.ncols()
        );
        Ok(features.dot(&self.coefficients) + &self.intercept)
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.nrows()
    }
    pub fn n_targets(&self) -> usize {
        self.coefficients.ncols()
    }
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Place for Estimator {
    fn place(&mut self, device: Device) {
        self.device = device;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y0 = 2·x0 + 1, y1 = -x1 + 3 over a small grid.
    fn linear() -> (Array2<f64>, Array2<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(r, c)| ((r * (c + 3)) % 11) as f64 / 5.0);
        let y = Array2::from_shape_fn((40, 2), |(r, c)| match c {
            0 => 2.0 * x[[r, 0]] + 1.0,
            _ => -x[[r, 1]] + 3.0,
        });
        (x, y)
    }

    #[test]
    fn recovers_a_linear_relationship() {
        let (x, y) = linear();
        let estimator = Estimator::fit(&x, &y, Device::Cpu).unwrap();
        assert_eq!(estimator.n_features(), 2);
        assert_eq!(estimator.n_targets(), 2);
        let predicted = estimator.predict(&x).unwrap();
        assert!(r2_score(&y, &predicted).unwrap() > 0.95);
    }
    #[test]
    fn rejects_mismatched_rows_and_widths() {
        let (x, y) = linear();
        assert!(Estimator::fit(&x, &y.slice(ndarray::s![..10, ..]).to_owned(), Device::Cpu).is_err());
        let estimator = Estimator::fit(&x, &y, Device::Cpu).unwrap();
        assert!(estimator.predict(&Array2::zeros((1, 3))).is_err());
    }
    #[test]
    fn placement_records_device() {
        let (x, y) = linear();
        let mut estimator = Estimator::fit(&x, &y, Device::Cpu).unwrap();
        estimator.place(Device::Cuda);
        assert_eq!(estimator.device(), Device::Cuda);
    }
}
