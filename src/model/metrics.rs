use ndarray::Array2;
use ndarray::Axis;
use serde::Deserialize;
use serde::Serialize;

/// Regression quality of one trained pipeline.
///
/// `mse`, `rmse`, `mae` and `r2` come from the hold-out split; the `cv_*`
/// pair summarises R² over the k-fold refits. Errors are averaged uniformly
/// across target columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub cv_r2_mean: f64,
    pub cv_r2_std: f64,
}

impl Metrics {
    /// Hold-out metrics; cross-validation fields stay zero until attached.
    pub fn holdout(truth: &Array2<f64>, predicted: &Array2<f64>) -> anyhow::Result<Self> {
        check(truth, predicted)?;
        let residual = truth - predicted;
        let mse = residual.mapv(|r| r * r).mean().unwrap_or(0.0);
        let mae = residual.mapv(f64::abs).mean().unwrap_or(0.0);
        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2: r2_score(truth, predicted)?,
            ..Self::default()
        })
    }

    /// Attaches the mean and population spread of per-fold R² scores.
    pub fn with_folds(self, scores: &[f64]) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            cv_r2_mean: mean,
            cv_r2_std: var.sqrt(),
            ..self
        }
    }
}

/// Coefficient of determination averaged uniformly over target columns.
/// A constant column scores 1 when predicted exactly and 0 otherwise.
pub fn r2_score(truth: &Array2<f64>, predicted: &Array2<f64>) -> anyhow::Result<f64> {
    check(truth, predicted)?;
    let scores = truth
        .axis_iter(Axis(1))
        .zip(predicted.axis_iter(Axis(1)))
        .map(|(t, p)| {
            let mean = t.mean().unwrap_or(0.0);
            let residual = t.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
            let total = t.iter().map(|a| (a - mean).powi(2)).sum::<f64>();
            match (total == 0.0, residual == 0.0) {
                (false, _) => 1.0 - residual / total,
                (true, true) => 1.0,
                (true, false) => 0.0,
            }
        })
        .collect::<Vec<f64>>();
    Ok(scores.iter().sum::<f64>() / scores.len().max(1) as f64)
}

fn check(truth: &Array2<f64>, predicted: &Array2<f64>) -> anyhow::Result<()> {
    anyhow::ensure!(
        truth.dim() == predicted.dim(),
        "truth {:?} and prediction {:?} differ in shape",
        truth.dim(),
        predicted.dim()
    );
    anyhow::ensure!(truth.nrows() > 0, "cannot score zero rows");
    Ok(())
}
