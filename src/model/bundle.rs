use super::*;
use crate::features::*;
use crate::training::TrainingConfig;
use anyhow::Context;
use chrono::DateTime;
use chrono::Utc;
use ndarray::Array2;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// A fitted pipeline plus everything needed to reuse it.
///
/// The bundle is the unit persisted by the artifact store and loaded by the
/// predictor. It is immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub estimator: Estimator,
    pub transformer: Option<Transformer>,
    pub feature_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub config: TrainingConfig,
    pub metrics: Metrics,
    pub training_date: DateTime<Utc>,
    pub device: Device,
}

impl Bundle {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).context("encode model bundle")
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let (bundle, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .context("decode model bundle")?;
        Ok(bundle)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("load {}", path.display()))
    }

    /// True when the estimator was fit on weighted-average columns.
    pub fn engineered(&self) -> bool {
        self.feature_columns.contains(&weighted_column(1))
    }

    /// Predicts targets in original units for an assembled feature table.
    pub fn predict(&self, table: &Table) -> anyhow::Result<Array2<f64>> {
        let engineered;
        let table = match self.engineered() && table.position(&weighted_column(1)).is_none() {
            true => {
                engineered = table.engineer();
                &engineered
            }
            false => table,
        };
        anyhow::ensure!(
            table.width() == self.feature_columns.len(),
            "model expects {} features, got {}",
            self.feature_columns.len(),
            table.width()
        );
        let predicted = self.estimator.predict(table.values())?;
        match self.transformer {
            Some(ref transformer) => transformer.inverse(&predicted),
            None => Ok(predicted),
        }
    }
}

impl Place for Bundle {
    fn place(&mut self, device: Device) {
        self.estimator.place(device);
        self.transformer.place(device);
        self.device = device;
    }
}

#[cfg(test)]
impl Bundle {
    /// Targets are simple functions of the weighted averages.
    pub fn fixture(transformation: Transformation, engineer: bool) -> Bundle {
        let samples = (0..30)
            .map(|k| {
                let f = (k % 5) as f64 / 10.0 + 0.1;
                BlendSample::uniform(f, 1.0 + (k % 7) as f64)
            })
            .collect::<Vec<_>>();
        let mut table = Table::assemble(&samples);
        if engineer {
            table = table.engineer();
        }
        let y = Array2::from_shape_fn((samples.len(), crate::N_TARGETS), |(r, c)| {
            table.values()[[r, 0]] * (c + 1) as f64 + table.values()[[r, 5]]
        });
        let transformer = transformation.fit(&y).unwrap();
        let fit_y = match transformer {
            Some(ref t) => t.transform(&y).unwrap(),
            None => y.clone(),
        };
        Bundle {
            estimator: Estimator::fit(table.values(), &fit_y, Device::Cpu).unwrap(),
            transformer,
            feature_columns: table.columns().to_vec(),
            target_columns: (1..=crate::N_TARGETS).map(|j| format!("BlendProperty{}", j)).collect(),
            config: TrainingConfig::named("unit"),
            metrics: Metrics::default(),
            training_date: Utc::now(),
            device: Device::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::N_TARGETS;

    #[test]
    fn bincode_round_trip_preserves_predictions() {
        let bundle = Bundle::fixture(Transformation::Standard, true);
        let decoded = Bundle::decode(&bundle.encode().unwrap()).unwrap();
        let table = Table::assemble(&[BlendSample::uniform(0.2, 1.0)]);
        assert_eq!(bundle.predict(&table).unwrap(), decoded.predict(&table).unwrap());
        assert_eq!(decoded.feature_columns, bundle.feature_columns);
    }
    #[test]
    fn garbage_does_not_decode() {
        assert!(Bundle::decode(b"not a model").is_err());
    }
    #[test]
    fn engineers_raw_tables_when_trained_with_features() {
        let bundle = Bundle::fixture(Transformation::None, true);
        assert!(bundle.engineered());
        let raw = Table::assemble(&[BlendSample::uniform(0.2, 1.0)]);
        let predicted = bundle.predict(&raw).unwrap();
        assert_eq!(predicted.dim(), (1, N_TARGETS));
        assert!(predicted.iter().all(|p| p.is_finite()));
    }
    #[test]
    fn raw_bundle_rejects_wrong_width() {
        let bundle = Bundle::fixture(Transformation::None, false);
        assert!(!bundle.engineered());
        let wide = Table::assemble(&[BlendSample::uniform(0.2, 1.0)]).engineer();
        assert!(bundle.predict(&wide).is_err());
    }
    #[test]
    fn placement_reaches_every_part() {
        let mut bundle = Bundle::fixture(Transformation::Power, false);
        bundle.place(Device::Cuda);
        assert_eq!(bundle.device, Device::Cuda);
        assert_eq!(bundle.estimator.device(), Device::Cuda);
    }
}
