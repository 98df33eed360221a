use super::*;
use crate::features::*;
use crate::model::*;
use crate::registry::Registry;
use crate::registry::TrainingJob;
use crate::store::Store;
use crate::workers::describe;
use crate::*;
use anyhow::Context;
use ndarray::Array2;
use ndarray::Axis;
use rayon::prelude::*;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One end-to-end training run, executed on a training worker.
///
/// The session is the only writer of its job record. Every stage boundary
/// checks the cancellation token, then publishes progress to the registry.
/// Whatever happens, the job ends `completed` or `failed`; a failed run
/// leaves neither a model file nor a log record behind.
pub struct Session {
    id: String,
    dataset: String,
    config: TrainingConfig,
    registry: Arc<Registry>,
    store: Store,
    token: CancellationToken,
}

/// Arrays produced by data preparation.
struct Prepared {
    features: Table,
    targets: Table,
}

impl Session {
    pub fn new(
        id: String,
        dataset: String,
        config: TrainingConfig,
        registry: Arc<Registry>,
        store: Store,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            dataset,
            config,
            registry,
            store,
            token,
        }
    }

    /// Drives the job to a terminal state.
    pub fn run(self) {
        self.drive(Self::train)
    }

    /// Runs `body` as the training work; an error or a panic inside it
    /// marks the job failed.
    fn drive<F>(self, body: F)
    where
        F: FnOnce(&Self) -> anyhow::Result<(Option<PathBuf>, Metrics)>,
    {
        if let Err(e) = self.registry.update(&self.id, TrainingJob::start) {
            log::error!("[{}] could not start: {}", self.id, e);
            return;
        }
        log::info!("[{}] training {} on {}", self.id, self.config.model_name, self.dataset);
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| body(&self)))
            .unwrap_or_else(|panic| Err(anyhow::anyhow!("panicked: {}", describe(panic.as_ref()))));
        let update = match outcome {
            Ok((path, metrics)) => {
                log::info!("[{}] completed (r2 {:.4}, cv r2 {:.4})", self.id, metrics.r2, metrics.cv_r2_mean);
                let path = path.map(|p| p.display().to_string());
                self.registry.update(&self.id, |job| job.complete(path, metrics))
            }
            Err(e) => {
                log::error!("[{}] failed: {:#}", self.id, e);
                self.registry.update(&self.id, |job| job.fail(format!("{:#}", e)))
            }
        };
        if let Err(e) = update {
            log::error!("[{}] could not record outcome: {}", self.id, e);
        }
    }

    fn train(&self) -> anyhow::Result<(Option<PathBuf>, Metrics)> {
        self.enter(Stage::Prepare)?;
        let device = Device::resolve(self.config.device_preference);
        let Prepared { features, targets } = self.prepare()?;

        self.enter(Stage::Engineer)?;
        let features = match self.config.feature_engineering {
            true => features.engineer(),
            false => features,
        };
        log::debug!("[{}] feature table {}x{}", self.id, features.height(), features.width());

        // fit on every row before splitting; hold-out rows leak into the transform
        self.enter(Stage::Transform)?;
        let transformer = self.config.target_transformation.fit(targets.values())?;
        let fitted = match transformer {
            Some(ref t) => t.transform(targets.values())?,
            None => targets.values().to_owned(),
        };

        self.enter(Stage::Split)?;
        let x = features.values();
        let split = holdout(x.nrows(), self.config.validation_split, SPLIT_SEED)?;

        self.enter(Stage::Fit)?;
        let estimator = Estimator::fit(
            &x.select(Axis(0), &split.train),
            &fitted.select(Axis(0), &split.train),
            device,
        )?;

        self.enter(Stage::Evaluate)?;
        let truth = targets.values().select(Axis(0), &split.valid);
        let predicted = original(
            transformer.as_ref(),
            estimator.predict(&x.select(Axis(0), &split.valid))?,
        )?;
        let metrics = Metrics::holdout(&truth, &predicted)?;

        self.enter(Stage::CrossValidate)?;
        let scores = self.cross_validate(x, &fitted, targets.values(), transformer.as_ref(), device)?;
        let metrics = metrics.with_folds(&scores);

        self.enter(Stage::Persist)?;
        let bundle = Bundle {
            estimator,
            transformer,
            feature_columns: features.columns().to_vec(),
            target_columns: targets.columns().to_vec(),
            config: self.config.clone(),
            metrics,
            training_date: chrono::Utc::now(),
            device,
        };
        let path = match self.config.save_model {
            true => Some(self.store.save_model(&bundle, &self.config.model_name)?),
            false => None,
        };
        let record = TrainingRecord {
            job_id: self.id.clone(),
            config: self.config.clone(),
            metrics,
            model_path: path.as_ref().map(|p| p.display().to_string()),
            training_date: bundle.training_date,
            device_used: device,
        };
        if let Err(e) = self.store.save_log(&record) {
            if let Some(ref path) = path {
                self.store.remove_model(path);
            }
            return Err(e);
        }
        Ok((path, metrics))
    }

    /// Drops the id column and splits the dataset into canonical features and targets.
    fn prepare(&self) -> anyhow::Result<Prepared> {
        let frame = self
            .store
            .load_dataset(&self.dataset)
            .context("load dataset")?
            .without(DATASET_ID_COLUMN);
        anyhow::ensure!(frame.height() > 0, "dataset has no rows");
        anyhow::ensure!(
            frame.width() >= N_FEATURES + N_TARGETS,
            "dataset needs {} feature and {} target columns, found {}",
            N_FEATURES,
            N_TARGETS,
            frame.width()
        );
        Ok(Prepared {
            features: frame.numeric(0..N_FEATURES)?.rename(feature_columns())?,
            targets: frame.numeric(N_FEATURES..N_FEATURES + N_TARGETS)?,
        })
    }

    /// R² per fold, refit in parallel on the transformed targets and scored in
    /// original units.
    fn cross_validate(
        &self,
        x: &Array2<f64>,
        fitted: &Array2<f64>,
        truth: &Array2<f64>,
        transformer: Option<&Transformer>,
        device: Device,
    ) -> anyhow::Result<Vec<f64>> {
        kfold(x.nrows(), self.config.cross_validation_folds, SPLIT_SEED)?
            .par_iter()
            .enumerate()
            .map(|(i, fold)| {
                self.check()?;
                let estimator = Estimator::fit(
                    &x.select(Axis(0), &fold.train),
                    &fitted.select(Axis(0), &fold.train),
                    device,
                )
                .with_context(|| format!("fold {}", i + 1))?;
                let predicted = original(transformer, estimator.predict(&x.select(Axis(0), &fold.valid))?)?;
                r2_score(&truth.select(Axis(0), &fold.valid), &predicted)
            })
            .collect()
    }

    fn check(&self) -> anyhow::Result<()> {
        match self.token.is_cancelled() {
            true => Err(anyhow::anyhow!("cancelled")),
            false => Ok(()),
        }
    }

    fn enter(&self, stage: Stage) -> anyhow::Result<()> {
        self.check()?;
        self.registry
            .update(&self.id, |job| job.advance(stage.progress(), stage.message()))?;
        log::info!("[{}] {}", self.id, stage.message());
        Ok(())
    }
}

fn original(transformer: Option<&Transformer>, predicted: Array2<f64>) -> anyhow::Result<Array2<f64>> {
    match transformer {
        Some(t) => t.inverse(&predicted),
        None => Ok(predicted),
    }
}

#[cfg(test)]
/// A dataset with an `ID` column, 55 features and 10 targets that are
/// linear in the weighted averages.
pub(crate) fn sample_dataset(rows: usize) -> Vec<u8> {
    let mut header = vec![String::from("ID")];
    header.extend(feature_columns());
    header.extend((1..=N_TARGETS).map(|j| format!("BlendProperty{}", j)));
    let mut csv = header.join(",") + "\n";
    for r in 0..rows {
        let fractions = (0..N_COMPONENTS)
            .map(|i| ((r * 7 + i * 3) % 10) as f64 / 10.0)
            .collect::<Vec<_>>();
        let properties = (0..N_COMPONENTS * N_PROPERTIES)
            .map(|k| ((r * 13 + k * 5) % 17) as f64 / 4.0 - 2.0)
            .collect::<Vec<_>>();
        let targets = (0..N_TARGETS)
            .map(|j| {
                (0..N_COMPONENTS)
                    .map(|i| fractions[i] * properties[i * N_PROPERTIES + j])
                    .sum::<f64>()
                    * (j + 1) as f64
                    + 0.5
            })
            .collect::<Vec<_>>();
        let cells = std::iter::once(r.to_string())
            .chain(fractions.iter().chain(&properties).chain(&targets).map(|v| v.to_string()))
            .collect::<Vec<_>>();
        csv += &(cells.join(",") + "\n");
    }
    csv.into_bytes()
}
