use crate::features::*;
use crate::model::*;
use crate::workers::Pool;
use anyhow::Context;
use ndarray::Array2;
use std::path::Path;
use std::sync::Arc;

/// A loaded bundle plus the threads that run it.
pub struct Predictor {
    bundle: Arc<Bundle>,
    pool: Pool,
}

impl Predictor {
    /// Loads the bundle at `path`, places it, and warms it up once.
    pub async fn load(path: &Path, preference: Preference, workers: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(path.is_file(), "model file '{}' not found", path.display());
        let mut bundle = Bundle::load(path)?;
        let device = Device::resolve(preference);
        bundle.place(device);
        log::info!("loaded {} onto {}", path.display(), device);
        let predictor = Self::new(bundle, Pool::new("inference", workers)?);
        predictor.warm().await?;
        Ok(predictor)
    }

    pub fn new(bundle: Bundle, pool: Pool) -> Self {
        Self {
            bundle: Arc::new(bundle),
            pool,
        }
    }

    async fn warm(&self) -> anyhow::Result<()> {
        self.predict(vec![BlendSample::uniform(0.2, 1.0)])
            .await
            .context("warm-up prediction")?;
        log::info!("model warmed up");
        Ok(())
    }

    /// One row of predictions per sample, in input order.
    pub async fn predict(&self, samples: Vec<BlendSample>) -> anyhow::Result<Array2<f64>> {
        self.run(move || Table::assemble(&samples)).await
    }

    /// Predicts from an already named 55-column table.
    pub async fn predict_table(&self, table: Table) -> anyhow::Result<Array2<f64>> {
        self.run(move || table).await
    }

    async fn run<F>(&self, table: F) -> anyhow::Result<Array2<f64>>
    where
        F: FnOnce() -> Table + Send + 'static,
    {
        let bundle = self.bundle.clone();
        self.pool.submit(move || bundle.predict(&table())).await?
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
