use super::*;
use crate::Error;
use crate::registry::Registry;
use crate::store::Store;
use crate::workers::Pool;
use std::sync::Arc;

/// Shared state of the training service.
pub struct Trainer {
    registry: Arc<Registry>,
    store: Store,
    pool: Pool,
}

impl Trainer {
    pub fn new(registry: Arc<Registry>, store: Store, pool: Pool) -> Self {
        Self {
            registry,
            store,
            pool,
        }
    }

    /// Registers a pending job and queues it; returns without waiting.
    pub fn start(&self, dataset: &str, config: TrainingConfig) -> Result<String, Error> {
        config.validate()?;
        if !self.store.dataset_exists(dataset)? {
            return Err(Error::not_found("Dataset not found"));
        }
        let id = self.registry.mint();
        let token = self.registry.create(&id)?;
        let session = Session::new(
            id.clone(),
            dataset.to_string(),
            config,
            self.registry.clone(),
            self.store.clone(),
            token,
        );
        drop(self.pool.submit(move || session.run()));
        log::info!("queued training job {} on {}", id, dataset);
        Ok(id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Waits for queued and running jobs to finish.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
