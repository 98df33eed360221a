use super::*;
use crate::Error;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

struct Entry {
    job: TrainingJob,
    token: CancellationToken,
}

/// Concurrency-safe map of job id to job record.
///
/// One coarse lock guards every record. Handlers only read; the worker
/// running a job is its only writer, through [`Registry::update`].
#[derive(Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, Entry>>,
    sequence: AtomicU64,
}

impl Registry {
    /// A process-unique id, `train_<unix_millis>_<seq>`.
    pub fn mint(&self) -> String {
        format!(
            "train_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            self.sequence.fetch_add(1, Ordering::Relaxed)
        )
    }

    /// Registers a pending job and hands back its cancellation token.
    pub fn create(&self, id: &str) -> Result<CancellationToken, Error> {
        let mut entries = self.entries.write();
        if entries.contains_key(id) {
            return Err(Error::conflict(format!("Training job {} already exists", id)));
        }
        let token = CancellationToken::new();
        entries.insert(
            id.to_string(),
            Entry {
                job: TrainingJob::pending(id),
                token: token.clone(),
            },
        );
        Ok(token)
    }

    pub fn get(&self, id: &str) -> Result<TrainingJob, Error> {
        self.entries
            .read()
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| Error::not_found("Training job not found"))
    }

    /// Snapshot of every job, ordered by id.
    pub fn list(&self) -> Vec<TrainingJob> {
        self.entries
            .read()
            .values()
            .map(|entry| entry.job.clone())
            .collect()
    }

    /// Applies `f` in place and returns the updated record.
    /// Terminal records are frozen.
    pub fn update<F>(&self, id: &str, f: F) -> Result<TrainingJob, Error>
    where
        F: FnOnce(&mut TrainingJob),
    {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::not_found("Training job not found"))?;
        if entry.job.is_terminal() {
            return Err(Error::conflict(format!(
                "Training job {} is already {}",
                id, entry.job.status
            )));
        }
        f(&mut entry.job);
        Ok(entry.job.clone())
    }

    /// Trips the job's token; the worker notices at its next stage boundary.
    pub fn cancel(&self, id: &str) -> Result<(), Error> {
        let entries = self.entries.read();
        let entry = entries
            .get(id)
            .ok_or_else(|| Error::not_found("Training job not found"))?;
        if entry.job.is_terminal() {
            return Err(Error::conflict(format!(
                "Training job {} is already {}",
                id, entry.job.status
            )));
        }
        entry.token.cancel();
        Ok(())
    }

    pub fn running(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.job.status == Status::Running)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn minted_ids_are_unique() {
        let registry = Registry::default();
        let ids = (0..100).map(|_| registry.mint()).collect::<std::collections::HashSet<_>>();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with("train_")));
    }
    #[test]
    fn create_then_get_is_pending() {
        let registry = Registry::default();
        let id = registry.mint();
        registry.create(&id).unwrap();
        assert_eq!(registry.get(&id).unwrap().status, Status::Pending);
        assert!(matches!(registry.create(&id), Err(Error::Conflict(_))));
    }
    #[test]
    fn unknown_ids_are_not_found() {
        let registry = Registry::default();
        assert!(matches!(registry.get("nope"), Err(Error::NotFound(_))));
        assert!(matches!(registry.update("nope", |_| {}), Err(Error::NotFound(_))));
        assert!(matches!(registry.cancel("nope"), Err(Error::NotFound(_))));
    }
    #[test]
    fn terminal_records_are_frozen() {
        let registry = Registry::default();
        registry.create("a").unwrap();
        registry.update("a", |job| job.start()).unwrap();
        assert_eq!(registry.running(), 1);
        registry.update("a", |job| job.fail("boom")).unwrap();
        assert_eq!(registry.running(), 0);
        assert!(matches!(
            registry.update("a", |job| job.advance(0.9, "late")),
            Err(Error::Conflict(_))
        ));
        assert_eq!(registry.get("a").unwrap().message, "Training failed: boom");
        assert!(matches!(registry.cancel("a"), Err(Error::Conflict(_))));
    }
    #[test]
    fn cancel_trips_the_token() {
        let registry = Registry::default();
        let token = registry.create("a").unwrap();
        assert!(!token.is_cancelled());
        registry.cancel("a").unwrap();
        assert!(token.is_cancelled());
    }
    #[test]
    fn list_is_ordered_by_id() {
        let registry = Registry::default();
        for id in ["c", "a", "b"] {
            registry.create(id).unwrap();
        }
        let ids = registry.list().into_iter().map(|j| j.job_id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
    #[test]
    fn concurrent_updates_are_serialised() {
        let registry = Arc::new(Registry::default());
        registry.create("a").unwrap();
        let handles = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry
                            .update("a", |job| job.progress = (job.progress + 0.001).min(1.0))
                            .unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        handles.into_iter().for_each(|h| h.join().unwrap());
        assert!((registry.get("a").unwrap().progress - 0.8).abs() < 1e-9);
    }
}
