use super::*;
use anyhow::Context;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A named set of threads draining one unbounded job queue.
pub struct Pool {
    name: String,
    size: usize,
    tx: Mutex<Option<UnboundedSender<Job>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    pub fn new(name: &str, size: usize) -> anyhow::Result<Self> {
        let size = size.max(1);
        let (tx, rx) = unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let threads = (0..size)
            .map(|i| {
                let rx = rx.clone();
                std::thread::Builder::new()
                    .name(format!("{}-{}", name, i))
                    .spawn(move || Self::drain(rx))
                    .with_context(|| format!("spawn {} worker {}", name, i))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!("started {} pool with {} workers", name, size);
        Ok(Self {
            name: name.to_string(),
            size,
            tx: Mutex::new(Some(tx)),
            threads: Mutex::new(threads),
        })
    }

    fn drain(rx: Arc<Mutex<UnboundedReceiver<Job>>>) {
        loop {
            let job = rx.lock().blocking_recv();
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }

    /// Queues `f`. A panic inside `f` resolves the handle to an error and
    /// leaves the worker alive.
    pub fn submit<F, T>(&self, f: F) -> Handle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let result = std::panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|panic| anyhow::anyhow!("job panicked: {}", describe(panic.as_ref())));
            let _ = tx.send(result);
        });
        match self.tx.lock().as_ref() {
            Some(queue) if queue.send(job).is_ok() => {}
            _ => log::warn!("{} pool rejected a job after shutdown", self.name),
        }
        Handle::new(rx)
    }

    /// Closes the queue, lets workers finish what is already queued, and
    /// joins them. Idempotent.
    pub fn shutdown(&self) {
        if self.tx.lock().take().is_none() {
            return;
        }
        log::info!("draining {} pool", self.name);
        let current = std::thread::current().id();
        for thread in self.threads.lock().drain(..) {
            if thread.thread().id() != current && thread.join().is_err() {
                log::error!("{} worker exited abnormally", self.name);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn describe(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn handle_resolves_to_result() {
        let pool = Pool::new("test", 2).unwrap();
        assert_eq!(pool.submit(|| 6 * 7).await.unwrap(), 42);
    }
    #[tokio::test]
    async fn panics_become_errors_and_workers_survive() {
        let pool = Pool::new("test", 1).unwrap();
        let err = pool.submit(|| -> usize { panic!("kaboom") }).await.unwrap_err();
        assert!(err.to_string().contains("kaboom"));
        assert_eq!(pool.submit(|| 1).await.unwrap(), 1);
    }
    #[tokio::test]
    async fn excess_submissions_queue() {
        let pool = Pool::new("test", 2).unwrap();
        let handles = (0..16)
            .map(|i| pool.submit(move || i * 2))
            .collect::<Vec<_>>();
        let results = futures::future::join_all(handles).await;
        let results = results.into_iter().map(|r| r.unwrap()).collect::<Vec<_>>();
        assert_eq!(results, (0..16).map(|i| i * 2).collect::<Vec<_>>());
    }
    #[test]
    fn dropped_handles_still_run_and_shutdown_drains() {
        let pool = Pool::new("test", 2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let count = count.clone();
            drop(pool.submit(move || {
                std::thread::sleep(Duration::from_millis(5));
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.shutdown();
        assert_eq!(count.load(Ordering::SeqCst), 8);
    }
    #[tokio::test]
    async fn submissions_after_shutdown_fail() {
        let pool = Pool::new("test", 1).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert!(pool.submit(|| 1).await.is_err());
    }
    #[test]
    fn threads_carry_the_pool_name() {
        let pool = Pool::new("named", 1).unwrap();
        let name = futures::executor::block_on(
            pool.submit(|| std::thread::current().name().map(String::from)),
        )
        .unwrap();
        assert_eq!(name.as_deref(), Some("named-0"));
        assert_eq!(pool.size(), 1);
    }
}
