use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use tokio::sync::oneshot;

/// Resolves to the result of one submitted job.
///
/// Dropping a handle does not cancel the job; the result is discarded.
pub struct Handle<T> {
    rx: oneshot::Receiver<anyhow::Result<T>>,
}

impl<T> Handle<T> {
    pub(super) fn new(rx: oneshot::Receiver<anyhow::Result<T>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for Handle<T> {
    type Output = anyhow::Result<T>;
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received
                .map_err(|_| anyhow::anyhow!("worker pool is shut down"))
                .and_then(|result| result)
        })
    }
}
