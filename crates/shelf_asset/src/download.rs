//! Cancellable template downloads
//!
//! A [`Download`] runs a fetch on the ambient tokio runtime and hands the
//! result back through a oneshot channel that the frame loop polls without
//! blocking. Dropping the download aborts the task, so a completion can
//! never be delivered to an owner that no longer exists.

use crate::{AssetError, RemoteTemplate, TemplateFetcher};
use shelf_core::scene::Template;
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

/// In-flight fetch of one remote template.
#[derive(Debug)]
pub struct Download {
    name: String,
    task: JoinHandle<()>,
    result: oneshot::Receiver<Result<Template, AssetError>>,
}

impl Download {
    /// Start fetching `reference` on the current tokio runtime.
    pub fn spawn(fetcher: Arc<dyn TemplateFetcher>, reference: &RemoteTemplate) -> Result<Self, AssetError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AssetError::NoRuntime {
            name: reference.name.clone(),
        })?;
        let fetch = fetcher.fetch(reference);
        let (tx, rx) = oneshot::channel();
        let task = runtime.spawn(async move {
            // The receiver is gone if the owner was torn down meanwhile.
            let _ = tx.send(fetch.await);
        });
        tracing::debug!(template = %reference.name, "download started");
        Ok(Self {
            name: reference.name.clone(),
            task,
            result: rx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-blocking poll. `None` while the fetch is still running.
    pub fn try_take(&mut self) -> Option<Result<Template, AssetError>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(AssetError::Cancelled {
                name: self.name.clone(),
            })),
        }
    }

    /// Abort the fetch; a later `try_take` reports [`AssetError::Cancelled`].
    pub fn cancel(&mut self) {
        self.task.abort();
        self.result.close();
    }
}

impl Drop for Download {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxFuture, MemoryFetcher};

    struct NeverFetcher;

    impl TemplateFetcher for NeverFetcher {
        fn fetch(&self, _reference: &RemoteTemplate) -> BoxFuture<Result<Template, AssetError>> {
            Box::pin(std::future::pending())
        }
    }

    async fn settle(download: &mut Download) -> Result<Template, AssetError> {
        loop {
            if let Some(result) = download.try_take() {
                return result;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn delivers_fetched_template() {
        let fetcher = Arc::new(MemoryFetcher::new().with_template(Template::new("Gear")));
        let mut download = Download::spawn(fetcher, &RemoteTemplate::new("Gear")).unwrap();
        let template = settle(&mut download).await.unwrap();
        assert_eq!(template.name, "Gear");
    }

    #[tokio::test]
    async fn delivers_fetch_failure() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let mut download = Download::spawn(fetcher, &RemoteTemplate::new("Gear")).unwrap();
        assert!(matches!(settle(&mut download).await, Err(AssetError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancel_reports_cancelled() {
        let mut download = Download::spawn(Arc::new(NeverFetcher), &RemoteTemplate::new("Slow")).unwrap();
        tokio::task::yield_now().await;
        assert!(download.try_take().is_none());

        download.cancel();
        assert!(matches!(download.try_take(), Some(Err(AssetError::Cancelled { .. }))));
    }

    #[test]
    fn spawn_without_runtime_fails() {
        let result = Download::spawn(Arc::new(MemoryFetcher::new()), &RemoteTemplate::new("Gear"));
        assert!(matches!(result, Err(AssetError::NoRuntime { .. })));
    }
}
