//! Deferred values for resources that are not realized yet.
//!
//! An [`Output`] stands for a value the provider will assign later, such as
//! a droplet's address. Continuations are attached with [`Output::apply`]
//! and [`Output::and_then`], and [`Output::all`] joins many outputs while
//! keeping their order. Nothing runs until some output in the graph is
//! resolved; each underlying future runs at most once and every consumer
//! sees the same value or the same error.

use crate::error::{Error, Result};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type SharedResult<T> = std::result::Result<T, Arc<Error>>;

/// A value that becomes available once a resource is realized
pub struct Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Shared<BoxFuture<'static, SharedResult<T>>>,
}

impl<T> Clone for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.peek() {
            Some(Ok(_)) => f.write_str("Output(resolved)"),
            Some(Err(e)) => write!(f, "Output(failed: {})", e),
            None => f.write_str("Output(pending)"),
        }
    }
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An output that is already known
    pub fn ready(value: T) -> Self {
        Self::from_future(future::ready(Ok(value)))
    }

    /// An output produced by a future
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let inner = fut
            .map(|result| {
                result.map_err(|e| match e {
                    Error::Dependency(inner) => inner,
                    other => Arc::new(other),
                })
            })
            .boxed()
            .shared();
        Self { inner }
    }

    /// Derive a new output from this one once it resolves
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move { inner.await.map(f).map_err(Error::Dependency) })
    }

    /// Chain an asynchronous, fallible step after this output
    pub fn and_then<U, F, Fut>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move {
            let value = inner.await.map_err(Error::Dependency)?;
            f(value).await
        })
    }

    /// Combine with another output
    pub fn zip<U>(&self, other: &Output<U>) -> Output<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        let left = self.inner.clone();
        let right = other.inner.clone();
        Output::from_future(async move {
            future::try_join(left, right)
                .await
                .map_err(Error::Dependency)
        })
    }

    /// Join outputs into one list, preserving their order
    pub fn all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        let pending: Vec<_> = outputs.into_iter().map(|o| o.inner).collect();
        Output::from_future(async move {
            future::try_join_all(pending)
                .await
                .map_err(Error::Dependency)
        })
    }

    /// Wait for the value
    pub async fn resolve(&self) -> Result<T> {
        self.inner.clone().await.map_err(Error::Dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_ready_and_apply() {
        let out = Output::ready(2).apply(|n| n * 21);
        assert_eq!(out.resolve().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_all_preserves_order() {
        // The first output finishes last; order must still follow the input.
        let slow = Output::from_future(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok("a".to_string())
        });
        let fast = Output::ready("b".to_string());

        let joined = Output::all(vec![slow, fast]);
        assert_eq!(joined.resolve().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_shared_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let base = Output::from_future(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7u32)
        });

        let a = base.apply(|n| n + 1);
        let b = base.apply(|n| n + 2);
        let (a, b) = tokio::join!(a.resolve(), b.resolve());

        assert_eq!((a.unwrap(), b.unwrap()), (8, 9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_propagates_to_dependents() {
        let failing: Output<String> =
            Output::from_future(async { Err(Error::provider("creating droplet", "quota exceeded")) });
        let derived = failing.apply(|s| s.len());
        let joined = Output::all(vec![derived.clone(), Output::ready(1)]);

        let err = joined.resolve().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider error while creating droplet: quota exceeded"
        );
        assert!(derived.resolve().await.is_err());
    }

    #[tokio::test]
    async fn test_zip_and_then() {
        let master = Output::ready("10.0.0.1".to_string());
        let workers = Output::all(vec![Output::ready("10.0.0.2".to_string())]);

        let summary = master
            .zip(&workers)
            .and_then(|(m, w)| async move { Ok(format!("{}+{}", m, w.len())) });
        assert_eq!(summary.resolve().await.unwrap(), "10.0.0.1+1");
    }

    #[tokio::test]
    async fn test_pending_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let out = Output::from_future(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(format!("{:?}", out), "Output(pending)");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        out.resolve().await.unwrap();
        assert_eq!(format!("{:?}", out), "Output(resolved)");
    }
}
