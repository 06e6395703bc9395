//! Deferred values.
//!
//! A [`Deferred<T>`] is a value produced by an operation that may not have
//! run yet. It is a cloneable handle to a shared future, so any number of
//! downstream operations can wait on it and the producing work runs once.
//! Command text is built with the combinators below, which means it is
//! only rendered after every input it needs has settled.
//!
//! Each deferred also carries its lineage: the names of the operations it
//! was derived from. The engine records the lineage of an operation's inputs
//! as that operation's dependencies, which is what `destroy` later uses to
//! order deletes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::domain::error::FormationError;

/// Result type carried by deferred values.
pub type Outcome<T> = std::result::Result<T, FormationError>;

/// A value that becomes available once upstream operations complete.
pub struct Deferred<T> {
    future: Shared<BoxFuture<'static, Outcome<T>>>,
    lineage: Arc<[String]>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
            lineage: Arc::clone(&self.lineage),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("lineage", &self.lineage)
            .finish_non_exhaustive()
    }
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a future. The future does not run until someone awaits it.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self {
            future: future.boxed().shared(),
            lineage: Arc::from(Vec::new()),
        }
    }

    /// An already-known value with no upstream operations.
    pub fn ready(value: T) -> Self {
        Self::from_future(async move { Ok(value) })
    }

    /// An already-failed value.
    pub fn failed(error: FormationError) -> Self {
        Self::from_future(async move { Err(error) })
    }

    /// Replace the lineage.
    #[must_use]
    pub fn with_lineage(mut self, lineage: &[String]) -> Self {
        self.lineage = Arc::from(lineage.to_vec());
        self
    }

    /// Operations this value was derived from.
    #[must_use]
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Wait for the value.
    pub async fn resolve(&self) -> Outcome<T> {
        self.future.clone().await
    }

    /// The value if it has already settled.
    #[must_use]
    pub fn peek(&self) -> Option<Outcome<T>> {
        self.future.peek().cloned()
    }

    /// Transform the value once it is available.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(async move { source.await.map(f) }).with_lineage(&self.lineage)
    }

    /// Chain a fallible step once the value is available.
    pub fn and_then<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Outcome<U> + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(async move { source.await.and_then(f) }).with_lineage(&self.lineage)
    }

    /// Inspect the settled outcome, success or failure.
    pub fn settle<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(Outcome<T>) -> Outcome<U> + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(async move { f(source.await) }).with_lineage(&self.lineage)
    }

    /// Rewrite the failure, typically to attach the failure kind.
    pub fn map_err<F>(&self, f: F) -> Deferred<T>
    where
        F: FnOnce(FormationError) -> FormationError + Send + 'static,
    {
        let source = self.future.clone();
        Deferred::from_future(async move { source.await.map_err(f) }).with_lineage(&self.lineage)
    }

    /// Forget the value, keep completion and failure.
    pub fn unit(&self) -> Deferred<()> {
        self.map(|_| ())
    }

    /// Both values, once both are available.
    pub fn zip<U>(&self, other: &Deferred<U>) -> Deferred<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        let left = self.future.clone();
        let right = other.future.clone();
        let lineage = merge_lineage([self.lineage(), other.lineage()]);
        Deferred::from_future(async move {
            let left = left.await?;
            let right = right.await?;
            Ok((left, right))
        })
        .with_lineage(&lineage)
    }

    /// Every value, in order, once all are available. Fails with the first
    /// failure in iteration order.
    pub fn all<I>(items: I) -> Deferred<Vec<T>>
    where
        I: IntoIterator<Item = Deferred<T>>,
    {
        let items: Vec<Deferred<T>> = items.into_iter().collect();
        let lineage = merge_lineage(items.iter().map(Deferred::lineage));
        let futures: Vec<_> = items.into_iter().map(|item| item.future).collect();
        Deferred::from_future(async move {
            let mut values = Vec::with_capacity(futures.len());
            for future in futures {
                values.push(future.await?);
            }
            Ok(values)
        })
        .with_lineage(&lineage)
    }
}

fn merge_lineage<'a, I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut merged: Vec<String> = Vec::new();
    for name in sources.into_iter().flatten() {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::NodeName;

    fn failure() -> FormationError {
        FormationError::ProvisioningFailure {
            node: NodeName::new("node0"),
            reason: "boom".into(),
        }
    }

    fn named<T: Clone + Send + Sync + 'static>(value: T, name: &str) -> Deferred<T> {
        Deferred::ready(value).with_lineage(&[name.to_string()])
    }

    #[tokio::test]
    async fn map_and_then_compose() {
        let address = named("10.0.0.1".to_string(), "node0GetIp");
        let command = address
            .map(|ip| format!("echo {ip}"))
            .and_then(|cmd| Ok(cmd.len()));

        assert_eq!(command.resolve().await, Ok("echo 10.0.0.1".len()));
        assert_eq!(command.lineage(), ["node0GetIp".to_string()]);
    }

    #[tokio::test]
    async fn upstream_runs_once_for_many_waiters() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let source = Deferred::from_future(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7u32)
        });

        let doubled = source.map(|v| v * 2);
        let tripled = source.map(|v| v * 3);
        assert_eq!(doubled.resolve().await, Ok(14));
        assert_eq!(tripled.resolve().await, Ok(21));
        assert_eq!(source.resolve().await, Ok(7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_propagates_through_combinators() {
        let broken: Deferred<String> = Deferred::failed(failure());
        let derived = broken.map(|s| s.len()).zip(&Deferred::ready(1u8));
        assert_eq!(derived.resolve().await, Err(failure()));
    }

    #[tokio::test]
    async fn settle_sees_failures() {
        let broken: Deferred<()> = Deferred::failed(failure());
        let recovered = broken.settle(|outcome| Ok(outcome.is_err()));
        assert_eq!(recovered.resolve().await, Ok(true));
    }

    #[tokio::test]
    async fn all_merges_lineage_without_duplicates() {
        let a = named(1, "a");
        let b = named(2, "b");
        let again = named(3, "a");
        let joined = Deferred::all([a, b, again]);

        assert_eq!(joined.lineage(), ["a".to_string(), "b".to_string()]);
        assert_eq!(joined.resolve().await, Ok(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn all_of_nothing_is_ready() {
        let empty: Deferred<Vec<u8>> = Deferred::all(Vec::new());
        assert_eq!(empty.resolve().await, Ok(vec![]));
        assert!(empty.lineage().is_empty());
    }

    #[tokio::test]
    async fn peek_only_after_settled() {
        let value = Deferred::ready(5u8);
        assert!(value.peek().is_none());
        value.resolve().await.unwrap();
        assert_eq!(value.peek(), Some(Ok(5)));
    }

    #[tokio::test]
    async fn map_err_rewrites_failure_kind() {
        let broken: Deferred<()> = Deferred::failed(failure());
        let rewritten = broken.map_err(|e| FormationError::blocked("next", e));
        assert!(rewritten.resolve().await.unwrap_err().is_blocked());
    }
}
