//! Four-state async value lifecycle (`Loadable`) and the retry-on-failure
//! cache wrapper UI-facing consumers read through.

use crate::types::QuoteError;
use futures::future::BoxFuture;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::warn;

/// Lifecycle of an asynchronously loaded value. `Nothing` means legitimately
/// absent; `Fail` is a retry candidate. The two must never be collapsed.
#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Pending,
    Just(T),
    Nothing,
    Fail(Arc<QuoteError>),
}

impl<T> Loadable<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Loadable::Pending)
    }

    pub fn is_just(&self) -> bool {
        matches!(self, Loadable::Just(_))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Loadable::Nothing)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Loadable::Fail(_))
    }

    pub fn just(&self) -> Option<&T> {
        match self {
            Loadable::Just(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Pending => Loadable::Pending,
            Loadable::Just(value) => Loadable::Just(f(value)),
            Loadable::Nothing => Loadable::Nothing,
            Loadable::Fail(e) => Loadable::Fail(e),
        }
    }

    /// `Just` yields the value; `Nothing` and `Pending` take the default;
    /// `Fail` surfaces the error rather than the default. Callers relying on
    /// the absent/failed distinction depend on this exact shape.
    pub fn unwrap_or(self, default: T) -> Result<T, Arc<QuoteError>> {
        match self {
            Loadable::Just(value) => Ok(value),
            Loadable::Nothing | Loadable::Pending => Ok(default),
            Loadable::Fail(e) => Err(e),
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Loadable::Just(v),
            None => Loadable::Nothing,
        }
    }
}

/// Fallback for consumers that must render synchronously: either a static
/// value, or a closure evaluated only when the fallback is actually needed.
pub enum Fallback<T> {
    Value(T),
    Lazy(Box<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> Fallback<T> {
    pub fn resolve(&self) -> T {
        match self {
            Fallback::Value(value) => value.clone(),
            Fallback::Lazy(f) => f(),
        }
    }
}

type RetryFetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, QuoteError>> + Send + Sync>;

/// Wraps an async data source (gas price, gas limit, pool TVL, ...) behind a
/// `Loadable` with built-in retry, so consumers are decoupled from fetch
/// failures. All shared mutable state lives in the one `RwLock`.
pub struct RetryCache<T: Clone> {
    state: RwLock<Loadable<T>>,
    fetch: RetryFetchFn<T>,
    fallback: Fallback<T>,
    max_retries: u32,
    retry_delay: Duration,
    label: &'static str,
}

impl<T: Clone + Send + Sync + 'static> RetryCache<T> {
    pub fn new<F>(label: &'static str, fetch: F, fallback: Fallback<T>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, QuoteError>> + Send + Sync + 'static,
    {
        Self {
            state: RwLock::new(Loadable::Pending),
            fetch: Box::new(fetch),
            fallback,
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
            label,
        }
    }

    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> Loadable<T> {
        self.state.read().unwrap().clone()
    }

    /// Synchronous read for render paths: the loaded value when present,
    /// otherwise the fallback. The lazy fallback closure runs only on the
    /// non-`Just` branch.
    pub fn value_or_fallback(&self) -> T {
        if let Loadable::Just(value) = &*self.state.read().unwrap() {
            return value.clone();
        }
        self.fallback.resolve()
    }

    /// Run one fetch cycle: `Pending` while in flight, `Just` on success,
    /// `Fail` after the retry budget is exhausted. Returns the final state.
    pub async fn refresh(&self) -> Loadable<T> {
        *self.state.write().unwrap() = Loadable::Pending;

        let mut last_err: Option<QuoteError> = None;
        for attempt in 0..=self.max_retries {
            match (self.fetch)().await {
                Ok(value) => {
                    let state = Loadable::Just(value);
                    *self.state.write().unwrap() = state.clone();
                    return state;
                }
                Err(e) => {
                    warn!(source = self.label, attempt, error = %e, "retry cache fetch failed");
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let err = Arc::new(last_err.unwrap_or(QuoteError::CacheFetch("fetch never ran".into())));
        let state = Loadable::Fail(err);
        *self.state.write().unwrap() = state.clone();
        state
    }

    /// Manual retry trigger: only meaningful from `Fail`, where it starts a
    /// fresh `Pending` cycle. In any other state the current value stands.
    pub async fn retry(&self) -> Loadable<T> {
        if self.current().is_fail() {
            return self.refresh().await;
        }
        self.current()
    }

    /// Cache invalidation: a `Just` value is demoted to `Pending` so the
    /// next `refresh` cycle replaces it.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap();
        if state.is_just() {
            *state = Loadable::Pending;
        }
    }
}
