//! Asynchronous pipeline.

use super::step::{capture_failure, label_of};
use crate::config::PipelineConfig;
use crate::errors::{BoxError, PipelineError};
use crate::history::StepHistory;
use crate::observability::{DiagnosticLine, PipelineKind};
use futures::future::{self, BoxFuture, FutureExt};
use std::convert::Infallible;
use std::fmt;
use std::future::{Future, IntoFuture};

/// A pipeline whose steps are continuations on a deferred value.
///
/// Chaining never blocks and never runs a step: it wraps the current
/// deferred value in a new one. Nothing executes until the future returned by
/// [`result`](Self::result) (or the pipeline itself, via `IntoFuture`) is
/// polled; steps then run strictly in chain order on the polling task.
/// Pipelines do not spawn and carry no cancellation of their own; drop the
/// future or race it against a timer (see `helpers::runtime`) instead.
///
/// ```
/// use stepchain::AsyncPipeline;
///
/// async fn add_three(x: i32) -> Result<i32, std::io::Error> {
///     Ok(x + 3)
/// }
///
/// let value = futures::executor::block_on(async {
///     AsyncPipeline::create(5).next(add_three).map(|x| x * 2).await
/// });
/// assert_eq!(value.unwrap(), 16);
/// ```
pub struct AsyncPipeline<T> {
    deferred: BoxFuture<'static, Result<T, PipelineError>>,
    history: StepHistory,
    config: PipelineConfig,
}

impl<T: Send + 'static> AsyncPipeline<T> {
    /// Creates a pipeline resolving to `value`, with the default configuration.
    #[must_use]
    pub fn create(value: T) -> Self {
        Self::with_config(value, PipelineConfig::default())
    }

    /// Creates a pipeline resolving to `value`.
    #[must_use]
    pub fn with_config(value: T, config: PipelineConfig) -> Self {
        Self::from_parts(Ok(value), StepHistory::new(), config)
    }

    /// Creates a pipeline from an already-deferred value.
    #[must_use]
    pub fn from_future<Fut>(value: Fut) -> Self
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::from_try_future_with_config(value.map(Ok::<T, Infallible>), PipelineConfig::default())
    }

    /// Creates a pipeline from a deferred result.
    ///
    /// If the future resolves to `Err`, the pipeline starts failed and the
    /// error is not decorated.
    #[must_use]
    pub fn from_try_future<Fut, E>(value: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::from_try_future_with_config(value, PipelineConfig::default())
    }

    /// Creates a pipeline from a deferred result with a configuration.
    #[must_use]
    pub fn from_try_future_with_config<Fut, E>(value: Fut, config: PipelineConfig) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            deferred: value.map(|result| result.map_err(PipelineError::new)).boxed(),
            history: StepHistory::new(),
            config,
        }
    }

    pub(crate) fn from_parts(
        state: Result<T, PipelineError>,
        history: StepHistory,
        config: PipelineConfig,
    ) -> Self {
        Self {
            deferred: future::ready(state).boxed(),
            history,
            config,
        }
    }

    /// Chains a step returning a future.
    #[must_use]
    pub fn next<U, E, F, Fut>(self, step: F) -> AsyncPipeline<U>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        E: Into<BoxError>,
        U: Send + 'static,
    {
        let label = label_of(&step);
        self.chain(label, move |value| {
            step(value).map(|result| result.map_err(Into::<BoxError>::into))
        })
    }

    /// Chains a step returning a future, under an explicit label.
    #[must_use]
    pub fn next_as<U, E, F, Fut>(self, label: impl Into<String>, step: F) -> AsyncPipeline<U>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        E: Into<BoxError>,
        U: Send + 'static,
    {
        self.chain(label.into(), move |value| {
            step(value).map(|result| result.map_err(Into::<BoxError>::into))
        })
    }

    /// Chains a step returning a future, passing extra arguments.
    #[must_use]
    pub fn next_with<A, U, E, F, Fut>(self, step: F, args: A) -> AsyncPipeline<U>
    where
        F: FnOnce(T, A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        E: Into<BoxError>,
        A: Send + 'static,
        U: Send + 'static,
    {
        let label = label_of(&step);
        self.chain(label, move |value| {
            step(value, args).map(|result| result.map_err(Into::<BoxError>::into))
        })
    }

    /// Chains a step returning a plain result.
    #[must_use]
    pub fn next_sync<U, E, F>(self, step: F) -> AsyncPipeline<U>
    where
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
        E: Into<BoxError>,
        U: Send + 'static,
    {
        let label = label_of(&step);
        self.chain(label, move |value| {
            future::ready(step(value).map_err(Into::<BoxError>::into))
        })
    }

    /// Chains an infallible step returning a plain value.
    #[must_use]
    pub fn map<U, F>(self, step: F) -> AsyncPipeline<U>
    where
        F: FnOnce(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        let label = label_of(&step);
        self.chain(label, move |value| future::ready(Ok::<U, BoxError>(step(value))))
    }

    /// Chains an infallible step under an explicit label.
    #[must_use]
    pub fn map_as<U, F>(self, label: impl Into<String>, step: F) -> AsyncPipeline<U>
    where
        F: FnOnce(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        self.chain(label.into(), move |value| future::ready(Ok::<U, BoxError>(step(value))))
    }

    /// Chains an infallible step that takes extra arguments.
    #[must_use]
    pub fn map_with<A, U, F>(self, step: F, args: A) -> AsyncPipeline<U>
    where
        F: FnOnce(T, A) -> U + Send + 'static,
        A: Send + 'static,
        U: Send + 'static,
    {
        let label = label_of(&step);
        self.chain(label, move |value| {
            future::ready(Ok::<U, BoxError>(step(value, args)))
        })
    }

    fn chain<U, S, Fut>(self, label: String, step: S) -> AsyncPipeline<U>
    where
        S: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, BoxError>> + Send + 'static,
        U: Send + 'static,
    {
        let Self {
            deferred: previous,
            history,
            config,
        } = self;
        let history = history.push(label.as_str());
        let snapshot = history.clone();
        let step_config = config.clone();

        let deferred = async move {
            match previous.await {
                Ok(value) => match step(value).await {
                    Ok(next) => Ok(next),
                    Err(error) => Err(capture_failure(error, &label, &snapshot, &step_config)),
                },
                Err(error) => {
                    tracing::trace!(step = %label, "Skipping step, pipeline already failed");
                    Err(error)
                }
            }
        }
        .boxed();

        AsyncPipeline {
            deferred,
            history,
            config,
        }
    }

    /// Handles a failure with an asynchronous handler.
    ///
    /// On success the handler is not called. On failure its `Ok` value
    /// resumes the pipeline and its `Err` replaces the failure as-is.
    #[must_use]
    pub fn catch<E, H, Fut>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.intercept(move |error| {
            handler(error).map(|result| result.map_err(Into::<BoxError>::into))
        })
    }

    /// Handles a failure with a synchronous, fallible handler.
    #[must_use]
    pub fn catch_sync<E, H>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> Result<T, E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.intercept(move |error| future::ready(handler(error).map_err(Into::<BoxError>::into)))
    }

    /// Handles a failure with a handler that always produces a value.
    #[must_use]
    pub fn recover<H>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> T + Send + 'static,
    {
        self.intercept(move |error| future::ready(Ok::<T, BoxError>(handler(error))))
    }

    fn intercept<H, Fut>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let Self {
            deferred: previous,
            history,
            config,
        } = self;
        let steps = history.len();

        let deferred = async move {
            match previous.await {
                Ok(value) => Ok(value),
                Err(error) => match handler(error).await {
                    Ok(value) => {
                        tracing::debug!(steps, "Pipeline recovered");
                        Ok(value)
                    }
                    Err(error) => Err(PipelineError::new(error)),
                },
            }
        }
        .boxed();

        Self {
            deferred,
            history,
            config,
        }
    }

    /// Returns the deferred final value.
    ///
    /// The future resolves to the last step's value or rejects with the
    /// unrecovered failure.
    pub fn result(self) -> BoxFuture<'static, Result<T, PipelineError>> {
        self.deferred
    }

    /// Returns the recorded step history.
    #[must_use]
    pub const fn history(&self) -> &StepHistory {
        &self.history
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl<T: fmt::Debug + Send + 'static> AsyncPipeline<T> {
    /// Emits a diagnostic line once the value resolves.
    ///
    /// Nothing is emitted if the pipeline is failing by then. The value and
    /// history pass through unchanged.
    #[must_use]
    pub fn log(self) -> Self {
        self.schedule_line(None)
    }

    /// Emits a diagnostic line labelled with `message`.
    #[must_use]
    pub fn log_as(self, message: impl Into<String>) -> Self {
        self.schedule_line(Some(message.into()))
    }

    fn schedule_line(self, message: Option<String>) -> Self {
        let Self {
            deferred: previous,
            history,
            config,
        } = self;
        let step = history.last().map(str::to_owned);
        let sink = config.sink().clone();

        let deferred = async move {
            match previous.await {
                Ok(value) => {
                    let line = DiagnosticLine::new(
                        PipelineKind::Async,
                        step.as_deref(),
                        message.as_deref(),
                        &value,
                    );
                    sink.emit(&line);
                    Ok(value)
                }
                Err(error) => Err(error),
            }
        }
        .boxed();

        Self {
            deferred,
            history,
            config,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncPipeline<T> {
    /// Splits the pipeline into two branches sharing every step so far.
    ///
    /// Shared steps run once, whichever branch is polled first; each branch
    /// then continues independently.
    #[must_use]
    pub fn fork(self) -> (Self, Self) {
        let shared = self.deferred.shared();
        let left = Self {
            deferred: shared.clone().boxed(),
            history: self.history.clone(),
            config: self.config.clone(),
        };
        let right = Self {
            deferred: shared.boxed(),
            history: self.history,
            config: self.config,
        };
        (left, right)
    }
}

impl<T: Send + 'static> IntoFuture for AsyncPipeline<T> {
    type Output = Result<T, PipelineError>;
    type IntoFuture = BoxFuture<'static, Result<T, PipelineError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.deferred
    }
}

impl<T> fmt::Debug for AsyncPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncPipeline")
            .field("history", &self.history)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::CollectingSink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Debug, Clone, Error)]
    #[error("upstream returned {status}")]
    struct Upstream {
        status: u16,
    }

    async fn add_three(x: i32) -> Result<i32, Upstream> {
        Ok(x + 3)
    }

    async fn slow_double(x: i32) -> Result<i32, Upstream> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(x * 2)
    }

    async fn unavailable(_x: i32) -> Result<i32, Upstream> {
        Err(Upstream { status: 503 })
    }

    async fn add(x: i32, amount: i32) -> Result<i32, Upstream> {
        Ok(x + amount)
    }

    fn collecting() -> (Arc<CollectingSink>, PipelineConfig) {
        let sink = Arc::new(CollectingSink::new());
        let config = PipelineConfig::new().with_sink(sink.clone());
        (sink, config)
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let value = AsyncPipeline::create(5)
            .next(add_three)
            .next(slow_double)
            .result()
            .await
            .unwrap();
        assert_eq!(value, 16);
    }

    #[tokio::test]
    async fn test_await_pipeline_directly() {
        let value = AsyncPipeline::create(1).next_with(add, 41).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_from_future_initial_value() {
        let pipeline = AsyncPipeline::from_future(async { 5 }).next(add_three);
        assert_eq!(pipeline.history().to_vec(), vec!["add_three"]);
        assert_eq!(pipeline.await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_from_try_future_rejection_is_raw() {
        let error = AsyncPipeline::from_try_future(async { Err::<i32, _>(Upstream { status: 500 }) })
            .next(add_three)
            .await
            .unwrap_err();

        assert!(!error.is_decorated());
        assert_eq!(error.downcast_ref::<Upstream>().map(|e| e.status), Some(500));
    }

    #[tokio::test]
    async fn test_rejection_is_decorated_at_failing_step() {
        let error = AsyncPipeline::create(1)
            .next(add_three)
            .next(unavailable)
            .next(add_three)
            .await
            .unwrap_err();

        assert_eq!(error.failed_step(), Some("unavailable"));
        assert_eq!(error.history().unwrap(), ["add_three", "unavailable"]);
        assert_eq!(error.downcast_ref::<Upstream>().map(|e| e.status), Some(503));
    }

    #[tokio::test]
    async fn test_rejection_raw_when_decoration_disabled() {
        let config = PipelineConfig::new().with_decorated_error(false);
        let error = AsyncPipeline::with_config(1, config)
            .next(unavailable)
            .await
            .unwrap_err();

        assert!(!error.is_decorated());
        assert_eq!(error.to_string(), "upstream returned 503");
    }

    #[tokio::test]
    async fn test_failed_pipeline_skips_later_steps() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let pipeline = AsyncPipeline::create(1)
            .next(unavailable)
            .map_as("counted", move |x: i32| {
                counter.fetch_add(1, Ordering::SeqCst);
                x
            });

        assert_eq!(pipeline.history().to_vec(), vec!["unavailable", "counted"]);
        assert!(pipeline.await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_runs_until_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let pipeline = AsyncPipeline::create(1).map(move |x: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            x
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        pipeline.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_catch_recovers() {
        let value = AsyncPipeline::create(1)
            .next(unavailable)
            .catch(|error| async move {
                let status = error.downcast_ref::<Upstream>().map_or(0, |e| e.status);
                Ok::<i32, Upstream>(i32::from(status))
            })
            .next(add_three)
            .await
            .unwrap();
        assert_eq!(value, 506);
    }

    #[tokio::test]
    async fn test_catch_sync_failure_replaces_error() {
        let error = AsyncPipeline::create(1)
            .next(unavailable)
            .catch_sync(|_| Err::<i32, _>(Upstream { status: 418 }))
            .await
            .unwrap_err();

        assert!(!error.is_decorated());
        assert_eq!(error.downcast_ref::<Upstream>().map(|e| e.status), Some(418));
    }

    #[tokio::test]
    async fn test_async_catch_failure_replaces_error() {
        let pipeline = AsyncPipeline::create(1)
            .next(unavailable)
            .catch(|_| async move {
                tokio::task::yield_now().await;
                Err::<i32, _>(Upstream { status: 418 })
            })
            .next(add_three);
        let history = pipeline.history().to_vec();
        let error = pipeline.await.unwrap_err();

        assert_eq!(history, vec!["unavailable", "add_three"]);
        assert!(!error.is_decorated());
        assert_eq!(error.downcast_ref::<Upstream>().map(|e| e.status), Some(418));
    }

    #[tokio::test]
    async fn test_recover_not_called_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let value = AsyncPipeline::create(3)
            .recover(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                0
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_log_emits_when_resolved() {
        let (sink, config) = collecting();
        let pipeline = AsyncPipeline::with_config(5, config)
            .log()
            .next(add_three)
            .log()
            .log_as("final");

        assert!(sink.is_empty());
        assert_eq!(pipeline.history().to_vec(), vec!["add_three"]);
        assert_eq!(pipeline.await.unwrap(), 8);
        assert_eq!(
            sink.rendered(),
            vec![
                "[AsyncPipeline] INITIAL -> 5",
                "[AsyncPipeline] add_three -> 8",
                "final -> 8",
            ]
        );
    }

    #[tokio::test]
    async fn test_log_silent_on_failure() {
        let (sink, config) = collecting();
        let result = AsyncPipeline::with_config(5, config)
            .next(unavailable)
            .log()
            .await;

        assert!(result.is_err());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_fork_runs_shared_steps_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let (left, right) = AsyncPipeline::create(10)
            .map_as("shared", move |x: i32| {
                counter.fetch_add(1, Ordering::SeqCst);
                x
            })
            .fork();

        let left = left.next(add_three);
        let right = right.next(unavailable);

        assert_eq!(left.history().to_vec(), vec!["shared", "add_three"]);
        assert_eq!(right.history().to_vec(), vec!["shared", "unavailable"]);
        assert_eq!(left.await.unwrap(), 13);
        assert!(right.await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output() {
        let pipeline = AsyncPipeline::create(1).map_as("step", |x: i32| x);
        let debug = format!("{pipeline:?}");
        assert!(debug.contains("AsyncPipeline"));
        assert!(debug.contains("step"));
    }
}
