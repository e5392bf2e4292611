//! Repeatable queries with debounce, ordering and pending tracking.
//!
//! A [`Query`] owns one logical query: an action, its current arguments
//! and the last accepted outcome. Every trigger (subscription, manual
//! [`refresh`](Query::refresh), or [`set_args`](Query::set_args) with
//! different arguments) allocates the next request index and runs through
//! four stages:
//!
//! 1. **Validation**: a context rejected by `validate` is dropped before
//!    timing and is never pending
//! 2. **Scheduling**: the first request and requests spaced beyond the
//!    debounce window fire at once; requests arriving inside the window are
//!    queued behind it, and `max_delay` caps how long a window may keep
//!    postponing execution
//! 3. **Gate**: when its time comes a context only executes if it is still
//!    the most recently allocated one; stale contexts are discarded
//! 4. **Response**: an outcome is recorded only if nothing was recorded yet
//!    or its index is greater than the recorded one, so the last triggered
//!    request wins even when it resolves first
//!
//! In-flight calls are never cancelled; stale results are simply not
//! applied.
//!
//! # Example
//!
//! ```ignore
//! let query = Query::subscribe(
//!     |id: u32| Some(async move { api.user(id).await }),
//!     7,
//!     QueryOptions::new().debounce(Duration::from_millis(250)),
//! );
//!
//! query.set_args(8);
//! let mut updates = query.watch();
//! updates.changed().await?;
//! ```

use crate::fetch::{Rejection, wrap_fetch};
use crate::metrics::{
    FETCH_DURATION, QUERY_EXECUTIONS, QUERY_RESPONSES_IGNORED, QUERY_SKIPPED, QUERY_STALE_DISCARDS,
    QUERY_TRIGGERS, QUERY_VALIDATION_REJECTIONS,
};
use formulaic_core::{IntoOutcome, Outcome};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Client-wide timing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfiguration {
    /// Quiet period after an execution during which new requests are
    /// queued (default 100 ms).
    pub debounce: Duration,
    /// Minimum delay before any request executes (default 0).
    pub wait_time: Duration,
    /// Longest a contention window may postpone execution (default
    /// disabled).
    pub max_delay: Option<Duration>,
}

impl QueryConfiguration {
    /// Default debounce window.
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

    /// Defaults: 100 ms debounce, no wait time, no maximum delay.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debounce: Self::DEFAULT_DEBOUNCE,
            wait_time: Duration::ZERO,
            max_delay: None,
        }
    }

    /// Set the debounce window.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the wait time.
    #[must_use]
    pub const fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Set or disable the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay = max_delay;
        self
    }
}

impl Default for QueryConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

type Equality<Args> = Arc<dyn Fn(&Args, &Args) -> bool + Send + Sync>;
type Validator<Args> = Arc<dyn Fn(&Args) -> bool + Send + Sync>;
type Action<Args, T> = Arc<dyn Fn(Args) -> Option<BoxFuture<'static, Outcome<T>>> + Send + Sync>;

/// Per-query overrides of [`QueryConfiguration`].
pub struct QueryOptions<Args> {
    debounce: Option<Duration>,
    wait_time: Option<Duration>,
    max_delay: Option<Option<Duration>>,
    equality: Option<Equality<Args>>,
    validate: Option<Validator<Args>>,
}

impl<Args> QueryOptions<Args> {
    /// No overrides.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debounce: None,
            wait_time: None,
            max_delay: None,
            equality: None,
            validate: None,
        }
    }

    /// Override the debounce window.
    #[must_use]
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    /// Override the wait time.
    #[must_use]
    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = Some(wait_time);
        self
    }

    /// Enable the maximum delay.
    #[must_use]
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(Some(max_delay));
        self
    }

    /// Disable the maximum delay even if the configuration sets one.
    #[must_use]
    pub fn no_max_delay(mut self) -> Self {
        self.max_delay = Some(None);
        self
    }

    /// Decide when new arguments count as a change. Defaults to `==`.
    #[must_use]
    pub fn equality(mut self, equality: impl Fn(&Args, &Args) -> bool + Send + Sync + 'static) -> Self {
        self.equality = Some(Arc::new(equality));
        self
    }

    /// Only execute requests whose arguments pass `validate`.
    #[must_use]
    pub fn validate(mut self, validate: impl Fn(&Args) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    fn timing(&self, configuration: QueryConfiguration) -> QueryConfiguration {
        QueryConfiguration {
            debounce: self.debounce.unwrap_or(configuration.debounce),
            wait_time: self.wait_time.unwrap_or(configuration.wait_time),
            max_delay: self.max_delay.unwrap_or(configuration.max_delay),
        }
    }
}

impl<Args> Default for QueryOptions<Args> {
    fn default() -> Self {
        Self::new()
    }
}

/// One triggered request: its index and the arguments captured at trigger
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext<Args> {
    index: u64,
    args: Args,
}

impl<Args> QueryContext<Args> {
    /// Allocation index.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Captured arguments.
    #[must_use]
    pub const fn args(&self) -> &Args {
        &self.args
    }

    /// Whether this context was allocated before `other`.
    #[must_use]
    pub const fn is_before<Other>(&self, other: &QueryContext<Other>) -> bool {
        self.index < other.index
    }
}

/// Observable status of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryStatus {
    /// At least one request passed validation and has not settled.
    pub pending: bool,
}

struct Schedule<Args> {
    args: Args,
    next_index: u64,
    dirty_until: Option<Instant>,
    window_start: Option<Instant>,
    pending: BTreeSet<u64>,
    recorded: Option<u64>,
}

struct Shared<Args, T> {
    action: Action<Args, T>,
    timing: QueryConfiguration,
    equality: Equality<Args>,
    validate: Option<Validator<Args>>,
    schedule: Mutex<Schedule<Args>>,
    last: watch::Sender<Outcome<T>>,
}

/// Handle to a repeatable query. Clones share the same query.
pub struct Query<Args, T> {
    shared: Arc<Shared<Args, T>>,
}

impl<Args, T> Clone for Query<Args, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Args, T> Query<Args, T>
where
    Args: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Create a query with default timing and trigger it with `args`.
    ///
    /// `action` returns `None` to skip a call, or the call to make. Must be
    /// called within a Tokio runtime.
    pub fn subscribe<F, Fut, R>(action: F, args: Args, options: QueryOptions<Args>) -> Self
    where
        Args: PartialEq,
        T: DeserializeOwned,
        F: Fn(Args) -> Option<Fut> + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Rejection<T>>> + Send + 'static,
        R: IntoOutcome<T> + Send + 'static,
    {
        Self::subscribe_with(QueryConfiguration::default(), action, args, options)
    }

    /// [`subscribe`](Self::subscribe) with client-wide timing defaults.
    pub fn subscribe_with<F, Fut, R>(
        configuration: QueryConfiguration,
        action: F,
        args: Args,
        options: QueryOptions<Args>,
    ) -> Self
    where
        Args: PartialEq,
        T: DeserializeOwned,
        F: Fn(Args) -> Option<Fut> + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Rejection<T>>> + Send + 'static,
        R: IntoOutcome<T> + Send + 'static,
    {
        let action: Action<Args, T> = Arc::new(move |args| {
            action(args).map(|call| -> BoxFuture<'static, Outcome<T>> { Box::pin(wrap_fetch(call)) })
        });
        let timing = options.timing(configuration);
        let equality = options
            .equality
            .unwrap_or_else(|| Arc::new(|a: &Args, b: &Args| a == b));
        let (last, _) = watch::channel(Outcome::never_fetched());

        let query = Self {
            shared: Arc::new(Shared {
                action,
                timing,
                equality,
                validate: options.validate,
                schedule: Mutex::new(Schedule {
                    args,
                    next_index: 0,
                    dirty_until: None,
                    window_start: None,
                    pending: BTreeSet::new(),
                    recorded: None,
                }),
                last,
            }),
        };
        query.shared.trigger();
        query
    }

    /// Trigger the query again with its current arguments.
    pub fn refresh(&self) {
        self.shared.trigger();
    }

    /// Replace the arguments, triggering only if they changed.
    pub fn set_args(&self, args: Args) {
        let changed = {
            let mut schedule = self.shared.lock();
            if (self.shared.equality)(&schedule.args, &args) {
                false
            } else {
                schedule.args = args;
                true
            }
        };
        if changed {
            self.shared.trigger();
        }
    }

    /// Current arguments.
    #[must_use]
    pub fn args(&self) -> Args {
        self.shared.lock().args.clone()
    }

    /// Last accepted outcome; `NeverFetched` until the first response.
    #[must_use]
    pub fn last(&self) -> Outcome<T>
    where
        T: Clone,
    {
        self.shared.last.borrow().clone()
    }

    /// Receiver notified whenever a new outcome is accepted.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Outcome<T>> {
        self.shared.last.subscribe()
    }

    /// Whether any request is queued or in flight.
    #[must_use]
    pub fn pending(&self) -> bool {
        !self.shared.lock().pending.is_empty()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> QueryStatus {
        QueryStatus {
            pending: self.pending(),
        }
    }

    /// Last outcome, a refresh function and the status.
    #[must_use]
    pub fn parts(&self) -> (Outcome<T>, impl Fn() + Send + Sync + 'static, QueryStatus)
    where
        T: Clone,
    {
        let query = self.clone();
        (self.last(), move || query.refresh(), self.status())
    }
}

impl<Args, T> Shared<Args, T>
where
    Args: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Schedule<Args>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trigger(self: &Arc<Self>) {
        let context = {
            let mut schedule = self.lock();
            let index = schedule.next_index;
            schedule.next_index += 1;
            QueryContext {
                index,
                args: schedule.args.clone(),
            }
        };
        ::metrics::counter!(QUERY_TRIGGERS).increment(1);

        if let Some(validate) = &self.validate {
            if !validate(&context.args) {
                tracing::debug!(index = context.index, "Query arguments failed validation");
                ::metrics::counter!(QUERY_VALIDATION_REJECTIONS).increment(1);
                return;
            }
        }

        self.lock().pending.insert(context.index);

        match self.plan(Instant::now()) {
            None => self.execute(context),
            Some(delay) => {
                tracing::trace!(index = context.index, delay_ms = delay.as_millis(), "Query queued");
                let shared = Arc::downgrade(self);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(shared) = Weak::upgrade(&shared) {
                        shared.execute(context);
                    }
                });
            }
        }
    }

    /// Delay before the newest context may execute; `None` runs it now.
    fn plan(&self, now: Instant) -> Option<Duration> {
        let QueryConfiguration {
            debounce,
            wait_time,
            max_delay,
        } = self.timing;
        if debounce.is_zero() && wait_time.is_zero() {
            return None;
        }

        let mut schedule = self.lock();
        let window_start = *schedule.window_start.get_or_insert(now);

        let queue_after = match schedule.dirty_until {
            Some(dirty_until) if dirty_until > now => (dirty_until - now).max(wait_time),
            _ => wait_time,
        };
        let delay = match max_delay {
            Some(max_delay) => {
                queue_after.min((window_start + max_delay).saturating_duration_since(now))
            }
            None => queue_after,
        };
        schedule.dirty_until = Some(now + delay + debounce);

        if delay.is_zero() { None } else { Some(delay) }
    }

    fn execute(self: &Arc<Self>, context: QueryContext<Args>) {
        {
            let mut schedule = self.lock();
            if context.index + 1 != schedule.next_index {
                schedule.pending.remove(&context.index);
                tracing::debug!(
                    index = context.index,
                    latest = schedule.next_index.saturating_sub(1),
                    "Discarding stale query request"
                );
                ::metrics::counter!(QUERY_STALE_DISCARDS).increment(1);
                return;
            }
            schedule.window_start = None;
        }

        let Some(call) = (self.action)(context.args.clone()) else {
            self.lock().pending.remove(&context.index);
            tracing::debug!(index = context.index, "Query action skipped the call");
            ::metrics::counter!(QUERY_SKIPPED).increment(1);
            return;
        };
        ::metrics::counter!(QUERY_EXECUTIONS).increment(1);

        let shared = Arc::downgrade(self);
        let index = context.index;
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = call.await;
            ::metrics::histogram!(FETCH_DURATION).record(started.elapsed().as_secs_f64());
            if let Some(shared) = Weak::upgrade(&shared) {
                shared.settle(index, outcome);
            }
        });
    }

    fn settle(&self, index: u64, outcome: Outcome<T>) {
        let mut schedule = self.lock();
        schedule.pending.remove(&index);
        if schedule.recorded.is_none_or(|recorded| index > recorded) {
            schedule.recorded = Some(index);
            tracing::trace!(index, kind = outcome.kind(), "Query outcome recorded");
            self.last.send_replace(outcome);
        } else {
            tracing::debug!(index, "Ignoring response older than the recorded one");
            ::metrics::counter!(QUERY_RESPONSES_IGNORED).increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_override_configuration() {
        let configuration = QueryConfiguration::new().with_max_delay(Some(Duration::from_secs(3)));
        let options = QueryOptions::<()>::new()
            .debounce(Duration::from_secs(1))
            .no_max_delay();

        let timing = options.timing(configuration);
        assert_eq!(timing.debounce, Duration::from_secs(1));
        assert_eq!(timing.wait_time, Duration::ZERO);
        assert_eq!(timing.max_delay, None);
    }

    #[test]
    fn defaults_match_client_configuration() {
        let timing = QueryOptions::<()>::default().timing(QueryConfiguration::default());
        assert_eq!(timing.debounce, Duration::from_millis(100));
        assert_eq!(timing.max_delay, None);
    }

    #[test]
    fn contexts_order_by_index() {
        let first = QueryContext { index: 1, args: "a" };
        let second = QueryContext { index: 2, args: 5 };
        assert!(first.is_before(&second));
        assert!(!second.is_before(&first));
    }
}
