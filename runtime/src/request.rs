//! Single-shot actions (create, update, delete) with rolling outcome views.
//!
//! A [`Request`] is never triggered automatically. Each
//! [`fetch`](Request::fetch) either skips (the action returned `None`) or
//! makes one call whose result is normalized with
//! [`wrap_fetch`](crate::wrap_fetch). Three views are kept:
//!
//! - `latest`: the most recent attempt, `SkippedRequest` included
//! - `last`: the most recent call that was actually made
//! - `last_data`: the most recent call that produced data
//!
//! All three start as `NeverFetched`.

use crate::fetch::{Rejection, wrap_fetch};
use crate::metrics::{REQUEST_FETCHES, kind_label};
use formulaic_core::{IntoOutcome, Outcome};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Action<Args, T> = Arc<dyn Fn(Args) -> Option<BoxFuture<'static, Outcome<T>>> + Send + Sync>;

/// Snapshot of the rolling views of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestViews<T> {
    /// Most recent attempt, including skips.
    pub latest: Outcome<T>,
    /// Most recent completed call.
    pub last: Outcome<T>,
    /// Most recent call that produced data.
    pub last_data: Outcome<T>,
}

impl<T> Default for RequestViews<T> {
    fn default() -> Self {
        Self {
            latest: Outcome::never_fetched(),
            last: Outcome::never_fetched(),
            last_data: Outcome::never_fetched(),
        }
    }
}

/// Fire-and-forget action wrapper. Clones share the same views.
pub struct Request<Args, T> {
    action: Action<Args, T>,
    views: Arc<Mutex<RequestViews<T>>>,
}

impl<Args, T> Clone for Request<Args, T> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
            views: Arc::clone(&self.views),
        }
    }
}

impl<Args, T> Request<Args, T>
where
    Args: Send + 'static,
    T: Clone + Send + 'static,
{
    /// Wrap `action`. Returning `None` from it skips the call.
    pub fn register<F, Fut, R>(action: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(Args) -> Option<Fut> + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Rejection<T>>> + Send + 'static,
        R: IntoOutcome<T> + Send + 'static,
    {
        Self {
            action: Arc::new(move |args| {
                action(args)
                    .map(|call| -> BoxFuture<'static, Outcome<T>> { Box::pin(wrap_fetch(call)) })
            }),
            views: Arc::new(Mutex::new(RequestViews::default())),
        }
    }

    /// Invoke the action once and record the outcome.
    pub async fn fetch(&self, args: Args) -> Outcome<T> {
        let Some(call) = (self.action)(args) else {
            tracing::debug!("Request action skipped the call");
            ::metrics::counter!(REQUEST_FETCHES, "kind" => "SkippedRequest").increment(1);
            let skipped = Outcome::skipped();
            self.lock().latest = skipped.clone();
            return skipped;
        };

        let outcome = call.await;
        ::metrics::counter!(REQUEST_FETCHES, "kind" => kind_label(&outcome)).increment(1);

        let mut views = self.lock();
        views.latest = outcome.clone();
        views.last = outcome.clone();
        if outcome.has_data() {
            views.last_data = outcome.clone();
        }
        outcome
    }

    /// Most recent attempt, including skips.
    #[must_use]
    pub fn latest(&self) -> Outcome<T> {
        self.lock().latest.clone()
    }

    /// Most recent completed call.
    #[must_use]
    pub fn last(&self) -> Outcome<T> {
        self.lock().last.clone()
    }

    /// Most recent call that produced data.
    #[must_use]
    pub fn last_data(&self) -> Outcome<T> {
        self.lock().last_data.clone()
    }

    /// All three views at once.
    #[must_use]
    pub fn views(&self) -> RequestViews<T> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RequestViews<T>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
