//! # Formulaic Testing
//!
//! Testing utilities and helpers for formulaic crates.
//!
//! This crate provides:
//! - An in-memory [`Repository`](formulaic_core::Repository) with failure
//!   injection
//! - Call-recording spies for actions handed to queries and requests
//! - Helpers for virtual-time tests and test logging
//! - proptest strategies for outcomes and exposure groups
//!
//! ## Example
//!
//! ```ignore
//! use formulaic_testing::{Spy, settle};
//! use formulaic_runtime::{Query, QueryOptions};
//!
//! #[tokio::test(start_paused = true)]
//! async fn refresh_runs_again() {
//!     let spy = Spy::new();
//!     let recorder = spy.clone();
//!     let query = Query::subscribe(
//!         move |n: u32| {
//!             recorder.record(n);
//!             Some(async move { Ok::<_, Rejection<u32>>(n) })
//!         },
//!         1,
//!         QueryOptions::new(),
//!     );
//!     settle().await;
//!     assert_eq!(spy.count(), 1);
//! }
//! ```

/// proptest strategies for outcomes
pub mod properties;

/// Mock implementations of collaborator traits.
pub mod mocks {
    use formulaic_core::{Repository, RepositoryError};
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Equality filter over serialized entity fields.
    ///
    /// An empty query matches every row.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct FieldQuery {
        /// Required field values.
        #[serde(flatten)]
        pub fields: Map<String, Value>,
    }

    impl FieldQuery {
        /// Match everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Require `name` to equal `value`.
        #[must_use]
        pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
            self.fields.insert(name.into(), value.into());
            self
        }

        fn matches(&self, row: &Value) -> bool {
            self.fields
                .iter()
                .all(|(name, expected)| row.get(name) == Some(expected))
        }
    }

    /// In-memory repository for tests.
    ///
    /// Rows are matched against a [`FieldQuery`] through their JSON form.
    /// [`fail_with`](Self::fail_with) makes every call fail until
    /// [`recover`](Self::recover).
    #[derive(Debug, Clone)]
    pub struct InMemoryRepository<E> {
        rows: Arc<Mutex<Vec<E>>>,
        failure: Arc<Mutex<Option<RepositoryError>>>,
        id_field: String,
    }

    impl<E> InMemoryRepository<E>
    where
        E: Serialize + Clone + Send + Sync,
    {
        /// Create a repository holding `rows`, keyed by their `id` field.
        #[must_use]
        pub fn new(rows: Vec<E>) -> Self {
            Self {
                rows: Arc::new(Mutex::new(rows)),
                failure: Arc::new(Mutex::new(None)),
                id_field: "id".to_string(),
            }
        }

        /// Use `field` as the primary key.
        #[must_use]
        pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
            self.id_field = field.into();
            self
        }

        /// Add a row.
        pub fn insert(&self, row: E) {
            self.rows
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(row);
        }

        /// Fail every call with `error`.
        pub fn fail_with(&self, error: RepositoryError) {
            *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        }

        /// Stop failing.
        pub fn recover(&self) {
            *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }

        fn matching(&self, query: &FieldQuery) -> Result<Vec<E>, RepositoryError> {
            if let Some(error) = self
                .failure
                .lock()
                .map_err(|_| RepositoryError::Connection("lock poisoned".to_string()))?
                .clone()
            {
                return Err(error);
            }

            let rows = self
                .rows
                .lock()
                .map_err(|_| RepositoryError::Connection("lock poisoned".to_string()))?;

            let mut matched = Vec::new();
            for row in rows.iter() {
                let serialized = serde_json::to_value(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                if query.matches(&serialized) {
                    matched.push(row.clone());
                }
            }
            Ok(matched)
        }
    }

    impl<E> Repository for InMemoryRepository<E>
    where
        E: Serialize + Clone + Send + Sync,
    {
        type Entity = E;
        type Query = FieldQuery;
        type Id = Value;

        async fn find(&self, query: &FieldQuery) -> Result<Vec<E>, RepositoryError> {
            self.matching(query)
        }

        async fn find_one(&self, query: &FieldQuery) -> Result<Option<E>, RepositoryError> {
            Ok(self.matching(query)?.into_iter().next())
        }

        fn query_by_id(&self, id: &Value) -> FieldQuery {
            FieldQuery::new().field(self.id_field.clone(), id.clone())
        }
    }

    /// Records the arguments of every call made through it.
    #[derive(Debug)]
    pub struct Spy<A> {
        calls: Arc<Mutex<Vec<A>>>,
    }

    impl<A> Clone for Spy<A> {
        fn clone(&self) -> Self {
            Self {
                calls: Arc::clone(&self.calls),
            }
        }
    }

    impl<A> Default for Spy<A> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<A> Spy<A> {
        /// A spy with no recorded calls.
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Record one call.
        pub fn record(&self, args: A) {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(args);
        }

        /// Number of recorded calls.
        #[must_use]
        pub fn count(&self) -> usize {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Recorded arguments in call order.
        #[must_use]
        pub fn calls(&self) -> Vec<A>
        where
            A: Clone,
        {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Let spawned tasks that are ready run to their next suspension point.
    ///
    /// With a paused clock, timers only fire once the test itself sleeps;
    /// this only drains work that is already runnable.
    pub async fn settle() {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    /// Install a test-friendly `tracing` subscriber, honoring `RUST_LOG`.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::{init_test_tracing, settle};
pub use mocks::{FieldQuery, InMemoryRepository, Spy};
