//! Entity lookups that answer with outcomes.
//!
//! [`Repository`] is the data-access collaborator: it returns rows or a
//! [`RepositoryError`] and knows nothing about outcomes. [`EntityService`]
//! turns its answers into outcomes:
//!
//! - rows found: `Literal`
//! - no row for a single lookup: `NotFound` (entity not found), carrying
//!   the serialized find options for debug exposure
//! - repository failure: `UnexpectedError` with code `DatabaseException`
//!   and the failing method
//!
//! The `*_required` variants return `Result` so callers can leave early
//! with `?` and hand the outcome back to whoever reports it.
//!
//! # Example
//!
//! ```ignore
//! let users = EntityService::new(repository, "User");
//!
//! let user = users.find_by_id(&42).await;
//! let name = user.map(|u| u.name).alt_value("anonymous".to_string());
//! ```

use crate::outcome::Outcome;
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

/// Failure reported by a repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The store rejected or failed the query.
    #[error("query failed: {0}")]
    Query(String),
}

/// Data-access collaborator.
pub trait Repository: Send + Sync {
    /// Row type.
    type Entity: Send;

    /// Lookup options. `Default` selects everything.
    type Query: Serialize + Default + Send + Sync;

    /// Primary key type.
    type Id: Send + Sync;

    /// All rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store fails.
    fn find(
        &self,
        query: &Self::Query,
    ) -> impl Future<Output = Result<Vec<Self::Entity>, RepositoryError>> + Send;

    /// First row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store fails.
    fn find_one(
        &self,
        query: &Self::Query,
    ) -> impl Future<Output = Result<Option<Self::Entity>, RepositoryError>> + Send;

    /// Lookup options selecting the row with primary key `id`.
    fn query_by_id(&self, id: &Self::Id) -> Self::Query;
}

/// Outcome-returning facade over a [`Repository`].
#[derive(Debug, Clone)]
pub struct EntityService<R> {
    repository: R,
    entity_name: String,
}

impl<R: Repository> EntityService<R> {
    /// Wrap `repository`, naming its rows `entity_name` in outcomes.
    pub fn new(repository: R, entity_name: impl Into<String>) -> Self {
        Self {
            repository,
            entity_name: entity_name.into(),
        }
    }

    /// Name used in not-found outcomes.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// The wrapped repository.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Every row.
    pub async fn list_all(&self) -> Outcome<Vec<R::Entity>> {
        self.find(&R::Query::default()).await
    }

    /// Rows matching `query`. An empty list is still data.
    pub async fn find(&self, query: &R::Query) -> Outcome<Vec<R::Entity>> {
        match self.repository.find(query).await {
            Ok(rows) => Outcome::literal(rows),
            Err(error) => self.database_exception("find", &error),
        }
    }

    /// The first row matching `query`.
    pub async fn find_one(&self, query: &R::Query) -> Outcome<R::Entity> {
        match self.repository.find_one(query).await {
            Ok(Some(row)) => Outcome::literal(row),
            Ok(None) => {
                tracing::debug!(entity = %self.entity_name, "No row matched lookup");
                Outcome::entity_not_found(&self.entity_name, serde_json::to_value(query).ok())
            }
            Err(error) => self.database_exception("findOne", &error),
        }
    }

    /// The row with primary key `id`.
    pub async fn find_by_id(&self, id: &R::Id) -> Outcome<R::Entity> {
        let query = self.repository.query_by_id(id);
        self.find_one(&query).await
    }

    /// [`find_one`](Self::find_one), failing with the outcome when no row
    /// is available.
    ///
    /// # Errors
    ///
    /// Returns the not-found or database-exception outcome.
    pub async fn find_one_required(&self, query: &R::Query) -> Result<R::Entity, Outcome<R::Entity>> {
        self.find_one(query).await.into_result()
    }

    /// [`find_by_id`](Self::find_by_id), failing with the outcome when no
    /// row is available.
    ///
    /// # Errors
    ///
    /// Returns the not-found or database-exception outcome.
    pub async fn find_by_id_required(&self, id: &R::Id) -> Result<R::Entity, Outcome<R::Entity>> {
        self.find_by_id(id).await.into_result()
    }

    fn database_exception<T>(&self, method: &str, error: &RepositoryError) -> Outcome<T> {
        tracing::warn!(
            entity = %self.entity_name,
            method,
            error = %error,
            "Repository call failed"
        );
        Outcome::database_exception(method, error)
    }
}
