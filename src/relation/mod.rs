//! Read-side results of a resolved association.
//!
//! [`Relation`] is what callers get back from
//! [`SplitResolver::resolve`](crate::resolver::SplitResolver::resolve): either a
//! plain scope that the executor can order and limit by itself, or a
//! [`SplitRelation`] whose order is restored in memory.

pub mod split;

pub use split::{exceeds_threshold, group_by_key, lay_out, reassemble, SplitRelation};

use std::fmt;
use std::sync::Arc;

use crate::executor::{ExecutionError, QueryExecutor};
use crate::scope::{Condition, OrderClause, Row, Scope, Value};

/// A scope bound to the executor that runs it.
///
/// A `none` scope answers every read without reaching the executor.
#[derive(Clone)]
pub struct ScopedRelation {
    scope: Scope,
    executor: Arc<dyn QueryExecutor>,
}

impl ScopedRelation {
    pub fn new(scope: Scope, executor: Arc<dyn QueryExecutor>) -> Self {
        ScopedRelation { scope, executor }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn to_a(&self) -> Result<Vec<Row>, ExecutionError> {
        if self.scope.is_none() {
            return Ok(Vec::new());
        }
        self.executor.execute(&self.scope).await
    }

    pub async fn count(&self) -> Result<usize, ExecutionError> {
        if self.scope.is_none() {
            return Ok(0);
        }
        self.executor.count(&self.scope).await
    }

    pub async fn is_empty(&self) -> Result<bool, ExecutionError> {
        Ok(self.count().await? == 0)
    }

    pub async fn pluck(&self, column: &str) -> Result<Vec<Value>, ExecutionError> {
        if self.scope.is_none() {
            return Ok(Vec::new());
        }
        let rows = self
            .executor
            .pluck(&self.scope, &[column.to_string()])
            .await?;
        Ok(rows.iter().map(|r| r.value(column).clone()).collect())
    }

    pub async fn first(&self) -> Result<Option<Row>, ExecutionError> {
        Ok(self.limit(1).await?.into_iter().next())
    }

    pub async fn first_n(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        self.limit(n).await
    }

    /// Limit pushed down to the query
    pub async fn limit(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        if self.scope.is_none() {
            return Ok(Vec::new());
        }
        self.executor
            .execute(&self.scope.clone().with_limit(n))
            .await
    }

    pub fn filter(&self, condition: Condition) -> ScopedRelation {
        ScopedRelation::new(
            self.scope.clone().with_condition(condition),
            Arc::clone(&self.executor),
        )
    }

    pub fn reorder(&self, clauses: Vec<OrderClause>) -> ScopedRelation {
        ScopedRelation::new(
            self.scope.clone().reorder(clauses),
            Arc::clone(&self.executor),
        )
    }
}

impl fmt::Debug for ScopedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedRelation")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Result of resolving an association chain
#[derive(Debug, Clone)]
pub enum Relation {
    Scoped(ScopedRelation),
    Split(SplitRelation),
}

impl Relation {
    pub fn scope(&self) -> &Scope {
        match self {
            Relation::Scoped(r) => r.scope(),
            Relation::Split(r) => r.scope(),
        }
    }

    /// True when order is restored in memory
    pub fn is_split(&self) -> bool {
        matches!(self, Relation::Split(_))
    }

    /// True when the relation is known to be empty without querying
    pub fn is_none(&self) -> bool {
        self.scope().is_none()
    }

    pub async fn to_a(&self) -> Result<Vec<Row>, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.to_a().await,
            Relation::Split(r) => r.to_a().await,
        }
    }

    pub async fn count(&self) -> Result<usize, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.count().await,
            Relation::Split(r) => r.count().await,
        }
    }

    pub async fn is_empty(&self) -> Result<bool, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.is_empty().await,
            Relation::Split(r) => r.is_empty().await,
        }
    }

    pub async fn pluck(&self, column: &str) -> Result<Vec<Value>, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.pluck(column).await,
            Relation::Split(r) => r.pluck(column).await,
        }
    }

    pub async fn first(&self) -> Result<Option<Row>, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.first().await,
            Relation::Split(r) => r.first().await,
        }
    }

    pub async fn first_n(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.first_n(n).await,
            Relation::Split(r) => r.first_n(n).await,
        }
    }

    pub async fn limit(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        match self {
            Relation::Scoped(r) => r.limit(n).await,
            Relation::Split(r) => r.limit(n).await,
        }
    }

    pub fn filter(&self, condition: Condition) -> Relation {
        match self {
            Relation::Scoped(r) => Relation::Scoped(r.filter(condition)),
            Relation::Split(r) => Relation::Split(r.filter(condition)),
        }
    }

    pub fn reorder(&self, clauses: Vec<OrderClause>) -> Relation {
        match self {
            Relation::Scoped(r) => Relation::Scoped(r.reorder(clauses)),
            Relation::Split(r) => Relation::Scoped(r.reorder(clauses)),
        }
    }
}
