//! Query execution boundary.
//!
//! The resolver never talks to a database directly. It hands immutable
//! [`Scope`] values to a [`QueryExecutor`] and receives rows back. Errors are
//! the executor's own and travel up unchanged.

pub mod memory;

pub use memory::MemoryExecutor;

use async_trait::async_trait;
use thiserror::Error;

use crate::scope::{dedup_preserving_order, Row, Scope, Value};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("Table `{table}` does not exist")]
    UnknownTable { table: String },

    #[error("Column `{column}` not found in table `{table}`")]
    UnknownColumn { column: String, table: String },

    #[error("Query execution failed: {0}")]
    Backend(String),
}

/// Runs single-table scopes.
///
/// Implementations must return rows in the scope's order (insertion order for
/// unordered scopes) and must treat an empty `IN` list as matching nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// All rows matching `scope`
    async fn execute(&self, scope: &Scope) -> Result<Vec<Row>, ExecutionError>;

    /// Matching rows restricted to `columns`, in query order, duplicates kept
    async fn pluck(&self, scope: &Scope, columns: &[String]) -> Result<Vec<Row>, ExecutionError>;

    /// Number of matching rows
    async fn count(&self, scope: &Scope) -> Result<usize, ExecutionError>;

    /// Distinct values of `column`, first occurrence order.
    ///
    /// Offered to callers that need a plain id projection. The chain walk
    /// plucks instead because it must keep duplicate ids.
    async fn project_distinct(
        &self,
        scope: &Scope,
        column: &str,
    ) -> Result<Vec<Value>, ExecutionError> {
        let rows = self.pluck(scope, &[column.to_string()]).await?;
        let values: Vec<Value> = rows.iter().map(|r| r.value(column).clone()).collect();
        Ok(dedup_preserving_order(&values))
    }
}
