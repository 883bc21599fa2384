//! In-memory executor
//!
//! A small single-table query engine over rows held in memory. It validates
//! table and column names the way a database would, applies conditions,
//! sorts stably by the scope's order clauses and honours limits. Every call
//! counts as one issued query and is recorded in the query log, which makes
//! it convenient for checking how many round trips a walk costs.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use super::{ExecutionError, QueryExecutor};
use crate::scope::{Row, Scope, SortDirection, ToSql, Value};

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<HashMap<String, Table>>,
    query_count: AtomicUsize,
    query_log: Mutex<Vec<String>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a table with the given columns
    pub fn create_table(&self, name: &str, columns: &[&str]) -> Result<(), ExecutionError> {
        let mut tables = self.write_tables()?;
        tables.insert(
            name.to_string(),
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        Ok(())
    }

    /// Insert a row and return its `id`.
    ///
    /// Declared columns missing from `row` are stored as `NULL`, except `id`,
    /// which is assigned from a per-table sequence when the table has one.
    pub fn insert(&self, table: &str, row: Row) -> Result<Value, ExecutionError> {
        let mut tables = self.write_tables()?;
        let data = tables
            .get_mut(table)
            .ok_or_else(|| ExecutionError::UnknownTable {
                table: table.to_string(),
            })?;

        if let Some(column) = row.columns().find(|c| !data.has_column(c)) {
            return Err(ExecutionError::UnknownColumn {
                column: column.to_string(),
                table: table.to_string(),
            });
        }

        let mut stored = Row::new();
        for column in &data.columns {
            stored.insert(column.clone(), row.value(column).clone());
        }

        if data.has_column("id") {
            match stored.value("id").clone() {
                Value::Null => {
                    stored.insert("id", data.next_id);
                    data.next_id += 1;
                }
                Value::Int(explicit) if explicit >= data.next_id => data.next_id = explicit + 1,
                _ => {}
            }
        }

        let id = stored.value("id").clone();
        data.rows.push(stored);
        Ok(id)
    }

    /// Number of queries issued so far
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::SeqCst);
        if let Ok(mut log) = self.query_log.lock() {
            log.clear();
        }
    }

    /// Rendered text of every query issued since the last reset
    pub fn queries(&self) -> Vec<String> {
        self.query_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn write_tables(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Table>>, ExecutionError> {
        self.tables
            .write()
            .map_err(|_| ExecutionError::Backend("table lock poisoned".to_string()))
    }

    fn record(&self, sql: String) {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.query_log.lock() {
            log.push(sql);
        }
    }

    fn run(&self, scope: &Scope, projected: &[String]) -> Result<Vec<Row>, ExecutionError> {
        self.record(scope.to_sql());

        let tables = self
            .tables
            .read()
            .map_err(|_| ExecutionError::Backend("table lock poisoned".to_string()))?;
        let table = tables
            .get(scope.table_name())
            .ok_or_else(|| ExecutionError::UnknownTable {
                table: scope.table_name().to_string(),
            })?;

        if let Some(column) = scope
            .referenced_columns()
            .into_iter()
            .chain(projected.iter().map(String::as_str))
            .find(|c| !table.has_column(c))
        {
            return Err(ExecutionError::UnknownColumn {
                column: column.to_string(),
                table: scope.table_name().to_string(),
            });
        }

        if scope.is_none() {
            return Ok(Vec::new());
        }

        let mut rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| scope.conditions().iter().all(|c| c.matches(row)))
            .cloned()
            .collect();

        if scope.has_explicit_order() {
            rows.sort_by(|a, b| {
                scope
                    .order()
                    .iter()
                    .map(|clause| {
                        let ord = a.value(&clause.column).cmp(b.value(&clause.column));
                        match clause.direction {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != CmpOrdering::Equal)
                    .unwrap_or(CmpOrdering::Equal)
            });
        }

        if let Some(limit) = scope.limit() {
            rows.truncate(limit);
        }

        Ok(rows)
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, scope: &Scope) -> Result<Vec<Row>, ExecutionError> {
        self.run(scope, &[])
    }

    async fn pluck(&self, scope: &Scope, columns: &[String]) -> Result<Vec<Row>, ExecutionError> {
        let rows = self.run(scope, columns)?;
        Ok(rows.iter().map(|r| r.project(columns)).collect())
    }

    async fn count(&self, scope: &Scope) -> Result<usize, ExecutionError> {
        self.run(scope, &[]).map(|rows| rows.len())
    }
}
