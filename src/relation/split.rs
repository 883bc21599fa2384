//! Split result relation
//!
//! Wraps the final scope of a walk whose order was decided upstream. The
//! wrapped query knows nothing about that order, so rows are loaded once,
//! bucketed by the correlation key and laid out again in the order of the
//! upstream id sequence. Ids that appear twice get their bucket twice.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::ScopedRelation;
use crate::executor::{ExecutionError, QueryExecutor};
use crate::resolver::SplitPlan;
use crate::scope::{Condition, OrderClause, Row, Scope, Value};

/// Lay `rows` out in `ids` order, grouping on `key`.
///
/// Rows keep their query order inside each bucket. Ids without rows
/// contribute nothing; rows whose key is not in `ids` are dropped.
pub fn reassemble(rows: Vec<Row>, key: &str, ids: &[Value]) -> Vec<Row> {
    lay_out(&group_by_key(rows, key), ids)
}

/// Bucket rows by their `key` value, keeping query order inside each bucket
pub fn group_by_key(rows: Vec<Row>, key: &str) -> HashMap<Value, Vec<Row>> {
    let mut buckets: HashMap<Value, Vec<Row>> = HashMap::new();
    for row in rows {
        buckets.entry(row.value(key).clone()).or_default().push(row);
    }
    buckets
}

/// Concatenate the bucket of every id in turn. Repeated ids repeat their bucket.
pub fn lay_out(buckets: &HashMap<Value, Vec<Row>>, ids: &[Value]) -> Vec<Row> {
    let mut out = Vec::new();
    for id in ids {
        if let Some(bucket) = buckets.get(id) {
            out.extend(bucket.iter().cloned());
        }
    }
    out
}

/// True when reassembling `rows` rows in memory deserves a performance warning
pub fn exceeds_threshold(rows: usize, threshold: usize) -> bool {
    rows > threshold
}

fn has_duplicates(ids: &[Value]) -> bool {
    let mut seen = HashSet::with_capacity(ids.len());
    !ids.iter().all(|id| seen.insert(id))
}

#[derive(Clone)]
pub struct SplitRelation {
    scope: Scope,
    key: String,
    ids: Vec<Value>,
    executor: Arc<dyn QueryExecutor>,
    large_result_threshold: usize,
    records: OnceCell<Arc<Vec<Row>>>,
}

impl SplitRelation {
    pub fn new(
        plan: SplitPlan,
        executor: Arc<dyn QueryExecutor>,
        large_result_threshold: usize,
    ) -> Self {
        SplitRelation {
            scope: plan.scope,
            key: plan.key,
            ids: plan.ids,
            executor,
            large_result_threshold,
            records: OnceCell::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Column rows are grouped on
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upstream id sequence that dictates output order
    pub fn ids(&self) -> &[Value] {
        &self.ids
    }

    pub fn is_loaded(&self) -> bool {
        self.records.initialized()
    }

    /// Load and reassemble the records, at most once per instance.
    ///
    /// Concurrent callers wait for the first load instead of starting their
    /// own. A failed load leaves the relation unloaded.
    pub async fn materialize(&self) -> Result<Arc<Vec<Row>>, ExecutionError> {
        let records = self
            .records
            .get_or_try_init(|| async { self.load().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(records))
    }

    async fn load(&self) -> Result<Vec<Row>, ExecutionError> {
        let rows = self.executor.execute(&self.scope).await?;

        if exceeds_threshold(rows.len(), self.large_result_threshold) {
            log::warn!(
                "Ordering {} `{}` rows in memory to preserve association order. This may have an impact on the performance of this query.",
                rows.len(),
                self.scope.table_name()
            );
        }

        let records = reassemble(rows, &self.key, &self.ids);
        log::debug!(
            "Reassembled {} `{}` rows over {} correlation ids",
            records.len(),
            self.scope.table_name(),
            self.ids.len()
        );
        Ok(records)
    }

    /// True when the wrapped scope can only return rows keyed by one of
    /// `ids`. A constraint that unscoped the key filter breaks this, and the
    /// query then sees rows that reassembly would drop.
    fn rows_stay_within_ids(&self) -> bool {
        let ids: HashSet<&Value> = self.ids.iter().collect();
        self.scope.conditions().iter().any(|c| match c {
            Condition::In { column, values } => {
                column == &self.key && values.iter().all(|v| ids.contains(v))
            }
            _ => false,
        })
    }

    /// Drop the cached records and load again
    pub async fn reload(&mut self) -> Result<Arc<Vec<Row>>, ExecutionError> {
        self.records = OnceCell::new();
        self.materialize().await
    }

    pub async fn to_a(&self) -> Result<Vec<Row>, ExecutionError> {
        Ok(self.materialize().await?.as_ref().clone())
    }

    /// Number of reassembled records.
    ///
    /// With a duplicate-free id sequence and a scope still filtered on the
    /// key, every matching row appears exactly once, so the count runs
    /// against the wrapped scope without loading rows.
    pub async fn count(&self) -> Result<usize, ExecutionError> {
        if let Some(records) = self.records.get() {
            return Ok(records.len());
        }
        if has_duplicates(&self.ids) || !self.rows_stay_within_ids() {
            return Ok(self.materialize().await?.len());
        }
        self.executor.count(&self.scope).await
    }

    pub async fn is_empty(&self) -> Result<bool, ExecutionError> {
        if let Some(records) = self.records.get() {
            return Ok(records.is_empty());
        }
        if !self.rows_stay_within_ids() {
            return Ok(self.materialize().await?.is_empty());
        }
        Ok(self.executor.count(&self.scope).await? == 0)
    }

    /// Values of `column` in reassembled order.
    ///
    /// Before materialization only the key and the requested column are fetched.
    pub async fn pluck(&self, column: &str) -> Result<Vec<Value>, ExecutionError> {
        if let Some(records) = self.records.get() {
            return Ok(records.iter().map(|r| r.value(column).clone()).collect());
        }

        let columns = vec![self.key.clone(), column.to_string()];
        let pairs = self.executor.pluck(&self.scope, &columns).await?;
        Ok(reassemble(pairs, &self.key, &self.ids)
            .iter()
            .map(|r| r.value(column).clone())
            .collect())
    }

    pub async fn first(&self) -> Result<Option<Row>, ExecutionError> {
        Ok(self.materialize().await?.first().cloned())
    }

    pub async fn first_n(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        self.limit(n).await
    }

    /// First `n` reassembled records. Never pushed down to the query: a
    /// limited query would cut rows before they are reordered.
    pub async fn limit(&self, n: usize) -> Result<Vec<Row>, ExecutionError> {
        Ok(self.materialize().await?.iter().take(n).cloned().collect())
    }

    /// Narrow the wrapped scope; the result keeps the upstream order
    pub fn filter(&self, condition: Condition) -> SplitRelation {
        SplitRelation {
            scope: self.scope.clone().with_condition(condition),
            key: self.key.clone(),
            ids: self.ids.clone(),
            executor: Arc::clone(&self.executor),
            large_result_threshold: self.large_result_threshold,
            records: OnceCell::new(),
        }
    }

    /// Explicit order replaces the upstream order, so the query can sort again
    pub fn reorder(&self, clauses: Vec<OrderClause>) -> ScopedRelation {
        ScopedRelation::new(
            self.scope.clone().reorder(clauses),
            Arc::clone(&self.executor),
        )
    }
}

impl fmt::Debug for SplitRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitRelation")
            .field("scope", &self.scope)
            .field("key", &self.key)
            .field("ids", &self.ids)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
