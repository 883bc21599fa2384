//! # Scopes
//!
//! A [`Scope`] is an immutable description of a single-table query: the table,
//! the AND-ed filter conditions, the ordering, an optional limit, and whether
//! the scope is known to be empty. Every transformation returns a new value so
//! scopes built for one hop can never alias state from another.
//!
//! Scopes are only descriptions. Running them is the job of a
//! [`QueryExecutor`](crate::executor::QueryExecutor).

pub mod merge;
pub mod to_sql;
pub mod value;

pub use merge::{fold_constraints, merge_fragment};
pub use to_sql::ToSql;
pub use value::{dedup_preserving_order, Row, Value};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single filter condition. Conditions in a scope are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `column IN (values)`; an empty list matches nothing
    In { column: String, values: Vec<Value> },
    /// `column = value`; `NULL` matches `NULL`
    Eq { column: String, value: Value },
    /// `column != value`; rows holding `NULL` never match
    NotEq { column: String, value: Value },
}

impl Condition {
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::In {
            column: column.into(),
            values,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn not_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::NotEq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Condition::In { column, .. }
            | Condition::Eq { column, .. }
            | Condition::NotEq { column, .. } => column,
        }
    }

    /// Evaluate the condition against a row
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::In { column, values } => {
                let v = row.value(column);
                !v.is_null() && values.contains(v)
            }
            Condition::Eq { column, value } => row.value(column) == value,
            Condition::NotEq { column, value } => {
                let v = row.value(column);
                !v.is_null() && v != value
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderClause {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderClause {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderClause {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parts of an accumulated scope that a fragment may strip before merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unscope {
    /// Drop every condition on this column
    Where(String),
    /// Drop all order clauses
    Order,
}

/// An ad-hoc scope fragment produced by evaluating a constraint block
/// against the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFragment {
    pub conditions: Vec<Condition>,
    pub unscope: Vec<Unscope>,
    pub order: Vec<OrderClause>,
}

impl ScopeFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn unscope(mut self, unscope: Unscope) -> Self {
        self.unscope.push(unscope);
        self
    }

    pub fn order(mut self, clause: OrderClause) -> Self {
        self.order.push(clause);
        self
    }
}

/// Immutable single-table query description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    table: String,
    conditions: Vec<Condition>,
    order: Vec<OrderClause>,
    limit: Option<usize>,
    empty: bool,
}

impl Scope {
    /// Unfiltered scope over `table`
    pub fn table(table: impl Into<String>) -> Self {
        Scope {
            table: table.into(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            empty: false,
        }
    }

    /// Scope over `table` that is known to match nothing. Read operations on it
    /// never reach the executor.
    pub fn none(table: impl Into<String>) -> Self {
        Scope {
            empty: true,
            ..Scope::table(table)
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> &[OrderClause] {
        &self.order
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_none(&self) -> bool {
        self.empty
    }

    pub fn has_explicit_order(&self) -> bool {
        !self.order.is_empty()
    }

    /// AND a condition in. An identical condition already present is not added twice.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        self
    }

    /// `column IN (values)`
    pub fn filter_in(self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.with_condition(Condition::in_list(column, values))
    }

    /// AND every condition in `conditions`
    pub fn merge_where(self, conditions: &[Condition]) -> Self {
        conditions
            .iter()
            .cloned()
            .fold(self, |scope, condition| scope.with_condition(condition))
    }

    /// Prepend `clauses` to the existing ordering. Clauses already present are
    /// kept only at their first position.
    pub fn merge_order(mut self, clauses: &[OrderClause]) -> Self {
        let mut merged: Vec<OrderClause> = Vec::with_capacity(clauses.len() + self.order.len());
        for clause in clauses.iter().chain(self.order.iter()) {
            if !merged.contains(clause) {
                merged.push(clause.clone());
            }
        }
        self.order = merged;
        self
    }

    /// Replace the ordering entirely
    pub fn reorder(mut self, clauses: Vec<OrderClause>) -> Self {
        self.order = clauses;
        self
    }

    pub fn unscope(mut self, parts: &[Unscope]) -> Self {
        for part in parts {
            match part {
                Unscope::Where(column) => self.conditions.retain(|c| c.column() != column),
                Unscope::Order => self.order.clear(),
            }
        }
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every column this scope references, in condition then order position
    pub fn referenced_columns(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .map(Condition::column)
            .chain(self.order.iter().map(|o| o.column.as_str()))
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
