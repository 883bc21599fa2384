//! Textual rendering of scopes for log output.
//!
//! The rendering is diagnostic: executors receive the structured [`Scope`],
//! never this string.

use super::{Condition, OrderClause, Scope};

pub trait ToSql {
    fn to_sql(&self) -> String;
}

impl ToSql for Condition {
    fn to_sql(&self) -> String {
        match self {
            Condition::In { column, values } => {
                if values.is_empty() {
                    // Empty IN list never matches
                    "1 = 0".to_string()
                } else {
                    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    format!("{} IN ({})", column, items.join(", "))
                }
            }
            Condition::Eq { column, value } if value.is_null() => format!("{} IS NULL", column),
            Condition::Eq { column, value } => format!("{} = {}", column, value),
            Condition::NotEq { column, value } => format!("{} != {}", column, value),
        }
    }
}

impl ToSql for OrderClause {
    fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction)
    }
}

impl ToSql for Scope {
    fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table_name());

        if self.is_none() {
            sql.push_str(" WHERE 1 = 0");
            return sql;
        }

        if !self.conditions().is_empty() {
            let filters: Vec<String> = self.conditions().iter().map(ToSql::to_sql).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }

        if !self.order().is_empty() {
            let order: Vec<String> = self.order().iter().map(ToSql::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit() {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}
