//! Batched preloading
//!
//! Loads one chain for many owners with one query per hop. Every hop query
//! filters on the correlation ids of all owners at once; each row is handed
//! back to the owners whose ids it matched, so every owner ends up with the
//! order and repetition its own walk would have produced.

use std::collections::HashSet;

use crate::association::{Chain, Owner};
use crate::executor::{ExecutionError, QueryExecutor};
use crate::relation::{exceeds_threshold, group_by_key, lay_out};
use crate::scope::{dedup_preserving_order, Condition, Row, Scope, ToSql, Value};

use super::scope_builder::build_hop_scope;

/// True when every constraint block evaluates to the same fragment for all
/// `owners`, so one scope per hop can serve all of them.
pub fn shares_hop_scopes(chain: &Chain, owners: &[&Owner]) -> bool {
    let Some((first, rest)) = owners.split_first() else {
        return true;
    };

    chain.hops().iter().all(|hop| {
        let expected: Vec<_> = hop
            .hop
            .constraints
            .iter()
            .map(|block| block.evaluate(first))
            .collect();
        rest.iter().all(|owner| {
            hop.hop
                .constraints
                .iter()
                .map(|block| block.evaluate(owner))
                .collect::<Vec<_>>()
                == expected
        })
    })
}

/// Rows of a shared plain query that belong to one owner: those keyed by one
/// of its ids, in query order. When the key filter did not survive the
/// constraint fold, every owner's own query would have matched every row.
fn rows_for(rows: &[Row], key: &str, ids: &[Value], keyed: bool) -> Vec<Row> {
    if !keyed {
        return rows.to_vec();
    }
    let wanted: HashSet<&Value> = ids.iter().collect();
    rows.iter()
        .filter(|row| wanted.contains(row.value(key)))
        .cloned()
        .collect()
}

/// Hand the shared `rows` of one hop back to each owner
fn distribute(
    rows: Vec<Row>,
    key: &str,
    per_owner: &[Vec<Value>],
    split: bool,
    keyed: bool,
) -> Vec<Vec<Row>> {
    if split {
        let buckets = group_by_key(rows, key);
        per_owner.iter().map(|ids| lay_out(&buckets, ids)).collect()
    } else {
        per_owner
            .iter()
            .map(|ids| {
                if ids.is_empty() {
                    Vec::new()
                } else {
                    rows_for(&rows, key, ids, keyed)
                }
            })
            .collect()
    }
}

fn is_keyed(scope: &Scope, key: &str, all_ids: &[Value]) -> bool {
    scope
        .conditions()
        .contains(&Condition::in_list(key, dedup_preserving_order(all_ids)))
}

/// Load the target rows of `chain` for every owner. The result is aligned
/// with `owners`; owners without an id get nothing.
///
/// Constraint blocks are evaluated against the first persisted owner, so
/// callers must check [`shares_hop_scopes`] first.
pub async fn preload_chain(
    chain: &Chain,
    owners: &[Owner],
    executor: &dyn QueryExecutor,
    large_result_threshold: usize,
) -> Result<Vec<Vec<Row>>, ExecutionError> {
    let Some(representative) = owners.iter().find(|o| o.is_persisted()) else {
        return Ok(vec![Vec::new(); owners.len()]);
    };

    let hops = chain.hops();
    let last = chain.last();

    let mut ids: Vec<Vec<Value>> = owners
        .iter()
        .map(|o| {
            if o.is_persisted() {
                vec![o.id.clone()]
            } else {
                Vec::new()
            }
        })
        .collect();
    let mut ordered = false;

    for (index, hop) in hops[..hops.len() - 1].iter().enumerate() {
        let all: Vec<Value> = ids.iter().flatten().cloned().collect();
        if all.is_empty() {
            break;
        }

        let next = &hops[index + 1];
        let result = build_hop_scope(hop, &all, representative, ordered);
        let scope = result.query.scope();
        let key = hop.key();
        let foreign_key = next.foreign_key();

        let mut columns = vec![key.to_string()];
        if foreign_key != key {
            columns.push(foreign_key.to_string());
        }

        log::debug!(
            "preload hop {} `{}` for {} owners: {}",
            index,
            hop.name(),
            owners.len(),
            scope.to_sql()
        );

        let rows = executor.pluck(scope, &columns).await?;
        let keyed = is_keyed(scope, key, &all);

        ids = distribute(rows, key, &ids, result.query.is_split(), keyed)
            .into_iter()
            .map(|owned| {
                owned
                    .iter()
                    .map(|r| r.value(foreign_key).clone())
                    .filter(|v| !v.is_null())
                    .collect()
            })
            .collect();
        ordered |= result.has_explicit_order;
    }

    let all: Vec<Value> = ids.iter().flatten().cloned().collect();
    if all.is_empty() {
        log::debug!(
            "no correlation ids reach `{}` for any of {} owners",
            last.name(),
            owners.len()
        );
        return Ok(vec![Vec::new(); owners.len()]);
    }

    let result = build_hop_scope(last, &all, representative, ordered);
    let scope = result.query.scope();
    let split = result.query.is_split();
    let rows = executor.execute(scope).await?;

    if split && exceeds_threshold(rows.len(), large_result_threshold) {
        log::warn!(
            "Ordering {} `{}` rows in memory to preserve association order. This may have an impact on the performance of this query.",
            rows.len(),
            scope.table_name()
        );
    }

    let keyed = is_keyed(scope, last.key(), &all);
    Ok(distribute(rows, last.key(), &ids, split, keyed))
}
