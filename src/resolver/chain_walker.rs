//! Chain Walker
//!
//! Walks a chain from the owner towards the target, one single-table query per
//! intermediate hop. Each hop's rows supply the correlation ids the next hop
//! filters on; ids keep row order and duplicates so the final hop can restore
//! them when an upstream hop was ordered.
//!
//! The walk stops as soon as a hop yields no ids: nothing downstream can match.

use crate::association::{Chain, Owner};
use crate::executor::{ExecutionError, QueryExecutor};
use crate::relation::reassemble;
use crate::scope::{Scope, ToSql, Value};

use super::scope_builder::{build_hop_scope, HopQuery};

/// Walk `chain` for `owner` and return the final hop's query, or a `none`
/// scope over the target table when the walk short-circuits.
pub async fn walk_chain(
    chain: &Chain,
    owner: &Owner,
    executor: &dyn QueryExecutor,
    log_scopes: bool,
) -> Result<HopQuery, ExecutionError> {
    let hops = chain.hops();
    let last = chain.last();

    let mut ids: Vec<Value> = if owner.is_persisted() {
        vec![owner.id.clone()]
    } else {
        Vec::new()
    };
    let mut ordered = false;

    for (index, hop) in hops[..hops.len() - 1].iter().enumerate() {
        if ids.is_empty() {
            break;
        }

        let next = &hops[index + 1];
        let result = build_hop_scope(hop, &ids, owner, ordered);

        if log_scopes {
            log::debug!(
                "hop {} `{}`{}: {}",
                index,
                hop.name(),
                if result.query.is_split() { " (split)" } else { "" },
                result.query.scope().to_sql()
            );
        }

        ids = correlation_ids(executor, &result.query, next.foreign_key()).await?;
        ordered |= result.has_explicit_order;

        log::debug!(
            "hop {} `{}` produced {} correlation ids for `{}` (ordered: {})",
            index,
            hop.name(),
            ids.len(),
            next.name(),
            ordered
        );
    }

    if ids.is_empty() {
        log::debug!(
            "no correlation ids reach `{}`; resolving to an empty scope",
            last.name()
        );
        return Ok(HopQuery::Plain(Scope::none(chain.target())));
    }

    let result = build_hop_scope(last, &ids, owner, ordered);
    if log_scopes {
        log::debug!(
            "final hop `{}`{}: {}",
            last.name(),
            if result.query.is_split() { " (split)" } else { "" },
            result.query.scope().to_sql()
        );
    }

    Ok(result.query)
}

/// Values of `foreign_key` from one hop's rows, in the order the next hop must
/// honour. Split hops are regrouped by their key first so an upstream order
/// carries through unordered intermediate hops. `NULL`s never correlate and
/// are dropped.
async fn correlation_ids(
    executor: &dyn QueryExecutor,
    query: &HopQuery,
    foreign_key: &str,
) -> Result<Vec<Value>, ExecutionError> {
    let rows = match query {
        HopQuery::Plain(scope) => executor.pluck(scope, &[foreign_key.to_string()]).await?,
        HopQuery::Split(plan) => {
            let columns = if plan.key == foreign_key {
                vec![plan.key.clone()]
            } else {
                vec![plan.key.clone(), foreign_key.to_string()]
            };
            let rows = executor.pluck(&plan.scope, &columns).await?;
            reassemble(rows, &plan.key, &plan.ids)
        }
    };

    Ok(rows
        .iter()
        .map(|r| r.value(foreign_key).clone())
        .filter(|v| !v.is_null())
        .collect())
}
