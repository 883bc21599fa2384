//! Scope Builder
//!
//! Turns one hop plus its incoming correlation ids into a single-table scope.
//! Pure: nothing here talks to the executor.

use crate::association::{Owner, ResolvedHop};
use crate::scope::{dedup_preserving_order, fold_constraints, Scope, Value};

/// A scope whose rows must be regrouped by `key` in `ids` order after loading
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub scope: Scope,
    pub key: String,
    /// Incoming ids exactly as received: order and duplicates are meaningful
    pub ids: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HopQuery {
    Plain(Scope),
    Split(SplitPlan),
}

impl HopQuery {
    pub fn scope(&self) -> &Scope {
        match self {
            HopQuery::Plain(scope) => scope,
            HopQuery::Split(plan) => &plan.scope,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, HopQuery::Split(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeResult {
    pub query: HopQuery,
    pub has_explicit_order: bool,
}

/// Build the scope for `hop`, filtered to `incoming_ids` on the hop's key.
///
/// When the finished scope has no order of its own but an upstream hop was
/// ordered, the scope is returned as a [`SplitPlan`] so the upstream order can
/// be restored in memory.
pub fn build_hop_scope(
    hop: &ResolvedHop,
    incoming_ids: &[Value],
    owner: &Owner,
    ordered_upstream: bool,
) -> ScopeResult {
    let key = hop.key();

    let scope = Scope::table(hop.target())
        .merge_where(&hop.hop.base_filters)
        .filter_in(key, dedup_preserving_order(incoming_ids));

    let mut scope = fold_constraints(scope, &hop.hop.constraints, owner);

    if let Some(polymorphic) = &hop.hop.polymorphic {
        scope = scope.with_condition(polymorphic.condition_for(owner));
    }

    let has_explicit_order = scope.has_explicit_order();

    let query = if !has_explicit_order && ordered_upstream {
        HopQuery::Split(SplitPlan {
            scope,
            key: key.to_string(),
            ids: incoming_ids.to_vec(),
        })
    } else {
        HopQuery::Plain(scope)
    };

    ScopeResult {
        query,
        has_explicit_order,
    }
}
