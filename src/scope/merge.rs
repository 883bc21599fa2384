//! Constraint merge
//!
//! Folds the constraint blocks declared on a hop into the scope the hop
//! already built. The hop's base scope is only ever applied by the hop itself;
//! a fragment that repeats one of its conditions does not add it a second time.

use super::{Scope, ScopeFragment};
use crate::association::{ConstraintBlock, Owner};

/// Merge one evaluated fragment into `scope`:
/// 1. strip whatever the fragment unscopes,
/// 2. AND in the fragment's conditions,
/// 3. put the fragment's order clauses ahead of the existing ones.
pub fn merge_fragment(scope: Scope, fragment: &ScopeFragment) -> Scope {
    scope
        .unscope(&fragment.unscope)
        .merge_where(&fragment.conditions)
        .merge_order(&fragment.order)
}

/// Evaluate every block against `owner` and merge the results in declaration order.
pub fn fold_constraints(scope: Scope, blocks: &[ConstraintBlock], owner: &Owner) -> Scope {
    blocks.iter().fold(scope, |memo, block| {
        let fragment = block.evaluate(owner);
        merge_fragment(memo, &fragment)
    })
}
