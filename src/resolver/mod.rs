//! # Split-hop resolver
//!
//! Resolves a has-many-through association chain with one single-table query
//! per hop instead of one joined query, and restores the joined query's order
//! in memory when an upstream hop was ordered.
//!
//! ```ignore
//! let resolver = SplitResolver::new(executor, ResolverConfig::default());
//! let comments = resolver.resolve(&author_comments, &author).await?;
//! let first = comments.first().await?;
//! ```

pub mod chain_walker;
pub mod preloader;
pub mod scope_builder;

pub use chain_walker::walk_chain;
pub use preloader::{preload_chain, shares_hop_scopes};
pub use scope_builder::{build_hop_scope, HopQuery, ScopeResult, SplitPlan};

use std::sync::Arc;

use crate::association::{Chain, Owner, ResolveError};
use crate::config::ResolverConfig;
use crate::executor::QueryExecutor;
use crate::relation::{Relation, ScopedRelation, SplitRelation};
use crate::scope::Row;

/// Entry point for association loading code. Construct once and share by
/// reference; it holds no per-walk state.
#[derive(Clone)]
pub struct SplitResolver {
    executor: Arc<dyn QueryExecutor>,
    config: ResolverConfig,
}

impl SplitResolver {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: ResolverConfig) -> Self {
        SplitResolver { executor, config }
    }

    pub fn with_defaults(executor: Arc<dyn QueryExecutor>) -> Self {
        Self::new(executor, ResolverConfig::default())
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `chain` for `owner`.
    ///
    /// Intermediate hops are queried immediately; the final hop is returned
    /// unexecuted as a [`Relation`].
    pub async fn resolve(&self, chain: &Chain, owner: &Owner) -> Result<Relation, ResolveError> {
        check_owner(chain, owner)?;

        let query = walk_chain(
            chain,
            owner,
            self.executor.as_ref(),
            self.config.log_hop_scopes,
        )
        .await?;

        let relation = match query {
            HopQuery::Plain(scope) => {
                Relation::Scoped(ScopedRelation::new(scope, Arc::clone(&self.executor)))
            }
            HopQuery::Split(plan) => {
                log::info!(
                    "`{}` for {} {} resolves to a split relation over {} correlation ids",
                    chain.last().name(),
                    owner.type_name,
                    owner.id,
                    plan.ids.len()
                );
                Relation::Split(SplitRelation::new(
                    plan,
                    Arc::clone(&self.executor),
                    self.config.large_result_threshold,
                ))
            }
        };

        Ok(relation)
    }

    /// Load the target records of `chain` for every owner.
    ///
    /// The result is aligned with `owners` and each entry matches what
    /// [`resolve`](Self::resolve) followed by `to_a` gives that owner. When
    /// constraint blocks evaluate the same for all owners the chain is walked
    /// once, with one query per hop; otherwise owners are resolved in turn.
    pub async fn preload(
        &self,
        chain: &Chain,
        owners: &[Owner],
    ) -> Result<Vec<Vec<Row>>, ResolveError> {
        for owner in owners {
            check_owner(chain, owner)?;
        }

        let persisted: Vec<&Owner> = owners.iter().filter(|o| o.is_persisted()).collect();
        if shares_hop_scopes(chain, &persisted) {
            return Ok(preload_chain(
                chain,
                owners,
                self.executor.as_ref(),
                self.config.large_result_threshold,
            )
            .await?);
        }

        log::debug!(
            "constraints on `{}` depend on the owner; preloading {} owners one at a time",
            chain.last().name(),
            owners.len()
        );
        let mut loaded = Vec::with_capacity(owners.len());
        for owner in owners {
            let relation = self.resolve(chain, owner).await?;
            loaded.push(relation.to_a().await?);
        }
        Ok(loaded)
    }
}

fn check_owner(chain: &Chain, owner: &Owner) -> Result<(), ResolveError> {
    if owner.type_name != chain.owner_type() {
        return Err(ResolveError::IncompatibleOwner {
            owner: owner.type_name.clone(),
            expected: chain.owner_type().to_string(),
        });
    }
    Ok(())
}
