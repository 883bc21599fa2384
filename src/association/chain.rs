use super::errors::ResolveError;
use super::hop::{Hop, JoinKeys};
use super::join_keys::keys_for;

/// A hop together with the join keys resolved for it at chain-build time
#[derive(Debug, Clone)]
pub struct ResolvedHop {
    pub hop: Hop,
    pub keys: JoinKeys,
}

impl ResolvedHop {
    pub fn name(&self) -> &str {
        &self.hop.name
    }

    pub fn target(&self) -> &str {
        &self.hop.target
    }

    /// Column on this hop's table filtered by the incoming correlation ids
    pub fn key(&self) -> &str {
        &self.keys.key
    }

    /// Column on the previous hop's rows supplying this hop's correlation ids
    pub fn foreign_key(&self) -> &str {
        &self.keys.foreign_key
    }
}

/// Ordered hops from the owner side to the target side.
///
/// Invariants established by [`Chain::new`]:
/// - at least one hop
/// - every hop's keys resolve
/// - each hop departs from the entity the previous hop targets
#[derive(Debug, Clone)]
pub struct Chain {
    hops: Vec<ResolvedHop>,
}

impl Chain {
    pub fn new(hops: Vec<Hop>) -> Result<Self, ResolveError> {
        if hops.is_empty() {
            return Err(ResolveError::EmptyChain);
        }

        for pair in hops.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.source != previous.target {
                return Err(ResolveError::IncompatibleHops {
                    previous: previous.name.clone(),
                    next: next.name.clone(),
                    expected: next.source.clone(),
                    found: previous.target.clone(),
                });
            }
        }

        let hops = hops
            .into_iter()
            .map(|hop| keys_for(&hop).map(|keys| ResolvedHop { hop, keys }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Chain { hops })
    }

    pub fn hops(&self) -> &[ResolvedHop] {
        &self.hops
    }

    pub fn first(&self) -> &ResolvedHop {
        &self.hops[0]
    }

    pub fn last(&self) -> &ResolvedHop {
        &self.hops[self.hops.len() - 1]
    }

    /// Entity type the chain starts from
    pub fn owner_type(&self) -> &str {
        &self.first().hop.source
    }

    /// Table holding the chain's result rows
    pub fn target(&self) -> &str {
        self.last().target()
    }

    /// True for a simple (non-through) association
    pub fn is_direct(&self) -> bool {
        self.hops.len() == 1
    }
}
