//! Join-key resolution
//!
//! Combined [`JoinKeys`] metadata wins; separate accessors are the fallback.
//! Runs once per hop when a [`Chain`](super::Chain) is built.

use super::errors::{KeySide, ResolveError};
use super::hop::{Hop, JoinKeys, KeyMetadata};

/// Resolve `(key, foreign_key)` for `hop`.
pub fn keys_for(hop: &Hop) -> Result<JoinKeys, ResolveError> {
    let (key, foreign_key) = match &hop.keys {
        KeyMetadata::JoinKeys(keys) => (Some(keys.key.as_str()), Some(keys.foreign_key.as_str())),
        KeyMetadata::Accessors {
            primary_key,
            foreign_key,
        } => (primary_key.as_deref(), foreign_key.as_deref()),
    };

    let key = non_empty(key).ok_or_else(|| missing(hop, KeySide::Primary))?;
    let foreign_key = non_empty(foreign_key).ok_or_else(|| missing(hop, KeySide::Foreign))?;

    Ok(JoinKeys::new(key, foreign_key))
}

fn non_empty(column: Option<&str>) -> Option<&str> {
    column.map(str::trim).filter(|c| !c.is_empty())
}

fn missing(hop: &Hop, side: KeySide) -> ResolveError {
    ResolveError::MissingJoinKey {
        hop: hop.name.clone(),
        side,
    }
}
