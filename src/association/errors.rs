//! # Resolution Error Types
//!
//! Errors raised while building or walking an association chain.
//!
//! ## Error Categories
//!
//! - **Configuration errors**: missing join keys, incompatible consecutive hops,
//!   an owner that does not match the chain. Fatal, never retried.
//! - **Execution errors**: anything the query executor reports, propagated unchanged.
//!
//! An empty correlation id set is *not* an error: it resolves to an empty relation.

use std::fmt;
use thiserror::Error;

use crate::executor::ExecutionError;

/// Which side of a hop's join keys could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Primary,
    Foreign,
}

impl fmt::Display for KeySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySide::Primary => f.write_str("primary"),
            KeySide::Foreign => f.write_str("foreign"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("Association chain has no hops.")]
    EmptyChain,

    #[error("No {side} key declared for hop `{hop}`: neither join keys nor a {side} key accessor is available")]
    MissingJoinKey { hop: String, side: KeySide },

    #[error("Hop `{next}` departs from `{expected}` but the previous hop `{previous}` targets `{found}`")]
    IncompatibleHops {
        previous: String,
        next: String,
        expected: String,
        found: String,
    },

    #[error("Owner of type `{owner}` cannot start a chain that departs from `{expected}`")]
    IncompatibleOwner { owner: String, expected: String },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ResolveError {
    /// True for errors caused by chain or owner configuration rather than query execution
    pub fn is_configuration(&self) -> bool {
        !matches!(self, ResolveError::Execution(_))
    }
}
