//! splithop - split-hop resolution of has-many-through associations
//!
//! This crate answers multi-step "through" associations (owner → intermediate
//! → … → target) with:
//! - one simple single-table query per hop instead of one large joined query
//! - in-memory reassembly of the final rows so upstream ordering and
//!   duplicate rows survive the split
//! - per-hop constraint blocks, polymorphic discriminators and custom join keys
//!
//! Queries are described by immutable [`scope::Scope`] values and run by a
//! [`executor::QueryExecutor`] supplied by the caller.

pub mod association;
pub mod config;
pub mod executor;
pub mod relation;
pub mod resolver;
pub mod scope;

pub use association::{Chain, Hop, Owner, ResolveError};
pub use config::ResolverConfig;
pub use executor::{ExecutionError, MemoryExecutor, QueryExecutor};
pub use relation::{Relation, ScopedRelation, SplitRelation};
pub use resolver::SplitResolver;
pub use scope::{Condition, OrderClause, Row, Scope, ScopeFragment, Unscope, Value};
