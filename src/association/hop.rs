use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scope::{Condition, ScopeFragment};

use super::owner::Owner;

/// Resolved pair of correlation columns for one hop.
///
/// - `key`: column on this hop's target table, filtered by the incoming ids
/// - `foreign_key`: column on the previous hop's rows (or the owner) that
///   supplies those ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinKeys {
    pub key: String,
    pub foreign_key: String,
}

impl JoinKeys {
    pub fn new(key: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        JoinKeys {
            key: key.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// How a hop exposes its correlation columns.
///
/// Older metadata only offers separate primary/foreign accessors, either of
/// which may be missing; newer metadata carries a combined [`JoinKeys`] value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMetadata {
    JoinKeys(JoinKeys),
    Accessors {
        primary_key: Option<String>,
        foreign_key: Option<String>,
    },
}

/// Value written into a polymorphic discriminator column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolymorphicType {
    /// The column references the owner: compare against the owner's type name
    Owner { column: String },
    /// The column references a declared source type, e.g. `"CakeDesigner"`
    Source { column: String, type_name: String },
}

impl PolymorphicType {
    pub fn column(&self) -> &str {
        match self {
            PolymorphicType::Owner { column } | PolymorphicType::Source { column, .. } => column,
        }
    }

    pub fn condition_for(&self, owner: &Owner) -> Condition {
        match self {
            PolymorphicType::Owner { column } => Condition::eq(column, owner.polymorphic_name()),
            PolymorphicType::Source { column, type_name } => {
                Condition::eq(column, type_name.as_str())
            }
        }
    }
}

/// A declared scope block, evaluated against the owner each time the hop's
/// scope is built.
#[derive(Clone)]
pub struct ConstraintBlock(Arc<dyn Fn(&Owner) -> ScopeFragment + Send + Sync>);

impl ConstraintBlock {
    pub fn new<F>(block: F) -> Self
    where
        F: Fn(&Owner) -> ScopeFragment + Send + Sync + 'static,
    {
        ConstraintBlock(Arc::new(block))
    }

    /// Block that ignores the owner
    pub fn fixed(fragment: ScopeFragment) -> Self {
        ConstraintBlock::new(move |_| fragment.clone())
    }

    pub fn evaluate(&self, owner: &Owner) -> ScopeFragment {
        (self.0)(owner)
    }
}

impl fmt::Debug for ConstraintBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConstraintBlock(..)")
    }
}

/// One link of an association chain
#[derive(Debug, Clone)]
pub struct Hop {
    /// Association name, used in diagnostics
    pub name: String,
    /// Entity whose rows carry this hop's `foreign_key` values
    pub source: String,
    /// Table this hop filters
    pub target: String,
    pub keys: KeyMetadata,
    /// The hop's own base scope
    pub base_filters: Vec<Condition>,
    pub constraints: Vec<ConstraintBlock>,
    pub polymorphic: Option<PolymorphicType>,
}

impl Hop {
    /// Hop with no key metadata yet; set keys with [`Hop::join_keys`] or
    /// [`Hop::accessors`].
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Hop {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            keys: KeyMetadata::Accessors {
                primary_key: None,
                foreign_key: None,
            },
            base_filters: Vec::new(),
            constraints: Vec::new(),
            polymorphic: None,
        }
    }

    pub fn join_keys(mut self, key: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        self.keys = KeyMetadata::JoinKeys(JoinKeys::new(key, foreign_key));
        self
    }

    pub fn accessors(mut self, primary_key: Option<&str>, foreign_key: Option<&str>) -> Self {
        self.keys = KeyMetadata::Accessors {
            primary_key: primary_key.map(str::to_string),
            foreign_key: foreign_key.map(str::to_string),
        };
        self
    }

    pub fn base_filter(mut self, condition: Condition) -> Self {
        self.base_filters.push(condition);
        self
    }

    pub fn constraint<F>(mut self, block: F) -> Self
    where
        F: Fn(&Owner) -> ScopeFragment + Send + Sync + 'static,
    {
        self.constraints.push(ConstraintBlock::new(block));
        self
    }

    /// Discriminator column compared against the owner's type name
    pub fn polymorphic_as(mut self, column: impl Into<String>) -> Self {
        self.polymorphic = Some(PolymorphicType::Owner {
            column: column.into(),
        });
        self
    }

    /// Discriminator column compared against a fixed source type
    pub fn source_type(mut self, column: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.polymorphic = Some(PolymorphicType::Source {
            column: column.into(),
            type_name: type_name.into(),
        });
        self
    }
}
