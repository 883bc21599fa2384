use serde::{Deserialize, Serialize};

use crate::scope::{Row, Value};

/// The record an association chain starts from.
///
/// `type_name` doubles as the polymorphic name written into discriminator
/// columns that point back at the owner (e.g. `"Author"`), so it must be the
/// same string the rows were stored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub type_name: String,
    pub id: Value,
    pub attributes: Row,
}

impl Owner {
    pub fn new(type_name: impl Into<String>, id: impl Into<Value>) -> Self {
        Owner {
            type_name: type_name.into(),
            id: id.into(),
            attributes: Row::new(),
        }
    }

    pub fn with_attribute(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(column, value);
        self
    }

    /// Attribute readable by constraint blocks; `NULL` when absent
    pub fn attribute(&self, column: &str) -> &Value {
        self.attributes.value(column)
    }

    pub fn polymorphic_name(&self) -> &str {
        &self.type_name
    }

    /// An owner without a primary key value (not persisted yet) owns nothing
    pub fn is_persisted(&self) -> bool {
        !self.id.is_null()
    }
}
