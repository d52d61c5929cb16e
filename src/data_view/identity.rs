//! Scope identities and wildcards.
//!
//! A scope identity names one row, series or cell of a DataView by an
//! expression (usually `field = value`, or an `And` of those for composite
//! keys). Identity equality is expression equality; the canonical short
//! serialization is kept alongside as the comparison key.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sqexpr::equality::set_equals;
use crate::sqexpr::utils::get_key_fields;
use crate::sqexpr::{SQExprBuilder, SQExprRef, SQExprShortSerializer};
use crate::types::{DataValue, ValueType};

#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "ScopeIdentityWire", into = "ScopeIdentityWire")]
pub struct DataViewScopeIdentity {
    expr: SQExprRef,
    key: Arc<str>,
}

#[derive(Serialize, Deserialize)]
struct ScopeIdentityWire {
    expr: SQExprRef,
}

impl From<ScopeIdentityWire> for DataViewScopeIdentity {
    fn from(wire: ScopeIdentityWire) -> Self {
        Self::new(wire.expr)
    }
}

impl From<DataViewScopeIdentity> for ScopeIdentityWire {
    fn from(identity: DataViewScopeIdentity) -> Self {
        Self {
            expr: identity.expr,
        }
    }
}

impl DataViewScopeIdentity {
    pub fn new(expr: SQExprRef) -> Self {
        let key = SQExprShortSerializer::serialize(&expr).into();
        Self { expr, key }
    }

    /// Identity of the row where `field` has `value`.
    pub fn from_field_value(field: &SQExprRef, value: &DataValue, value_type: ValueType) -> Self {
        let constant = SQExprBuilder::typed_constant(value.clone(), value_type);
        Self::new(SQExprBuilder::equal(Arc::clone(field), constant))
    }

    /// Conjunction of several identities (composite keys, cross-joins).
    pub fn combine<'a>(identities: impl IntoIterator<Item = &'a DataViewScopeIdentity>) -> Option<Self> {
        identities
            .into_iter()
            .map(|i| Arc::clone(&i.expr))
            .reduce(|left, right| {
                SQExprBuilder::and(Some(left.clone()), Some(right)).unwrap_or(left)
            })
            .map(Self::new)
    }

    pub fn expr(&self) -> &SQExprRef {
        &self.expr
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The fields this identity constrains (its comparands).
    pub fn key_fields(&self) -> Vec<SQExprRef> {
        get_key_fields(&self.expr)
    }
}

impl PartialEq for DataViewScopeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DataViewScopeIdentity {}

impl std::hash::Hash for DataViewScopeIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for DataViewScopeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataViewScopeIdentity").field(&self.key).finish()
    }
}

/// Matches every scope whose identity constrains exactly `exprs`,
/// regardless of the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataViewScopeWildcard {
    pub exprs: Vec<SQExprRef>,
}

impl DataViewScopeWildcard {
    pub fn new(exprs: Vec<SQExprRef>) -> Self {
        Self { exprs }
    }

    pub fn key(&self) -> String {
        SQExprShortSerializer::serialize_array(&self.exprs)
    }

    pub fn matches(&self, identity: &DataViewScopeIdentity) -> bool {
        set_equals(&self.exprs, &identity.key_fields())
    }
}

/// Matches every value-column point whose source column carries one of
/// `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewRoleWildcard {
    pub roles: Vec<String>,
}

impl DataViewRoleWildcard {
    pub fn new(roles: Vec<String>) -> Self {
        Self { roles }
    }

    pub fn key(&self) -> String {
        format!("roles:{}", self.roles.join(","))
    }
}
