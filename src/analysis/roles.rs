//! Visual data roles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_view::DataViewMetadata;
use crate::types::{ValueType, ValueTypeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualDataRoleKind {
    Grouping,
    Measure,
    GroupingOrMeasure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartesianRoleKind {
    X,
    Y,
}

/// A data role declared by a visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualDataRole {
    pub name: String,
    pub kind: VisualDataRoleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Value types the role accepts. Values of other types are nulled out
    /// by the transform pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_types: Option<Vec<ValueTypeDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_types: Option<Vec<ValueTypeDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cartesian_kind: Option<CartesianRoleKind>,
}

impl VisualDataRole {
    pub fn new(name: impl Into<String>, kind: VisualDataRoleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            display_name: None,
            required_types: None,
            preferred_types: None,
            cartesian_kind: None,
        }
    }

    pub fn with_required_types(mut self, types: Vec<ValueTypeDescriptor>) -> Self {
        self.required_types = Some(types);
        self
    }

    pub fn with_cartesian_kind(mut self, kind: CartesianRoleKind) -> Self {
        self.cartesian_kind = Some(kind);
        self
    }

    /// Whether a value of `value_type` may appear in this role. Roles without
    /// required types accept everything.
    pub fn accepts(&self, value_type: &ValueType) -> bool {
        match &self.required_types {
            None => true,
            Some(types) => types.iter().any(|t| {
                let required = ValueType::from_descriptor(t);
                required.is_compatible_from(value_type)
                    || (required.is_numeric() && value_type.is_numeric())
            }),
        }
    }
}

/// Role kind of each query reference, keyed by query name.
pub type RoleKindByQueryRef = BTreeMap<String, VisualDataRoleKind>;

/// Classify every named metadata column: measures, and columns whose
/// expression is an aggregate or measure reference, are `Measure`; the rest
/// are `Grouping`.
pub fn role_kinds_from_metadata(metadata: &DataViewMetadata) -> RoleKindByQueryRef {
    metadata
        .columns
        .iter()
        .filter_map(|column| {
            let query_name = column.query_name.clone()?;
            let aggregated = column.expr.as_ref().is_some_and(|e| e.is_measure());
            let kind = if column.is_measure || aggregated {
                VisualDataRoleKind::Measure
            } else {
                VisualDataRoleKind::Grouping
            };
            Some((query_name, kind))
        })
        .collect()
}
