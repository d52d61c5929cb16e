//! DataView metadata: the column descriptions every shape refers to.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::objects::DataViewObjects;
use crate::sqexpr::SQExprRef;
use crate::types::{DataValue, ValueType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMetadata {
    pub columns: Vec<Arc<DataViewMetadataColumn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjects>,
}

impl DataViewMetadata {
    pub fn new(columns: Vec<DataViewMetadataColumn>) -> Self {
        Self {
            columns: columns.into_iter().map(Arc::new).collect(),
            objects: None,
        }
    }

    /// Column with the given select index.
    pub fn column_by_index(&self, index: usize) -> Option<&Arc<DataViewMetadataColumn>> {
        self.columns.iter().find(|c| c.index == Some(index))
    }

    pub fn column_by_query_name(&self, query_name: &str) -> Option<&Arc<DataViewMetadataColumn>> {
        self.columns
            .iter()
            .find(|c| c.query_name.as_deref() == Some(query_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Pre-computed aggregates of a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataViewColumnAggregates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Over the current data window only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_local: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_local: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl DataViewColumnAggregates {
    /// `(min, max)`, preferring the global pair and falling back to the
    /// local one.
    pub fn range(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => match (self.min_local, self.max_local) {
                (Some(min), Some(max)) => Some((min, max)),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMetadataColumn {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub is_measure: bool,
    /// Select index this column came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjects>,
    /// Series value this column belongs to, for pivoted/grouped measures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<SQExprRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregates: Option<DataViewColumnAggregates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
}

impl DataViewMetadataColumn {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into(), true);
        self
    }

    pub fn with_expr(mut self, expr: SQExprRef) -> Self {
        self.expr = Some(expr);
        self
    }

    pub fn with_aggregates(mut self, aggregates: DataViewColumnAggregates) -> Self {
        self.aggregates = Some(aggregates);
        self
    }

    pub fn measure(mut self) -> Self {
        self.is_measure = true;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.get(role).copied().unwrap_or(false)
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
    }

    /// Whether two column references denote the same select.
    pub fn same_select(&self, other: &DataViewMetadataColumn) -> bool {
        match (self.index, other.index) {
            (Some(a), Some(b)) => a == b,
            _ => self.query_name.is_some() && self.query_name == other.query_name,
        }
    }
}
