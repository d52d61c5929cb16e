//! Matrix shape: row and column hierarchies of nodes.
//!
//! Leaf row nodes carry `values` keyed by the flattened column-leaf index
//! (`column_leaf_index * value_source_count + measure_index` once column
//! groupings exist). `level_source_index` on a node points into the
//! `sources` of its hierarchy level, and `value_source_index` on a value
//! points into `value_sources`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identity::DataViewScopeIdentity;
use super::metadata::DataViewMetadataColumn;
use super::objects::DataViewObjects;
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrix {
    pub rows: DataViewHierarchy,
    pub columns: DataViewHierarchy,
    pub value_sources: Vec<Arc<DataViewMetadataColumn>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewHierarchy {
    pub root: Arc<DataViewMatrixNode>,
    pub levels: Vec<DataViewHierarchyLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewHierarchyLevel {
    pub sources: Vec<Arc<DataViewMetadataColumn>>,
}

/// Composite-group member value of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixLevelValue {
    pub value: DataValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_source_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixNodeValue {
    pub value: DataValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_source_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<DataValue>,
}

impl DataViewMatrixNodeValue {
    pub fn new(value: DataValue) -> Self {
        Self {
            value,
            value_source_index: None,
            highlight: None,
        }
    }

    pub fn value_source_index(&self) -> usize {
        self.value_source_index.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMatrixNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_source_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_values: Option<Vec<DataViewMatrixLevelValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DataViewScopeIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<DataViewMatrixNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<usize, DataViewMatrixNodeValue>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_subtotal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_identity_fields: Option<Vec<SQExprRef>>,
}

impl DataViewMatrixNode {
    pub fn leaf(level: usize, value: DataValue) -> Self {
        Self {
            level: Some(level),
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<DataViewMatrixNode>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    pub fn with_identity(mut self, identity: DataViewScopeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = (usize, DataViewMatrixNodeValue)>) -> Self {
        self.values = Some(values.into_iter().collect());
        self
    }

    pub fn children(&self) -> &[Arc<DataViewMatrixNode>] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Leaves under this node, depth first.
    pub fn leaves(self: &Arc<Self>) -> Vec<Arc<DataViewMatrixNode>> {
        let mut leaves = Vec::new();
        collect_leaves(self, &mut leaves);
        leaves
    }
}

fn collect_leaves(node: &Arc<DataViewMatrixNode>, out: &mut Vec<Arc<DataViewMatrixNode>>) {
    if node.is_leaf() {
        out.push(Arc::clone(node));
        return;
    }
    for child in node.children() {
        collect_leaves(child, out);
    }
}

impl DataViewHierarchy {
    pub fn new(root: DataViewMatrixNode, levels: Vec<DataViewHierarchyLevel>) -> Self {
        Self {
            root: Arc::new(root),
            levels,
        }
    }

    /// Leaves of the hierarchy; the root alone when it has no children.
    pub fn leaves(&self) -> Vec<Arc<DataViewMatrixNode>> {
        self.root.leaves()
    }

    /// Whether every level only holds measure headers (value sources).
    pub fn is_measure_headers_only(&self) -> bool {
        self.levels
            .iter()
            .all(|level| level.sources.iter().all(|s| s.is_measure))
    }
}

impl DataViewHierarchyLevel {
    pub fn new(sources: Vec<Arc<DataViewMetadataColumn>>) -> Self {
        Self { sources }
    }
}
