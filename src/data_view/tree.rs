//! Tree shape: nested nodes with per-column values.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identity::DataViewScopeIdentity;
use super::objects::DataViewObjects;
use crate::types::DataValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewTree {
    pub root: Arc<DataViewTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataViewTreeNodeValue {
    pub value: DataValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewTreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DataValue>,
    /// Values keyed by metadata column index.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<usize, DataViewTreeNodeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<DataViewTreeNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DataViewScopeIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjects>,
}

impl DataViewTreeNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, column_index: usize, value: DataValue) -> Self {
        self.values.insert(column_index, DataViewTreeNodeValue { value });
        self
    }

    pub fn with_children(mut self, children: Vec<DataViewTreeNode>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    pub fn with_identity(mut self, identity: DataViewScopeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn children(&self) -> &[Arc<DataViewTreeNode>] {
        self.children.as_deref().unwrap_or(&[])
    }
}
