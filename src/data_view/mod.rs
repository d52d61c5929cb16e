//! The DataView data model.
//!
//! A [`DataView`] is a shaped query result: shared [`DataViewMetadata`] plus
//! any of the categorical, matrix, table, tree and single shapes. Every
//! nested structure sits behind an `Arc` so transforms can share untouched
//! parts with their input and copy only what they change
//! (`Arc::make_mut`).

pub mod categorical;
pub mod identity;
pub mod matrix;
pub mod metadata;
pub mod objects;
pub mod table;
pub mod tree;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::DataValue;

pub use categorical::{
    DataViewCategorical, DataViewCategoryColumn, DataViewValueColumn, DataViewValueColumnGroup,
    DataViewValueColumns,
};
pub use identity::{DataViewRoleWildcard, DataViewScopeIdentity, DataViewScopeWildcard};
pub use matrix::{
    DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrix, DataViewMatrixLevelValue,
    DataViewMatrixNode, DataViewMatrixNodeValue,
};
pub use metadata::{DataViewColumnAggregates, DataViewMetadata, DataViewMetadataColumn, SortDirection};
pub use objects::{DataViewObject, DataViewObjects, DataViewPropertyValue, Fill};
pub use table::DataViewTable;
pub use tree::{DataViewTree, DataViewTreeNode};

/// Single-value shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewSingle {
    pub value: DataValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<Arc<DataViewMetadataColumn>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataView {
    pub metadata: Arc<DataViewMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical: Option<Arc<DataViewCategorical>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Arc<DataViewMatrix>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Arc<DataViewTable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Arc<DataViewTree>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<Arc<DataViewSingle>>,
}

impl DataView {
    pub fn new(metadata: DataViewMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            ..Default::default()
        }
    }

    pub fn with_categorical(mut self, categorical: DataViewCategorical) -> Self {
        self.categorical = Some(Arc::new(categorical));
        self
    }

    pub fn with_matrix(mut self, matrix: DataViewMatrix) -> Self {
        self.matrix = Some(Arc::new(matrix));
        self
    }

    pub fn with_table(mut self, table: DataViewTable) -> Self {
        self.table = Some(Arc::new(table));
        self
    }

    pub fn with_tree(mut self, tree: DataViewTree) -> Self {
        self.tree = Some(Arc::new(tree));
        self
    }

    pub fn with_single(mut self, single: DataViewSingle) -> Self {
        self.single = Some(Arc::new(single));
        self
    }

    /// Parse a query DataView from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::json("DataView", e))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EngineError::json("DataView", e))
    }
}
