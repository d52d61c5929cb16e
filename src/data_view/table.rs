//! Table shape: rows of cells in column order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identity::DataViewScopeIdentity;
use super::metadata::DataViewMetadataColumn;
use super::objects::DataViewObjects;
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

pub type DataViewTableRow = Arc<Vec<DataValue>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewTable {
    pub columns: Vec<Arc<DataViewMetadataColumn>>,
    pub rows: Vec<DataViewTableRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Vec<DataViewScopeIdentity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_fields: Option<Vec<SQExprRef>>,
    /// Per-row objects; `None` when no row carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_objects: Option<Vec<DataViewObjects>>,
}

impl DataViewTable {
    pub fn new(columns: Vec<Arc<DataViewMetadataColumn>>, rows: Vec<Vec<DataValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns,
            rows: rows.into_iter().map(Arc::new).collect(),
            identity: None,
            identity_fields: None,
            row_objects: None,
        }
    }

    pub fn with_identity(
        mut self,
        identity: Vec<DataViewScopeIdentity>,
        identity_fields: Vec<SQExprRef>,
    ) -> Self {
        debug_assert_eq!(identity.len(), self.rows.len());
        self.identity = Some(identity);
        self.identity_fields = Some(identity_fields);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, column)`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(column)
    }
}
