//! Categorical shape: category columns plus value columns grouped by series.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identity::DataViewScopeIdentity;
use super::metadata::DataViewMetadataColumn;
use super::objects::DataViewObjects;
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewCategorical {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<DataViewCategoryColumn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<DataViewValueColumns>,
}

impl DataViewCategorical {
    /// Number of category rows (or value points when there are no
    /// categories).
    pub fn row_count(&self) -> usize {
        if let Some(category) = self.categories.as_ref().and_then(|c| c.first()) {
            return category.values.len();
        }
        self.values
            .as_ref()
            .and_then(|v| v.columns().next())
            .map_or(0, |c| c.values.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewCategoryColumn {
    pub source: Arc<DataViewMetadataColumn>,
    pub values: Arc<Vec<DataValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Arc<Vec<DataViewScopeIdentity>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_fields: Option<Vec<SQExprRef>>,
    /// Per-row objects; `None` when no row carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<DataViewObjects>>,
}

impl DataViewCategoryColumn {
    pub fn new(source: Arc<DataViewMetadataColumn>, values: Vec<DataValue>) -> Self {
        Self {
            source,
            values: Arc::new(values),
            identity: None,
            identity_fields: None,
            objects: None,
        }
    }

    pub fn with_identity(
        mut self,
        identity: Vec<DataViewScopeIdentity>,
        identity_fields: Vec<SQExprRef>,
    ) -> Self {
        debug_assert_eq!(identity.len(), self.values.len());
        self.identity = Some(Arc::new(identity));
        self.identity_fields = Some(identity_fields);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewValueColumn {
    pub source: Arc<DataViewMetadataColumn>,
    pub values: Arc<Vec<DataValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Arc<Vec<DataValue>>>,
    /// Series identity, for grouped values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DataViewScopeIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<DataValue>,
    /// Per-point objects; `None` when no point carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<DataViewObjects>>,
}

impl DataViewValueColumn {
    pub fn new(source: Arc<DataViewMetadataColumn>, values: Vec<DataValue>) -> Self {
        Self {
            source,
            values: Arc::new(values),
            highlights: None,
            identity: None,
            min: None,
            max: None,
            subtotal: None,
            objects: None,
        }
    }

    pub fn with_identity(mut self, identity: DataViewScopeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// The value columns of one series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewValueColumnGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<DataViewScopeIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<DataValue>,
    pub values: Vec<DataViewValueColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjects>,
}

/// Value columns, stored grouped by series. Ungrouped values are a single
/// group without identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewValueColumns {
    pub groups: Vec<DataViewValueColumnGroup>,
    /// The series (grouping) column, when values are grouped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Arc<DataViewMetadataColumn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_fields: Option<Vec<SQExprRef>>,
}

impl DataViewValueColumns {
    pub fn ungrouped(columns: Vec<DataViewValueColumn>) -> Self {
        Self {
            groups: vec![DataViewValueColumnGroup {
                values: columns,
                ..Default::default()
            }],
            source: None,
            identity_fields: None,
        }
    }

    /// Build grouped columns from a flat, series-major list: consecutive
    /// columns with equal identity form one group.
    pub fn grouped(
        columns: Vec<DataViewValueColumn>,
        source: Option<Arc<DataViewMetadataColumn>>,
        identity_fields: Option<Vec<SQExprRef>>,
    ) -> Self {
        let mut groups: Vec<DataViewValueColumnGroup> = Vec::new();
        for column in columns {
            match groups.last_mut() {
                Some(group) if group.identity == column.identity => group.values.push(column),
                _ => groups.push(DataViewValueColumnGroup {
                    identity: column.identity.clone(),
                    name: column.source.group_name.clone(),
                    values: vec![column],
                    objects: None,
                }),
            }
        }
        Self {
            groups,
            source,
            identity_fields,
        }
    }

    /// Whether the values are grouped by a dynamic series.
    pub fn is_grouped(&self) -> bool {
        self.source.is_some() || self.groups.iter().any(|g| g.identity.is_some())
    }

    /// All value columns, series-major.
    pub fn columns(&self) -> impl Iterator<Item = &DataViewValueColumn> {
        self.groups.iter().flat_map(|g| g.values.iter())
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut DataViewValueColumn> {
        self.groups.iter_mut().flat_map(|g| g.values.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqexpr::SQExprBuilder;
    use crate::types::ValueType;

    #[test]
    fn test_grouped_splits_on_identity_change() {
        let field = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "e", None), "series");
        let source = Arc::new(DataViewMetadataColumn::new("Sales").measure());
        let a = DataViewScopeIdentity::from_field_value(&field, &"a".into(), ValueType::text());
        let b = DataViewScopeIdentity::from_field_value(&field, &"b".into(), ValueType::text());

        let columns = vec![
            DataViewValueColumn::new(source.clone(), vec![1.0.into()]).with_identity(a.clone()),
            DataViewValueColumn::new(source.clone(), vec![2.0.into()]).with_identity(a),
            DataViewValueColumn::new(source, vec![3.0.into()]).with_identity(b),
        ];
        let values = DataViewValueColumns::grouped(columns, None, Some(vec![field]));
        assert_eq!(values.groups.len(), 2);
        assert_eq!(values.len(), 3);
        assert!(values.is_grouped());
    }
}
