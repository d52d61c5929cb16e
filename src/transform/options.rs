//! Transform descriptor and apply options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{DataViewMapping, VisualDataRole};
use crate::data_view::{DataView, SortDirection};
use crate::error::{EngineError, Result};
use crate::objects::{DataViewObjectDefinitions, DataViewObjectDescriptors};
use crate::sqexpr::SQExprRef;
use crate::types::{DataValue, ValueType};

/// How one query select appears in the visual: its roles, display name,
/// type and format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewSelectTransform {
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<SQExprRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DataValue>,
}

impl DataViewSelectTransform {
    pub fn new(display_name: impl Into<String>, query_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            query_name: Some(query_name.into()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into(), true);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.get(role).copied().unwrap_or(false)
    }
}

/// Projection ordering and drill state per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewRoleTransform {
    /// `role -> select indices` in display order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ordering: BTreeMap<String, Vec<usize>>,
    /// `role -> query names` currently drilled into.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub active_items: BTreeMap<String, Vec<String>>,
}

/// One split of the query result: the select indices it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewSplitTransform {
    pub selects: BTreeMap<usize, bool>,
}

impl DataViewSplitTransform {
    pub fn contains(&self, select_index: usize) -> bool {
        self.selects.get(&select_index).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewTransforms {
    /// Indexed by select index; `None` for selects the visual does not use.
    #[serde(default)]
    pub selects: Vec<Option<DataViewSelectTransform>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<DataViewObjectDefinitions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<DataViewRoleTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splits: Option<Vec<DataViewSplitTransform>>,
}

impl DataViewTransforms {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::json("transforms", e))
    }

    pub fn select(&self, index: usize) -> Option<&DataViewSelectTransform> {
        self.selects.get(index)?.as_ref()
    }

    /// Select transforms with their indices.
    pub fn indexed_selects(&self) -> impl Iterator<Item = (usize, &DataViewSelectTransform)> {
        self.selects
            .iter()
            .enumerate()
            .filter_map(|(i, s)| Some((i, s.as_ref()?)))
    }

    pub fn with_select(mut self, select: DataViewSelectTransform) -> Self {
        self.selects.push(Some(select));
        self
    }

    pub fn with_objects(mut self, objects: DataViewObjectDefinitions) -> Self {
        self.objects = Some(objects);
        self
    }
}

/// Input of [`super::DataViewTransform::apply`].
#[derive(Debug, Clone, Default)]
pub struct DataViewTransformApplyOptions {
    pub prototype: Option<DataView>,
    pub object_descriptors: DataViewObjectDescriptors,
    pub data_view_mappings: Vec<DataViewMapping>,
    pub transforms: Option<DataViewTransforms>,
    pub data_roles: Vec<VisualDataRole>,
}

impl DataViewTransformApplyOptions {
    pub fn new(prototype: DataView, transforms: DataViewTransforms) -> Self {
        Self {
            prototype: Some(prototype),
            transforms: Some(transforms),
            ..Default::default()
        }
    }

    pub fn with_mapping(mut self, mapping: DataViewMapping) -> Self {
        self.data_view_mappings.push(mapping);
        self
    }

    pub fn with_descriptors(mut self, descriptors: DataViewObjectDescriptors) -> Self {
        self.object_descriptors = descriptors;
        self
    }

    pub fn with_role(mut self, role: VisualDataRole) -> Self {
        self.data_roles.push(role);
        self
    }

    pub fn role(&self, name: &str) -> Option<&VisualDataRole> {
        self.data_roles.iter().find(|r| r.name == name)
    }
}
