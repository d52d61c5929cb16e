//! DataView mappings: how a visual wants its data shaped.
//!
//! A mapping names the shape (categorical, table, single, tree, matrix),
//! binds data roles into it, and states per-role cardinality conditions.
//! A visual declares several mappings; analysis picks the ones the current
//! projections satisfy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::roles::VisualDataRoleKind;
use crate::types::DataValue;

/// `min`/`max` bounds, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl NumberRange {
    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn contains(&self, value: usize) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Per-role condition of a mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<VisualDataRoleKind>,
}

impl RoleCondition {
    pub fn range(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: VisualDataRoleKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// `roleName -> condition`; a mapping applies when any one of its conditions
/// holds.
pub type DataViewMappingCondition = BTreeMap<String, RoleCondition>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<NumberRange>,
}

// =============================================================================
// Role mappings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForRole {
    #[serde(rename = "in")]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRole {
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewGroupingMapping {
    /// Role whose values form the series.
    pub by: String,
    #[serde(default)]
    pub select: Vec<DataViewRoleMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopReduction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReductionAlgorithm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<TopReduction>,
}

/// Binding of roles into one part of a shape. Exactly one of `for_in`,
/// `bind`, `select` and `group` is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewRoleMapping {
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_in: Option<ForRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<BindRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<DataViewRoleMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<DataViewGroupingMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_reduction_algorithm: Option<DataReductionAlgorithm>,
}

impl DataViewRoleMapping {
    pub fn for_in(role: impl Into<String>) -> Self {
        Self {
            for_in: Some(ForRole { role: role.into() }),
            ..Default::default()
        }
    }

    pub fn bind(role: impl Into<String>) -> Self {
        Self {
            bind: Some(BindRole { to: role.into() }),
            ..Default::default()
        }
    }

    pub fn select(items: Vec<DataViewRoleMapping>) -> Self {
        Self {
            select: Some(items),
            ..Default::default()
        }
    }

    pub fn group(by: impl Into<String>, select: Vec<DataViewRoleMapping>) -> Self {
        Self {
            group: Some(DataViewGroupingMapping {
                by: by.into(),
                select,
            }),
            ..Default::default()
        }
    }

    /// Every role this mapping refers to, in declaration order, grouping
    /// role first.
    pub fn roles(&self) -> Vec<&str> {
        let mut roles = Vec::new();
        self.collect_roles(&mut roles);
        roles
    }

    fn collect_roles<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(f) = &self.for_in {
            out.push(&f.role);
        }
        if let Some(b) = &self.bind {
            out.push(&b.to);
        }
        if let Some(group) = &self.group {
            out.push(&group.by);
            for item in &group.select {
                item.collect_roles(out);
            }
        }
        for item in self.select.iter().flatten() {
            item.collect_roles(out);
        }
    }

    /// The series role, when the mapping groups values.
    pub fn grouping_role(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.by.as_str())
    }

    /// The roles bound as values under a grouping.
    pub fn grouped_value_roles(&self) -> Vec<&str> {
        let mut roles = Vec::new();
        for item in self.group.iter().flat_map(|g| &g.select) {
            item.collect_roles(&mut roles);
        }
        roles
    }
}

// =============================================================================
// Shape mappings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewCategoricalMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<DataViewRoleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<DataViewRoleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<RowCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewTableMapping {
    pub rows: DataViewRoleMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<RowCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewSingleMapping {
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewTreeMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<DataViewRoleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<DataViewRoleMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewMatrixMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<DataViewRoleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<DataViewRoleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<DataViewRoleMapping>,
}

/// A style property a mapping depends on. With `value`, the property must
/// equal it; without, it must be set to a truthy value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredProperty {
    pub object_name: String,
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DataValue>,
}

/// Regression-line usage: which roles hold x and y.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewRegressionUsage {
    pub x: DataViewRoleMapping,
    pub y: DataViewRoleMapping,
    /// One line over all series instead of one per series; when absent
    /// the configured default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine_series: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataViewMappingUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression: Option<DataViewRegressionUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMapping {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<DataViewMappingCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_properties: Vec<RequiredProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical: Option<DataViewCategoricalMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<DataViewTableMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<DataViewSingleMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<DataViewTreeMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<DataViewMatrixMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<DataViewMappingUsage>,
}

impl DataViewMapping {
    pub fn categorical(mapping: DataViewCategoricalMapping) -> Self {
        Self {
            categorical: Some(mapping),
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: DataViewMappingCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_required_property(mut self, property: RequiredProperty) -> Self {
        self.required_properties.push(property);
        self
    }

    pub fn regression(&self) -> Option<&DataViewRegressionUsage> {
        self.usage.as_ref()?.regression.as_ref()
    }

    /// Max categories allowed for `role`: the smallest `max` any condition
    /// states for it, or `None` when unbounded.
    pub fn max_for_role(&self, role: &str) -> Option<usize> {
        self.conditions
            .iter()
            .filter_map(|c| c.get(role)?.max)
            .min()
    }
}
