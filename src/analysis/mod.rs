//! DataView analysis: does a DataView fit a visual's mappings, and which
//! mappings do the current projections satisfy.
//!
//! Findings are data, not errors. [`choose_data_view_mappings`] reports
//! every failed condition as a [`DataViewMappingMatchError`];
//! [`validate_and_reshape`] returns `is_valid: false` when no mapping fits
//! even after trimming.

pub mod mapping;
pub mod projections;
pub mod roles;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisSettings;
use crate::data_view::{DataView, DataViewCategorical, DataViewTable};
use crate::objects::{static_property_value, DataViewObjectDefinitions, DataViewObjectDescriptors};

pub use mapping::{
    DataViewCategoricalMapping, DataViewGroupingMapping, DataViewMapping, DataViewMappingCondition,
    DataViewMappingUsage, DataViewMatrixMapping, DataViewRegressionUsage, DataViewRoleMapping,
    DataViewSingleMapping, DataViewTableMapping, DataViewTreeMapping, NumberRange,
    RequiredProperty, RoleCondition, RowCount,
};
pub use projections::{
    count_roles, projections_from_selects, QueryProjection, QueryProjectionCollection,
    QueryProjectionsByRole,
};
pub use roles::{
    role_kinds_from_metadata, CartesianRoleKind, RoleKindByQueryRef, VisualDataRole,
    VisualDataRoleKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataViewMappingMatchErrorCode {
    ConditionRangeTooLarge,
    ConditionRangeTooSmall,
    ConditionKindExpectedMeasure,
    ConditionKindExpectedGrouping,
    ConditionKindExpectedGroupingOrMeasure,
}

/// One failed condition of one mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMappingMatchError {
    pub mapping_index: usize,
    pub condition_index: usize,
    pub role_name: String,
    pub code: DataViewMappingMatchErrorCode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMappingResult {
    pub supported_mappings: Vec<DataViewMapping>,
    pub mapping_errors: Vec<DataViewMappingMatchError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateAndReshapeResult {
    /// The DataView to hand to the visual: unchanged, trimmed, or `None`
    /// when no mapping fits.
    pub data_view: Option<DataView>,
    pub is_valid: bool,
}

// =============================================================================
// Range and kind checks
// =============================================================================

/// Check `value` against a role condition's bounds. With `ignore_max`, only
/// the lower bound applies (drilled roles).
pub fn validate_range(
    value: usize,
    condition: &RoleCondition,
    ignore_max: bool,
) -> Option<DataViewMappingMatchErrorCode> {
    if condition.min.is_some_and(|min| value < min) {
        return Some(DataViewMappingMatchErrorCode::ConditionRangeTooSmall);
    }
    if !ignore_max && condition.max.is_some_and(|max| value > max) {
        return Some(DataViewMappingMatchErrorCode::ConditionRangeTooLarge);
    }
    None
}

fn validate_kind(
    condition: &RoleCondition,
    role_name: &str,
    projections: &QueryProjectionsByRole,
    role_kinds: &RoleKindByQueryRef,
) -> Option<DataViewMappingMatchErrorCode> {
    let expected = condition.kind?;
    let collection = projections.get(role_name)?;
    let mismatch = collection
        .items
        .iter()
        .any(|p| role_kinds.get(&p.query_ref) != Some(&expected));
    if !mismatch {
        return None;
    }
    Some(match expected {
        VisualDataRoleKind::Measure => DataViewMappingMatchErrorCode::ConditionKindExpectedMeasure,
        VisualDataRoleKind::Grouping => DataViewMappingMatchErrorCode::ConditionKindExpectedGrouping,
        VisualDataRoleKind::GroupingOrMeasure => {
            DataViewMappingMatchErrorCode::ConditionKindExpectedGroupingOrMeasure
        }
    })
}

/// Errors of one condition, with indices left at zero for the caller to fill.
fn condition_errors(
    projections: &QueryProjectionsByRole,
    condition: &DataViewMappingCondition,
    role_kinds: &RoleKindByQueryRef,
) -> Vec<DataViewMappingMatchError> {
    let mut errors = Vec::new();
    for (role_name, role_condition) in condition {
        let drillable = projections.get(role_name).is_some_and(|p| p.is_drillable());
        let count = count_roles(&[role_name.as_str()], projections);

        let codes = [
            validate_range(count, role_condition, drillable),
            validate_kind(role_condition, role_name, projections, role_kinds),
        ];
        for code in codes.into_iter().flatten() {
            errors.push(DataViewMappingMatchError {
                mapping_index: 0,
                condition_index: 0,
                role_name: role_name.clone(),
                code,
            });
        }
    }
    errors
}

fn required_properties_hold(
    required: &[RequiredProperty],
    descriptors: &DataViewObjectDescriptors,
    definitions: Option<&DataViewObjectDefinitions>,
) -> bool {
    required.iter().all(|property| {
        if descriptors
            .property(&property.object_name, &property.property_name)
            .is_none()
        {
            return false;
        }
        let actual = definitions.and_then(|d| {
            static_property_value(d, &property.object_name, &property.property_name)
        });
        match (&property.value, actual) {
            (Some(expected), Some(actual)) => *expected == actual,
            (Some(_), None) => false,
            (None, actual) => actual.is_some_and(|v| v.is_truthy()),
        }
    })
}

/// Filter `mappings` down to those the projections satisfy.
///
/// A mapping without conditions is satisfied by any projections; otherwise
/// at least one condition must hold. Its required properties must hold in
/// either case. Every failed role check is recorded with its mapping and
/// condition index.
pub fn choose_data_view_mappings(
    projections: &QueryProjectionsByRole,
    mappings: &[DataViewMapping],
    role_kinds: &RoleKindByQueryRef,
    descriptors: &DataViewObjectDescriptors,
    definitions: Option<&DataViewObjectDefinitions>,
) -> DataViewMappingResult {
    let mut result = DataViewMappingResult::default();

    for (mapping_index, mapping) in mappings.iter().enumerate() {
        let properties_hold =
            required_properties_hold(&mapping.required_properties, descriptors, definitions);

        let mut any_condition_met = mapping.conditions.is_empty();
        for (condition_index, condition) in mapping.conditions.iter().enumerate() {
            let errors = condition_errors(projections, condition, role_kinds);
            if errors.is_empty() {
                any_condition_met = true;
            }
            result
                .mapping_errors
                .extend(errors.into_iter().map(|e| DataViewMappingMatchError {
                    mapping_index,
                    condition_index,
                    ..e
                }));
        }

        if any_condition_met && properties_hold {
            result.supported_mappings.push(mapping.clone());
        }
    }

    debug!(
        supported = result.supported_mappings.len(),
        errors = result.mapping_errors.len(),
        "chose DataView mappings"
    );
    result
}

// =============================================================================
// Support and reshaping
// =============================================================================

fn row_count_range(row_count: Option<&RowCount>, use_preferred: bool) -> Option<NumberRange> {
    let row_count = row_count?;
    if use_preferred && row_count.preferred.is_some() {
        return row_count.preferred;
    }
    row_count.supported
}

/// Whether `data_view` already has every shape the mapping asks for, with
/// row counts inside the mapping's bounds.
pub fn supports(data_view: &DataView, mapping: &DataViewMapping, use_preferred: bool) -> bool {
    if let Some(categorical_mapping) = &mapping.categorical {
        let Some(categorical) = &data_view.categorical else {
            return false;
        };
        if let Some(range) = row_count_range(categorical_mapping.row_count.as_ref(), use_preferred) {
            if !range.contains(categorical.row_count()) {
                return false;
            }
        }
    }
    if let Some(table_mapping) = &mapping.table {
        let Some(table) = &data_view.table else {
            return false;
        };
        if let Some(range) = row_count_range(table_mapping.row_count.as_ref(), use_preferred) {
            if !range.contains(table.row_count()) {
                return false;
            }
        }
    }
    if mapping.single.is_some() && data_view.single.is_none() {
        return false;
    }
    if mapping.tree.is_some() && data_view.tree.is_none() {
        return false;
    }
    if mapping.matrix.is_some() && data_view.matrix.is_none() {
        return false;
    }
    true
}

/// [`validate_and_reshape_with`] under default settings.
pub fn validate_and_reshape(
    data_view: &DataView,
    mappings: &[DataViewMapping],
) -> ValidateAndReshapeResult {
    validate_and_reshape_with(data_view, mappings, &AnalysisSettings::default())
}

/// Try each mapping in order: return the DataView unchanged if it already
/// fits one, otherwise the first reshape (trimming rows to the mapping's
/// supported maximum) that fits.
pub fn validate_and_reshape_with(
    data_view: &DataView,
    mappings: &[DataViewMapping],
    settings: &AnalysisSettings,
) -> ValidateAndReshapeResult {
    if mappings.is_empty() {
        return ValidateAndReshapeResult {
            data_view: Some(data_view.clone()),
            is_valid: true,
        };
    }

    for mapping in mappings {
        if supports(data_view, mapping, false) {
            return ValidateAndReshapeResult {
                data_view: Some(data_view.clone()),
                is_valid: true,
            };
        }
        if !settings.trim_to_supported_row_count {
            continue;
        }
        if let Some(reshaped) = reshape(data_view, mapping) {
            if supports(&reshaped, mapping, false) {
                return ValidateAndReshapeResult {
                    data_view: Some(reshaped),
                    is_valid: true,
                };
            }
        }
    }

    ValidateAndReshapeResult {
        data_view: None,
        is_valid: false,
    }
}

fn reshape(data_view: &DataView, mapping: &DataViewMapping) -> Option<DataView> {
    let mut reshaped = data_view.clone();
    let mut changed = false;

    if let (Some(categorical_mapping), Some(categorical)) =
        (&mapping.categorical, reshaped.categorical.as_mut())
    {
        let max = categorical_mapping
            .row_count
            .as_ref()
            .and_then(|r| r.supported)
            .and_then(|r| r.max);
        if let Some(max) = max {
            if categorical.row_count() > max {
                debug!(from = categorical.row_count(), to = max, "trimming categorical rows");
                trim_categorical(Arc::make_mut(categorical), max);
                changed = true;
            }
        }
    }

    if let (Some(table_mapping), Some(table)) = (&mapping.table, reshaped.table.as_mut()) {
        let max = table_mapping
            .row_count
            .as_ref()
            .and_then(|r| r.supported)
            .and_then(|r| r.max);
        if let Some(max) = max {
            if table.row_count() > max {
                debug!(from = table.row_count(), to = max, "trimming table rows");
                trim_table(Arc::make_mut(table), max);
                changed = true;
            }
        }
    }

    changed.then_some(reshaped)
}

fn truncated<T: Clone>(values: &Arc<Vec<T>>, len: usize) -> Arc<Vec<T>> {
    Arc::new(values.iter().take(len).cloned().collect())
}

fn trim_categorical(categorical: &mut DataViewCategorical, max: usize) {
    for category in categorical.categories.iter_mut().flatten() {
        category.values = truncated(&category.values, max);
        if let Some(identity) = &category.identity {
            category.identity = Some(truncated(identity, max));
        }
        if let Some(objects) = &mut category.objects {
            objects.truncate(max);
        }
    }
    for column in categorical.values.iter_mut().flat_map(|v| v.columns_mut()) {
        column.values = truncated(&column.values, max);
        if let Some(highlights) = &column.highlights {
            column.highlights = Some(truncated(highlights, max));
        }
        if let Some(objects) = &mut column.objects {
            objects.truncate(max);
        }
    }
}

fn trim_table(table: &mut DataViewTable, max: usize) {
    table.rows.truncate(max);
    if let Some(identity) = &mut table.identity {
        identity.truncate(max);
    }
    if let Some(objects) = &mut table.row_objects {
        objects.truncate(max);
    }
}
