//! Integration tests for mapping selection and DataView reshaping.

use std::sync::Arc;

use dataview::analysis::{
    choose_data_view_mappings, projections_from_selects, role_kinds_from_metadata,
    validate_and_reshape, DataViewCategoricalMapping, DataViewMapping,
    DataViewMappingMatchErrorCode, DataViewRoleMapping, DataViewTableMapping, NumberRange,
    RequiredProperty, RoleCondition, RowCount, VisualDataRoleKind,
};
use dataview::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewValueColumn, DataViewValueColumns,
};
use dataview::objects::{
    DataViewObjectDefinition, DataViewObjectDefinitions, DataViewObjectDescriptors,
    DataViewObjectPropertyDefinition, DataViewObjectPropertyDescriptor,
};
use dataview::transform::{DataViewRoleTransform, DataViewSelectTransform, DataViewTransforms};
use dataview::types::{DataValue, PropertyTypeDescriptor, ValueTypeDescriptor};

fn metadata() -> DataViewMetadata {
    DataViewMetadata::new(vec![
        DataViewMetadataColumn::new("Year").with_query_name("Date.Year"),
        DataViewMetadataColumn::new("Month").with_query_name("Date.Month"),
        DataViewMetadataColumn::new("Amount")
            .with_query_name("Sum(Sales.Amount)")
            .measure(),
    ])
}

fn transforms() -> DataViewTransforms {
    DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Year", "Date.Year").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Month", "Date.Month").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Amount", "Sum(Sales.Amount)").with_role("Y"))
}

fn mapping(max_categories: usize) -> DataViewMapping {
    DataViewMapping::categorical(DataViewCategoricalMapping {
        categories: Some(DataViewRoleMapping::for_in("Category")),
        values: Some(DataViewRoleMapping::for_in("Y")),
        ..Default::default()
    })
    .with_condition(
        [
            ("Category".to_string(), RoleCondition::range(None, Some(max_categories))),
            (
                "Y".to_string(),
                RoleCondition::range(Some(1), None).with_kind(VisualDataRoleKind::Measure),
            ),
        ]
        .into_iter()
        .collect(),
    )
}

fn show_descriptors() -> DataViewObjectDescriptors {
    DataViewObjectDescriptors::default().with_property(
        "general",
        "show",
        DataViewObjectPropertyDescriptor::new(PropertyTypeDescriptor::Value(
            ValueTypeDescriptor::boolean(),
        )),
    )
}

fn show(value: bool) -> DataViewObjectDefinitions {
    [(
        "general".to_string(),
        vec![DataViewObjectDefinition::new(None)
            .with_property("show", DataViewObjectPropertyDefinition::Value(value.into()))],
    )]
    .into_iter()
    .collect()
}

fn categorical_rows(rows: usize) -> DataView {
    let category = Arc::new(DataViewMetadataColumn::new("Id").with_index(0));
    let value = Arc::new(DataViewMetadataColumn::new("Value").with_index(1).measure());
    DataView::new(DataViewMetadata {
        columns: vec![category.clone(), value.clone()],
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            category,
            (0..rows).map(|i| DataValue::from(i as i64)).collect(),
        )]),
        values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
            value,
            (0..rows).map(|i| DataValue::from(i as f64 * 2.0)).collect(),
        )])),
    })
}

fn row_limited(max: usize) -> DataViewMapping {
    DataViewMapping::categorical(DataViewCategoricalMapping {
        row_count: Some(RowCount {
            supported: Some(NumberRange::at_most(max)),
            preferred: None,
        }),
        ..Default::default()
    })
}

// ============================================================================
// Mapping selection
// ============================================================================

#[test]
fn test_range_conditions_pick_mappings() {
    let transforms = transforms();
    let projections = projections_from_selects(&transforms);
    let role_kinds = role_kinds_from_metadata(&metadata());
    let mappings = vec![mapping(1), mapping(2)];

    let result = choose_data_view_mappings(
        &projections,
        &mappings,
        &role_kinds,
        &DataViewObjectDescriptors::default(),
        None,
    );
    assert_eq!(result.supported_mappings, vec![mapping(2)]);
    assert_eq!(result.mapping_errors.len(), 1);
    let error = &result.mapping_errors[0];
    assert_eq!(error.mapping_index, 0);
    assert_eq!(error.condition_index, 0);
    assert_eq!(error.role_name, "Category");
    assert_eq!(error.code, DataViewMappingMatchErrorCode::ConditionRangeTooLarge);
}

#[test]
fn test_drilled_roles_ignore_max() {
    let mut transforms = transforms();
    transforms.roles = Some(DataViewRoleTransform {
        active_items: [("Category".to_string(), vec!["Date.Year".to_string()])]
            .into_iter()
            .collect(),
        ..Default::default()
    });
    let projections = projections_from_selects(&transforms);
    let result = choose_data_view_mappings(
        &projections,
        &[mapping(1)],
        &role_kinds_from_metadata(&metadata()),
        &DataViewObjectDescriptors::default(),
        None,
    );
    assert_eq!(result.supported_mappings.len(), 1);
    assert!(result.mapping_errors.is_empty());
}

#[test]
fn test_kind_conditions() {
    // Bind a grouping column to the measure role.
    let transforms = DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Year", "Date.Year").with_role("Y"));
    let result = choose_data_view_mappings(
        &projections_from_selects(&transforms),
        &[mapping(1)],
        &role_kinds_from_metadata(&metadata()),
        &DataViewObjectDescriptors::default(),
        None,
    );
    assert!(result.supported_mappings.is_empty());
    assert_eq!(
        result.mapping_errors[0].code,
        DataViewMappingMatchErrorCode::ConditionKindExpectedMeasure
    );
}

#[test]
fn test_required_properties() {
    let transforms = transforms();
    let projections = projections_from_selects(&transforms);
    let role_kinds = role_kinds_from_metadata(&metadata());
    let required = mapping(2).with_required_property(RequiredProperty {
        object_name: "general".to_string(),
        property_name: "show".to_string(),
        value: None,
    });
    let mappings = [required];
    let choose = |definitions: Option<&DataViewObjectDefinitions>, descriptors: &DataViewObjectDescriptors| {
        choose_data_view_mappings(&projections, &mappings, &role_kinds, descriptors, definitions)
            .supported_mappings
            .len()
    };

    assert_eq!(choose(Some(&show(true)), &show_descriptors()), 1);
    assert_eq!(choose(Some(&show(false)), &show_descriptors()), 0);
    assert_eq!(choose(None, &show_descriptors()), 0);
    // Without a descriptor the property cannot be set.
    assert_eq!(choose(Some(&show(true)), &DataViewObjectDescriptors::default()), 0);
}

// ============================================================================
// Validation and reshaping
// ============================================================================

#[test]
fn test_reshape_trims_to_supported_row_count() {
    let data_view = categorical_rows(150);
    let result = validate_and_reshape(&data_view, &[row_limited(100)]);
    assert!(result.is_valid);

    let categorical = result.data_view.unwrap().categorical.unwrap();
    assert_eq!(categorical.row_count(), 100);
    let values = categorical.values.as_ref().unwrap();
    assert_eq!(values.columns().next().unwrap().values.len(), 100);

    // The input keeps all of its rows.
    assert_eq!(data_view.categorical.as_ref().unwrap().row_count(), 150);
}

#[test]
fn test_fitting_data_view_is_returned_unchanged() {
    let data_view = categorical_rows(10);
    let result = validate_and_reshape(&data_view, &[row_limited(100)]);
    assert!(result.is_valid);
    let returned = result.data_view.unwrap();
    assert!(Arc::ptr_eq(
        returned.categorical.as_ref().unwrap(),
        data_view.categorical.as_ref().unwrap()
    ));
}

#[test]
fn test_missing_shape_is_invalid() {
    let table_only = DataViewMapping {
        table: Some(DataViewTableMapping::default()),
        ..Default::default()
    };
    let result = validate_and_reshape(&categorical_rows(3), &[table_only]);
    assert!(!result.is_valid);
    assert!(result.data_view.is_none());

    let result = validate_and_reshape(&categorical_rows(3), &[]);
    assert!(result.is_valid);
}
