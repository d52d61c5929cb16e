//! Integration tests for categorical pivots through the transform pipeline.

use std::sync::Arc;

use dataview::analysis::{DataViewCategoricalMapping, DataViewMapping, DataViewRoleMapping};
use dataview::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewScopeIdentity, DataViewValueColumn, DataViewValueColumns,
};
use dataview::sqexpr::{SQExprBuilder, SQExprRef};
use dataview::transform::{
    unpivot_categorical, DataViewSelectTransform, DataViewTransform,
    DataViewTransformApplyOptions, DataViewTransforms,
};
use dataview::types::{DataValue, ValueType};

const REGIONS: [&str; 3] = ["East", "West", "North"];

fn region_field() -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Region")
}

fn prototype() -> DataView {
    let region = Arc::new(DataViewMetadataColumn::new("Region").with_index(0));
    let amount = Arc::new(DataViewMetadataColumn::new("Amount").with_index(1).measure());
    let identities = REGIONS
        .iter()
        .map(|name| {
            DataViewScopeIdentity::from_field_value(&region_field(), &(*name).into(), ValueType::text())
        })
        .collect();
    DataView::new(DataViewMetadata {
        columns: vec![region.clone(), amount.clone()],
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            region,
            REGIONS.iter().map(|n| DataValue::from(*n)).collect(),
        )
        .with_identity(identities, vec![region_field()])]),
        values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
            amount,
            vec![10.into(), 20.into(), 30.into()],
        )])),
    })
}

fn transforms(region_roles: &[&str]) -> DataViewTransforms {
    let mut region = DataViewSelectTransform::new("Region", "Sales.Region");
    for role in region_roles {
        region = region.with_role(*role);
    }
    DataViewTransforms::default()
        .with_select(region)
        .with_select(DataViewSelectTransform::new("Amount", "Sum(Sales.Amount)").with_role("Y"))
}

fn series_mapping() -> DataViewMapping {
    DataViewMapping::categorical(DataViewCategoricalMapping {
        categories: Some(DataViewRoleMapping::for_in("Category")),
        values: Some(DataViewRoleMapping::group(
            "Series",
            vec![DataViewRoleMapping::for_in("Y")],
        )),
        ..Default::default()
    })
}

fn run(region_roles: &[&str], mappings: Vec<DataViewMapping>) -> Vec<DataView> {
    let mut options = DataViewTransformApplyOptions::new(prototype(), transforms(region_roles));
    for mapping in mappings {
        options = options.with_mapping(mapping);
    }
    DataViewTransform::default().apply(options)
}

#[test]
fn test_series_only_category_is_pivoted() {
    let results = run(&["Series"], vec![series_mapping()]);
    let categorical = results[0].categorical.as_ref().unwrap();
    assert!(categorical.categories.is_none());

    let values = categorical.values.as_ref().unwrap();
    let names: Vec<_> = values.groups.iter().map(|g| g.name.clone().unwrap()).collect();
    assert_eq!(names, REGIONS.iter().map(|n| DataValue::from(*n)).collect::<Vec<_>>());
    assert_eq!(values.source.as_ref().unwrap().display_name, "Region");
    assert_eq!(*values.groups[2].values[0].values, vec![DataValue::from(30)]);
    assert!(values.groups[0].identity.is_some());
    // One metadata column per series, tagged with its group name.
    let grouped: Vec<_> = results[0]
        .metadata
        .columns
        .iter()
        .filter_map(|c| c.group_name.clone())
        .collect();
    assert_eq!(grouped.len(), 3);
}

#[test]
fn test_category_and_series_is_self_cross_joined() {
    let results = run(&["Series", "Category"], vec![series_mapping()]);
    let categorical = results[0].categorical.as_ref().unwrap();
    assert_eq!(categorical.row_count(), 3);

    let values = categorical.values.as_ref().unwrap();
    assert_eq!(values.groups.len(), 3);
    assert_eq!(
        *values.groups[1].values[0].values,
        vec![DataValue::Null, DataValue::from(20), DataValue::Null]
    );
}

#[test]
fn test_unpivot_inverts_the_pivot() {
    let pivoted = run(&["Series"], vec![series_mapping()]).remove(0);
    let plain = run(&["Series"], Vec::new()).remove(0);

    let restored = unpivot_categorical(&pivoted).unwrap();
    assert_eq!(restored, plain);
    // Already unpivoted shapes are left alone.
    assert!(unpivot_categorical(&plain).is_none());
}

#[test]
fn test_no_pivot_with_several_mappings() {
    let results = run(&["Series"], vec![series_mapping(), series_mapping()]);
    let categorical = results[0].categorical.as_ref().unwrap();
    assert!(categorical.categories.is_some());
    assert!(!categorical.values.as_ref().unwrap().is_grouped());
}

#[test]
fn test_prototype_is_not_modified() {
    let prototype = prototype();
    let snapshot = prototype.clone();
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(prototype.clone(), transforms(&["Series"]))
            .with_mapping(series_mapping()),
    );

    assert_eq!(prototype, snapshot);
    assert!(!Arc::ptr_eq(
        results[0].categorical.as_ref().unwrap(),
        prototype.categorical.as_ref().unwrap()
    ));
    assert!(prototype.metadata.columns.iter().all(|c| c.roles.is_empty()));
}
