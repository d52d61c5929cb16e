//! End-to-end tests of the transform pipeline driven by JSON inputs.

use std::sync::Arc;

use dataview::analysis::{
    DataViewCategoricalMapping, DataViewMapping, DataViewRoleMapping, RoleCondition,
    VisualDataRole, VisualDataRoleKind,
};
use dataview::data_view::DataView;
use dataview::format::ValueFormatter;
use dataview::transform::{DataViewTransform, DataViewTransformApplyOptions, DataViewTransforms};
use dataview::types::{DataValue, ValueTypeDescriptor};
use dataview::EngineError;

const PROTOTYPE: &str = r#"{
    "metadata": {"columns": [
        {"displayName": "Region", "index": 0},
        {"displayName": "Store", "index": 1},
        {"displayName": "Sales", "index": 2, "isMeasure": true}
    ]},
    "categorical": {
        "categories": [
            {"source": {"displayName": "Region", "index": 0}, "values": ["East", "West", "West"]},
            {"source": {"displayName": "Store", "index": 1}, "values": ["s1", "s2", "s3"]}
        ],
        "values": {"groups": [{"values": [
            {"source": {"displayName": "Sales", "index": 2, "isMeasure": true}, "values": [10, "n/a", 30]}
        ]}]}
    }
}"#;

const TRANSFORMS: &str = r#"{
    "selects": [
        {"displayName": "Territory", "queryName": "Sales.Region", "roles": {"Category": true}},
        {"displayName": "Outlet", "queryName": "Sales.Store", "roles": {"Category": true}},
        {"displayName": "Revenue", "queryName": "Sum(Sales.Amount)", "roles": {"Y": true}}
    ],
    "roles": {"activeItems": {"Category": ["Sales.Region", "Sales.Store"]}},
    "splits": [
        {"selects": {"0": true, "2": true}},
        {"selects": {"0": true, "1": true, "2": true}}
    ]
}"#;

fn prototype() -> DataView {
    DataView::from_json(PROTOTYPE).unwrap()
}

fn transforms() -> DataViewTransforms {
    DataViewTransforms::from_json(TRANSFORMS).unwrap()
}

fn numeric_y() -> VisualDataRole {
    VisualDataRole::new("Y", VisualDataRoleKind::Measure)
        .with_required_types(vec![ValueTypeDescriptor::numeric()])
}

fn single_category_mapping() -> DataViewMapping {
    DataViewMapping::categorical(DataViewCategoricalMapping {
        categories: Some(DataViewRoleMapping::for_in("Category")),
        values: Some(DataViewRoleMapping::for_in("Y")),
        ..Default::default()
    })
    .with_condition(
        [("Category".to_string(), RoleCondition::range(None, Some(1)))]
            .into_iter()
            .collect(),
    )
}

/// Upper-cases text; everything else prints with `{:?}`.
struct Shouting;

impl ValueFormatter for Shouting {
    fn format(&self, value: &DataValue, _format: Option<&str>) -> String {
        match value {
            DataValue::Text(text) => text.to_uppercase(),
            other => format!("{other:?}"),
        }
    }
}

fn run(transform: &DataViewTransform) -> Vec<DataView> {
    transform.apply(
        DataViewTransformApplyOptions::new(prototype(), transforms())
            .with_mapping(single_category_mapping())
            .with_role(numeric_y()),
    )
}

fn category_values(data_view: &DataView) -> Vec<Vec<DataValue>> {
    data_view
        .categorical
        .as_ref()
        .unwrap()
        .categories
        .iter()
        .flatten()
        .map(|c| c.values.to_vec())
        .collect()
}

#[test]
fn test_one_data_view_per_split() {
    let results = run(&DataViewTransform::default());
    assert_eq!(results.len(), 2);

    // First split: region only.
    assert_eq!(
        category_values(&results[0]),
        vec![vec![DataValue::from("East"), "West".into(), "West".into()]]
    );
    // Second split: region and store merged into one column.
    assert_eq!(
        category_values(&results[1]),
        vec![vec![DataValue::from("East s1"), "West s2".into(), "West s3".into()]]
    );
    let merged = &results[1].categorical.as_ref().unwrap().categories.as_ref().unwrap()[0];
    assert_eq!(merged.source.display_name, "Territory Outlet");
}

#[test]
fn test_values_of_the_wrong_type_are_nulled() {
    let results = run(&DataViewTransform::default());
    for data_view in &results {
        let values = data_view.categorical.as_ref().unwrap().values.as_ref().unwrap();
        let column = values.columns().next().unwrap();
        assert_eq!(column.source.display_name, "Revenue");
        assert_eq!(
            *column.values,
            vec![DataValue::from(10), DataValue::Null, DataValue::from(30)]
        );
    }
    // The prototype still holds the original text value.
    let prototype = prototype();
    let original = prototype.categorical.as_ref().unwrap().values.as_ref().unwrap();
    assert_eq!(original.columns().next().unwrap().values[1], DataValue::from("n/a"));
}

#[test]
fn test_custom_formatter_for_concatenation() {
    let results = run(&DataViewTransform::default().with_formatter(Shouting));
    assert_eq!(
        category_values(&results[1])[0][0],
        DataValue::from("EAST S1")
    );
}

#[test]
fn test_outputs_do_not_alias_each_other() {
    let results = run(&DataViewTransform::default());
    assert!(!Arc::ptr_eq(&results[0].metadata, &results[1].metadata));
    let first = results[0].categorical.as_ref().unwrap();
    let second = results[1].categorical.as_ref().unwrap();
    assert!(!Arc::ptr_eq(first, second));
}

#[test]
fn test_malformed_transforms_json() {
    let error = DataViewTransforms::from_json("{\"selects\": 3}").unwrap_err();
    assert!(matches!(error, EngineError::Json { .. }));
}

#[test]
fn test_data_view_json_round_trip() {
    let data_view = run(&DataViewTransform::default()).remove(1);
    let json = data_view.to_json().unwrap();
    assert_eq!(DataView::from_json(&json).unwrap(), data_view);
}
