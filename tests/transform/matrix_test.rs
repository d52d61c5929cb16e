//! Integration tests for matrix and table reshaping through the transform
//! pipeline.

use std::sync::Arc;

use dataview::analysis::{
    DataViewCategoricalMapping, DataViewMapping, DataViewMatrixMapping, DataViewRoleMapping,
};
use dataview::data_view::{
    DataView, DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrix, DataViewMatrixNode,
    DataViewMatrixNodeValue, DataViewMetadata, DataViewMetadataColumn, DataViewTable,
};
use dataview::transform::{
    DataViewRoleTransform, DataViewSelectTransform, DataViewTransform,
    DataViewTransformApplyOptions, DataViewTransforms,
};
use dataview::types::DataValue;

fn cell(value: f64) -> [(usize, DataViewMatrixNodeValue); 1] {
    [(0, DataViewMatrixNodeValue::new(value.into()))]
}

fn measure_header_columns(sales: &Arc<DataViewMetadataColumn>) -> DataViewHierarchy {
    DataViewHierarchy::new(
        DataViewMatrixNode::default().with_children(vec![DataViewMatrixNode {
            level: Some(0),
            level_source_index: Some(0),
            ..Default::default()
        }]),
        vec![DataViewHierarchyLevel::new(vec![Arc::clone(sales)])],
    )
}

/// Region > Year rows with one measure on the columns. No roles yet; those
/// come from the select transforms.
fn two_level_matrix() -> DataView {
    let region = Arc::new(DataViewMetadataColumn::new("Region").with_index(0));
    let year = Arc::new(DataViewMetadataColumn::new("Year").with_index(1));
    let sales = Arc::new(DataViewMetadataColumn::new("Sales").with_index(2).measure());

    let rows = DataViewMatrixNode::default().with_children(vec![
        DataViewMatrixNode::leaf(0, "East".into()).with_children(vec![
            DataViewMatrixNode::leaf(1, 2020.into()).with_values(cell(1.0)),
            DataViewMatrixNode::leaf(1, 2021.into()).with_values(cell(2.0)),
        ]),
        DataViewMatrixNode::leaf(0, "West".into()).with_children(vec![
            DataViewMatrixNode::leaf(1, 2021.into()).with_values(cell(3.0)),
        ]),
    ]);
    DataView::new(DataViewMetadata {
        columns: vec![region.clone(), year.clone(), sales.clone()],
        objects: None,
    })
    .with_matrix(DataViewMatrix {
        rows: DataViewHierarchy::new(
            rows,
            vec![
                DataViewHierarchyLevel::new(vec![region]),
                DataViewHierarchyLevel::new(vec![year]),
            ],
        ),
        columns: measure_header_columns(&sales),
        value_sources: vec![sales],
    })
}

// ============================================================================
// Matrix unpivot
// ============================================================================

#[test]
fn test_row_matrix_becomes_series_categorical() {
    let transforms = DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Territory", "Sales.Region").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Year", "Date.Year").with_role("Series"))
        .with_select(DataViewSelectTransform::new("Sales", "Sum(Sales.Amount)").with_role("Y"));
    let mapping = DataViewMapping::categorical(DataViewCategoricalMapping {
        categories: Some(DataViewRoleMapping::for_in("Category")),
        values: Some(DataViewRoleMapping::group(
            "Series",
            vec![DataViewRoleMapping::for_in("Y")],
        )),
        ..Default::default()
    });
    let prototype = two_level_matrix();
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(prototype.clone(), transforms).with_mapping(mapping),
    );

    let data_view = &results[0];
    assert!(data_view.matrix.is_none());
    let categorical = data_view.categorical.as_ref().unwrap();
    let category = &categorical.categories.as_ref().unwrap()[0];
    assert_eq!(category.source.display_name, "Territory");
    assert_eq!(*category.values, vec![DataValue::from("East"), "West".into()]);

    let values = categorical.values.as_ref().unwrap();
    assert_eq!(values.source.as_ref().unwrap().display_name, "Year");
    assert_eq!(values.groups.len(), 2);
    assert_eq!(*values.groups[0].values[0].values, vec![DataValue::from(1.0), DataValue::Null]);
    assert_eq!(*values.groups[1].values[0].values, vec![DataValue::from(2.0), 3.0.into()]);

    // The prototype keeps its matrix.
    assert!(prototype.matrix.is_some());
    assert!(prototype.categorical.is_none());
}

// ============================================================================
// Matrix pivot
// ============================================================================

#[test]
fn test_rows_bound_to_columns_are_pivoted() {
    let year = Arc::new(DataViewMetadataColumn::new("Year").with_index(0));
    let sales = Arc::new(DataViewMetadataColumn::new("Sales").with_index(1).measure());
    let rows = DataViewMatrixNode::default().with_children(vec![
        DataViewMatrixNode::leaf(0, 2020.into()).with_values(cell(10.0)),
        DataViewMatrixNode::leaf(0, 2021.into()).with_values(cell(20.0)),
    ]);
    let prototype = DataView::new(DataViewMetadata {
        columns: vec![year.clone(), sales.clone()],
        objects: None,
    })
    .with_matrix(DataViewMatrix {
        rows: DataViewHierarchy::new(rows, vec![DataViewHierarchyLevel::new(vec![year])]),
        columns: measure_header_columns(&sales),
        value_sources: vec![sales],
    });

    let transforms = DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Year", "Date.Year").with_role("Columns"))
        .with_select(DataViewSelectTransform::new("Sales", "Sum(Sales.Amount)").with_role("Values"));
    let mapping = DataViewMapping {
        matrix: Some(DataViewMatrixMapping {
            rows: Some(DataViewRoleMapping::for_in("Rows")),
            columns: Some(DataViewRoleMapping::for_in("Columns")),
            values: Some(DataViewRoleMapping::for_in("Values")),
        }),
        ..Default::default()
    };
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(prototype.clone(), transforms).with_mapping(mapping),
    );

    let matrix = results[0].matrix.as_ref().unwrap();
    assert!(matrix.rows.levels.is_empty());
    assert_eq!(matrix.columns.levels[0].sources[0].display_name, "Year");
    let leaves: Vec<_> = matrix
        .columns
        .leaves()
        .iter()
        .filter_map(|n| n.value.clone())
        .collect();
    assert_eq!(leaves, vec![DataValue::from(2020), 2021.into()]);
    let cells: Vec<_> = matrix
        .rows
        .root
        .values
        .iter()
        .flatten()
        .map(|(k, v)| (*k, v.value.clone()))
        .collect();
    assert_eq!(cells, vec![(0, 10.0.into()), (1, 20.0.into())]);

    // The prototype rows are untouched.
    assert_eq!(prototype.matrix.as_ref().unwrap().rows.root.children().len(), 2);
}

// ============================================================================
// Projection order
// ============================================================================

#[test]
fn test_table_columns_follow_projection_order() {
    let a = Arc::new(DataViewMetadataColumn::new("A").with_index(0));
    let b = Arc::new(DataViewMetadataColumn::new("B").with_index(1));
    let key = Arc::new(DataViewMetadataColumn::new("Key").with_index(2));
    let prototype = DataView::new(DataViewMetadata {
        columns: vec![a.clone(), key.clone(), b.clone()],
        objects: None,
    })
    .with_table(DataViewTable::new(
        vec![a, key, b],
        vec![vec![1.into(), "k".into(), 2.into()]],
    ));

    let mut transforms = DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("A", "T.A").with_role("Values"))
        .with_select(DataViewSelectTransform::new("B", "T.B").with_role("Values"))
        .with_select(DataViewSelectTransform::new("Key", "T.Key").with_role("Rows"));
    transforms.roles = Some(DataViewRoleTransform {
        ordering: [("Values".to_string(), vec![1, 0])].into_iter().collect(),
        ..Default::default()
    });

    let results = DataViewTransform::default()
        .apply(DataViewTransformApplyOptions::new(prototype.clone(), transforms));
    let table = results[0].table.as_ref().unwrap();
    let names: Vec<_> = table.columns.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, vec!["B", "Key", "A"]);
    assert_eq!(
        *table.rows[0],
        vec![DataValue::from(2), "k".into(), DataValue::from(1)]
    );

    let original = prototype.table.as_ref().unwrap();
    assert_eq!(*original.rows[0], vec![DataValue::from(1), "k".into(), DataValue::from(2)]);
}
