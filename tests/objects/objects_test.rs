//! Integration tests for object evaluation through the transform pipeline.

use std::sync::Arc;

use dataview::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewColumnAggregates,
    DataViewHierarchy, DataViewHierarchyLevel, DataViewMatrix, DataViewMatrixNode,
    DataViewMetadata, DataViewMetadataColumn, DataViewRoleWildcard, DataViewScopeIdentity,
    DataViewScopeWildcard, DataViewTree, DataViewTreeNode, DataViewValueColumn,
    DataViewValueColumns, Fill,
};
use dataview::objects::{
    DataRepetitionSelector, DataViewObjectDefinition, DataViewObjectDefinitions,
    DataViewObjectDescriptors, DataViewObjectPropertyDefinition, DataViewObjectPropertyDescriptor,
    Selector,
};
use dataview::sqexpr::{FillRule, RuleColorStop, SQExprBuilder, SQExprRef};
use dataview::transform::{
    DataViewSelectTransform, DataViewTransform, DataViewTransformApplyOptions, DataViewTransforms,
};
use dataview::types::{PropertyTypeDescriptor, StructuralType, ValueType, ValueTypeDescriptor};

fn field(name: &str) -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), name)
}

fn region(value: &str) -> DataViewScopeIdentity {
    DataViewScopeIdentity::from_field_value(&field("Region"), &value.into(), ValueType::text())
}

fn descriptors() -> DataViewObjectDescriptors {
    DataViewObjectDescriptors::default()
        .with_property(
            "dataPoint",
            "fill",
            DataViewObjectPropertyDescriptor::structural(StructuralType::Fill),
        )
        .with_property(
            "general",
            "show",
            DataViewObjectPropertyDescriptor::new(PropertyTypeDescriptor::Value(
                ValueTypeDescriptor::boolean(),
            )),
        )
}

fn categorical_prototype() -> DataView {
    let region_column = Arc::new(
        DataViewMetadataColumn::new("Region")
            .with_index(0)
            .with_expr(field("Region")),
    );
    let amount = Arc::new(
        DataViewMetadataColumn::new("Amount")
            .with_index(1)
            .with_expr(field("Amount"))
            .with_aggregates(DataViewColumnAggregates {
                min: Some(0.0),
                max: Some(10.0),
                ..Default::default()
            })
            .measure(),
    );
    DataView::new(DataViewMetadata {
        columns: vec![region_column.clone(), amount.clone()],
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            region_column,
            vec!["East".into(), "West".into()],
        )
        .with_identity(vec![region("East"), region("West")], vec![field("Region")])]),
        values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
            amount,
            vec![0.into(), 10.into()],
        )])),
    })
}

fn selects() -> DataViewTransforms {
    DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Region", "Sales.Region").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Amount", "Sum(Sales.Amount)").with_role("Y"))
}

fn gradient_by_amount() -> DataViewObjectPropertyDefinition {
    DataViewObjectPropertyDefinition::Expr(SQExprBuilder::fill_rule(
        field("Amount"),
        FillRule::two_stop(
            RuleColorStop {
                color: SQExprBuilder::text("#000000"),
                value: None,
            },
            RuleColorStop {
                color: SQExprBuilder::text("#ffffff"),
                value: None,
            },
        ),
    ))
}

fn run(prototype: DataView, transforms: DataViewTransforms) -> Vec<DataView> {
    DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(prototype, transforms).with_descriptors(descriptors()),
    )
}

fn fill_of(objects: &dataview::data_view::DataViewObjects) -> Option<&Fill> {
    objects.property("dataPoint", "fill").and_then(|p| p.as_fill())
}

#[test]
fn test_value_points_colored_by_fill_rule() {
    let mut definitions = DataViewObjectDefinitions::new();
    definitions.insert(
        "dataPoint".to_string(),
        vec![DataViewObjectDefinition::new(Some(Selector::with_data(vec![
            DataRepetitionSelector::ScopeWildcard(DataViewScopeWildcard::new(vec![field("Region")])),
            DataRepetitionSelector::RoleWildcard(DataViewRoleWildcard::new(vec!["Y".to_string()])),
        ])))
        .with_property("fill", gradient_by_amount())],
    );
    let prototype = categorical_prototype();
    let results = run(prototype.clone(), selects().with_objects(definitions));

    let categorical = results[0].categorical.as_ref().unwrap();
    let column = categorical.values.as_ref().unwrap().columns().next().unwrap();
    let points = column.objects.as_ref().unwrap();
    assert_eq!(fill_of(&points[0]), Some(&Fill::solid("#000000")));
    assert_eq!(fill_of(&points[1]), Some(&Fill::solid("#ffffff")));

    // Category rows are not addressed by role wildcards.
    assert!(categorical.categories.as_ref().unwrap()[0].objects.is_none());

    // The prototype is untouched.
    let original = prototype.categorical.as_ref().unwrap();
    assert!(original.values.as_ref().unwrap().columns().all(|c| c.objects.is_none()));
}

#[test]
fn test_static_column_and_row_scopes() {
    let mut definitions = DataViewObjectDefinitions::new();
    definitions.insert(
        "general".to_string(),
        vec![DataViewObjectDefinition::new(None)
            .with_property("show", DataViewObjectPropertyDefinition::Value(false.into()))],
    );
    definitions.insert(
        "dataPoint".to_string(),
        vec![
            DataViewObjectDefinition::new(Some(Selector::for_metadata("Sum(Sales.Amount)")))
                .with_property("fill", DataViewObjectPropertyDefinition::solid_fill(SQExprBuilder::text("#111111"))),
            DataViewObjectDefinition::new(Some(Selector::with_data(vec![
                DataRepetitionSelector::Identity(region("East")),
            ])))
            .with_property("fill", DataViewObjectPropertyDefinition::solid_fill(SQExprBuilder::text("#222222"))),
        ],
    );
    let results = run(categorical_prototype(), selects().with_objects(definitions));
    let data_view = &results[0];

    let metadata_objects = data_view.metadata.objects.as_ref().unwrap();
    assert_eq!(metadata_objects.value("general", "show"), Some(&false.into()));

    let amount = data_view.metadata.column_by_query_name("Sum(Sales.Amount)").unwrap();
    assert_eq!(fill_of(amount.objects.as_ref().unwrap()), Some(&Fill::solid("#111111")));

    let rows = data_view.categorical.as_ref().unwrap().categories.as_ref().unwrap()[0]
        .objects
        .as_ref()
        .unwrap();
    assert_eq!(fill_of(&rows[0]), Some(&Fill::solid("#222222")));
    assert!(rows[1].is_empty());
}

#[test]
fn test_matrix_and_tree_nodes() {
    let region_column = Arc::new(DataViewMetadataColumn::new("Region").with_index(0));
    let rows = DataViewHierarchy::new(
        DataViewMatrixNode::default().with_children(vec![
            DataViewMatrixNode::leaf(0, "East".into()).with_identity(region("East")),
            DataViewMatrixNode::leaf(0, "West".into()).with_identity(region("West")),
        ]),
        vec![DataViewHierarchyLevel::new(vec![region_column.clone()])],
    );
    let tree = DataViewTree {
        root: Arc::new(DataViewTreeNode::default().with_children(vec![
            DataViewTreeNode::named("East").with_identity(region("East")),
            DataViewTreeNode::named("West").with_identity(region("West")),
        ])),
    };
    let prototype = DataView::new(DataViewMetadata {
        columns: vec![region_column],
        objects: None,
    })
    .with_matrix(DataViewMatrix {
        rows,
        ..Default::default()
    })
    .with_tree(tree);

    let mut definitions = DataViewObjectDefinitions::new();
    definitions.insert(
        "dataPoint".to_string(),
        vec![DataViewObjectDefinition::new(Some(Selector::with_data(vec![
            DataRepetitionSelector::Identity(region("West")),
        ])))
        .with_property("fill", DataViewObjectPropertyDefinition::solid_fill(SQExprBuilder::text("#333333")))],
    );
    let results = run(prototype.clone(), DataViewTransforms::default().with_objects(definitions));
    let data_view = &results[0];

    let matrix_rows = data_view.matrix.as_ref().unwrap().rows.root.children();
    assert!(matrix_rows[0].objects.is_none());
    assert_eq!(fill_of(matrix_rows[1].objects.as_ref().unwrap()), Some(&Fill::solid("#333333")));
    // Untouched siblings stay shared with the prototype.
    let original_rows = prototype.matrix.as_ref().unwrap().rows.root.children();
    assert!(Arc::ptr_eq(&matrix_rows[0], &original_rows[0]));
    assert!(original_rows[1].objects.is_none());

    let tree_nodes = data_view.tree.as_ref().unwrap().root.children();
    assert!(tree_nodes[0].objects.is_none());
    assert_eq!(fill_of(tree_nodes[1].objects.as_ref().unwrap()), Some(&Fill::solid("#333333")));
}
