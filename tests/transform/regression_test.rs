//! Integration tests for regression lines appended by the transform
//! pipeline.

use std::sync::Arc;

use dataview::analysis::{
    DataViewCategoricalMapping, DataViewMapping, DataViewMappingUsage, DataViewRegressionUsage,
    DataViewRoleMapping,
};
use dataview::config::Settings;
use dataview::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewScopeIdentity, DataViewValueColumn, DataViewValueColumnGroup,
    DataViewValueColumns,
};
use dataview::sqexpr::{SQExprBuilder, SQExprRef};
use dataview::transform::{
    DataViewSelectTransform, DataViewTransform, DataViewTransformApplyOptions, DataViewTransforms,
    RegressionLine,
};
use dataview::types::{DataValue, ValueType};

fn series_field() -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Channel")
}

fn x_column() -> Arc<DataViewMetadataColumn> {
    Arc::new(DataViewMetadataColumn::new("Week").with_index(0))
}

fn transforms() -> DataViewTransforms {
    DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Week", "Sales.Week").with_role("X"))
        .with_select(DataViewSelectTransform::new("Amount", "Sum(Sales.Amount)").with_role("Y"))
        .with_select(DataViewSelectTransform::new("Channel", "Sales.Channel").with_role("Series"))
}

fn regression_mapping(combine_series: Option<bool>) -> DataViewMapping {
    DataViewMapping {
        categorical: Some(DataViewCategoricalMapping {
            categories: Some(DataViewRoleMapping::for_in("X")),
            values: Some(DataViewRoleMapping::group(
                "Series",
                vec![DataViewRoleMapping::for_in("Y")],
            )),
            ..Default::default()
        }),
        usage: Some(DataViewMappingUsage {
            regression: Some(DataViewRegressionUsage {
                x: DataViewRoleMapping::for_in("X"),
                y: DataViewRoleMapping::for_in("Y"),
                combine_series,
            }),
        }),
        ..Default::default()
    }
}

/// One ungrouped series: (1, 2), (2, 4), (3, 6).
fn single_series() -> DataView {
    let x = x_column();
    let amount = Arc::new(DataViewMetadataColumn::new("Amount").with_index(1).measure());
    DataView::new(DataViewMetadata {
        columns: vec![x.clone(), amount.clone()],
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            x,
            vec![1.into(), 2.into(), 3.into()],
        )]),
        values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
            amount,
            vec![2.into(), 4.into(), 6.into()],
        )])),
    })
}

/// Two series over x = 1, 2, 3: "A" is y = 2x and "B" is y = x + 1.
fn two_series() -> DataView {
    let x = x_column();
    let channel = Arc::new(DataViewMetadataColumn::new("Channel").with_index(2));
    let mut columns = vec![x.clone(), channel.clone()];
    let mut groups = Vec::new();
    for (name, ys) in [("A", [2, 4, 6]), ("B", [2, 3, 4])] {
        let identity =
            DataViewScopeIdentity::from_field_value(&series_field(), &name.into(), ValueType::text());
        let mut source = DataViewMetadataColumn::new("Amount").with_index(1).measure();
        source.group_name = Some(name.into());
        let source = Arc::new(source);
        columns.push(Arc::clone(&source));
        groups.push(DataViewValueColumnGroup {
            identity: Some(identity.clone()),
            name: Some(name.into()),
            values: vec![DataViewValueColumn::new(source, ys.iter().map(|&y| y.into()).collect())
                .with_identity(identity)],
            objects: None,
        });
    }

    DataView::new(DataViewMetadata {
        columns,
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            x,
            vec![1.into(), 2.into(), 3.into()],
        )]),
        values: Some(DataViewValueColumns {
            groups,
            source: Some(channel),
            identity_fields: Some(vec![series_field()]),
        }),
    })
}

fn line_values(data_view: &DataView) -> Vec<Vec<DataValue>> {
    data_view
        .categorical
        .as_ref()
        .unwrap()
        .values
        .as_ref()
        .unwrap()
        .columns()
        .map(|c| c.values.to_vec())
        .collect()
}

#[test]
fn test_line_through_extreme_x() {
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(single_series(), transforms())
            .with_mapping(regression_mapping(None)),
    );
    assert_eq!(results.len(), 2);

    let regression = &results[1];
    let categorical = regression.categorical.as_ref().unwrap();
    let x = &categorical.categories.as_ref().unwrap()[0];
    assert_eq!(x.source.display_name, "Week");
    assert_eq!(*x.values, vec![DataValue::from(1.0), DataValue::from(3.0)]);
    assert_eq!(line_values(regression), vec![vec![DataValue::from(2.0), DataValue::from(6.0)]]);

    let names: Vec<_> = regression
        .metadata
        .columns
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Week", "Amount (regression)"]);
}

#[test]
fn test_one_line_per_series() {
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(two_series(), transforms())
            .with_mapping(regression_mapping(Some(false))),
    );
    let regression = &results[1];
    assert_eq!(
        line_values(regression),
        vec![
            vec![DataValue::from(2.0), DataValue::from(6.0)],
            vec![DataValue::from(2.0), DataValue::from(4.0)],
        ]
    );
    let values = regression.categorical.as_ref().unwrap().values.as_ref().unwrap();
    assert_eq!(values.groups.len(), 2);
    assert_eq!(values.groups[1].name, Some("B".into()));
    assert_eq!(values.source.as_ref().unwrap().display_name, "Channel");
}

#[test]
fn test_combined_series_by_default() {
    let results = DataViewTransform::default().apply(
        DataViewTransformApplyOptions::new(two_series(), transforms())
            .with_mapping(regression_mapping(None)),
    );
    // Fitted over all six points: y = 1.5x + 0.5.
    let regression = &results[1];
    assert_eq!(line_values(regression), vec![vec![DataValue::from(2.0), DataValue::from(5.0)]]);
    let values = regression.categorical.as_ref().unwrap().values.as_ref().unwrap();
    assert!(values.source.is_none());
}

#[test]
fn test_setting_overrides_default() {
    let settings: Settings = "[transform]\nregression_combine_series = false\n".parse().unwrap();
    let results = DataViewTransform::new(settings).apply(
        DataViewTransformApplyOptions::new(two_series(), transforms())
            .with_mapping(regression_mapping(None)),
    );
    assert_eq!(line_values(&results[1]).len(), 2);
}

#[test]
fn test_no_line_without_regression_usage() {
    let mut mapping = regression_mapping(None);
    mapping.usage = None;
    let results = DataViewTransform::default()
        .apply(DataViewTransformApplyOptions::new(single_series(), transforms()).with_mapping(mapping));
    assert_eq!(results.len(), 1);
}

#[test]
fn test_fit() {
    let line = RegressionLine::fit(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
    assert_eq!(line.slope, 2.0);
    assert_eq!(line.intercept, 0.0);
    assert!(RegressionLine::fit(&[(1.0, 1.0)]).is_none());
    assert!(RegressionLine::fit(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
}
