//! Integration tests for settings files and their effect on the pipeline.

use std::fs;
use std::sync::Arc;

use dataview::analysis::{DataViewCategoricalMapping, DataViewMapping, DataViewRoleMapping, RoleCondition};
use dataview::config::{Settings, SettingsError, SETTINGS_FILE_NAME};
use dataview::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewValueColumn, DataViewValueColumns,
};
use dataview::transform::{
    DataViewRoleTransform, DataViewSelectTransform, DataViewTransform,
    DataViewTransformApplyOptions, DataViewTransforms,
};
use dataview::types::DataValue;
use tempfile::TempDir;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        "[transform]\nconcatenation_separator = \" | \"\nregression_combine_series = false\n",
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.transform.concatenation_separator, " | ");
    assert!(!settings.transform.regression_combine_series);
    // Sections that are not in the file keep their defaults.
    assert_eq!(settings.objects.null_color, "#000000");
    assert!(settings.analysis.trim_to_supported_row_count);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
}

#[test]
fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(SETTINGS_FILE_NAME);
    fs::write(&path, "[transform\n").unwrap();
    assert!(matches!(Settings::load(&path), Err(SettingsError::ParseError(_))));
}

#[test]
fn test_find_and_load_walks_up() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(SETTINGS_FILE_NAME),
        "[objects]\nnull_color = \"#ff0000\"\n",
    )
    .unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let settings = Settings::find_and_load(&nested).unwrap();
    assert_eq!(settings.objects.null_color, "#ff0000");
}

#[test]
fn test_find_and_load_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("empty");
    fs::create_dir_all(&nested).unwrap();
    // Only meaningful when no ancestor of the temp dir holds a settings file.
    if dir.path().ancestors().any(|a| a.join(SETTINGS_FILE_NAME).is_file()) {
        return;
    }
    assert_eq!(Settings::find_and_load(&nested).unwrap(), Settings::default());
}

// ============================================================================
// Effect on transforms
// ============================================================================

fn drilled_prototype() -> DataView {
    let year = Arc::new(DataViewMetadataColumn::new("Year").with_index(0));
    let month = Arc::new(DataViewMetadataColumn::new("Month").with_index(1));
    let amount = Arc::new(DataViewMetadataColumn::new("Amount").with_index(2).measure());
    DataView::new(DataViewMetadata {
        columns: vec![year.clone(), month.clone(), amount.clone()],
        objects: None,
    })
    .with_categorical(DataViewCategorical {
        categories: Some(vec![
            DataViewCategoryColumn::new(year, vec!["2024".into(), "2024".into()]),
            DataViewCategoryColumn::new(month, vec!["Jan".into(), "Feb".into()]),
        ]),
        values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
            amount,
            vec![5.into(), 7.into()],
        )])),
    })
}

fn drilled_transforms() -> DataViewTransforms {
    let mut transforms = DataViewTransforms::default()
        .with_select(DataViewSelectTransform::new("Year", "Date.Year").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Month", "Date.Month").with_role("Category"))
        .with_select(DataViewSelectTransform::new("Amount", "Sum(Sales.Amount)").with_role("Y"));
    transforms.roles = Some(DataViewRoleTransform {
        active_items: [(
            "Category".to_string(),
            vec!["Date.Year".to_string(), "Date.Month".to_string()],
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    });
    transforms
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

#[test]
fn test_separator_setting_drives_concatenation() {
    let settings: Settings = "[transform]\nconcatenation_separator = \" / \"\n".parse().unwrap();
    let results = DataViewTransform::new(settings).apply(
        DataViewTransformApplyOptions::new(drilled_prototype(), drilled_transforms())
            .with_mapping(single_category_mapping()),
    );

    let categories = results[0].categorical.as_ref().unwrap().categories.as_ref().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].source.display_name, "Year / Month");
    assert_eq!(
        categories[0].values.as_slice(),
        &[DataValue::from("2024 / Jan"), DataValue::from("2024 / Feb")]
    );
    // The merged column replaces both sources in the metadata.
    let names: Vec<_> = results[0]
        .metadata
        .columns
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Year / Month", "Amount"]);
}
