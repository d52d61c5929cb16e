//! Integration tests for semantic filters.

use dataview::query::{FilterDefinition, SemanticFilter};
use dataview::sqexpr::{SQExpr, SQExprBuilder, SQExprRef};

fn column(entity: &str, name: &str) -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("model", entity, None), name)
}

fn region_is(value: &str) -> SemanticFilter {
    SemanticFilter::from_sq_expr(SQExprBuilder::equal(
        column("Sales", "Region"),
        SQExprBuilder::text(value),
    ))
}

#[test]
fn test_condition_and_variables() {
    let filter = region_is("East");
    assert_eq!(filter.from().keys().collect::<Vec<_>>(), vec!["s"]);
    let condition = filter.condition().unwrap();
    assert!(matches!(condition.as_ref(), SQExpr::Compare(_)));
}

#[test]
fn test_merge_keeps_every_clause() {
    let store = SemanticFilter::from_sq_expr(SQExprBuilder::equal(
        column("Store", "Name"),
        SQExprBuilder::text("Main"),
    ));
    let merged = SemanticFilter::merge(&[region_is("East"), store, region_is("West")]).unwrap();

    assert_eq!(merged.where_items().len(), 3);
    assert_eq!(merged.from().keys().collect::<Vec<_>>(), vec!["s", "s2"]);
    assert_eq!(merged.from().entity("s2").unwrap().entity, "Store");

    let single = SemanticFilter::merge(&[region_is("East")]).unwrap();
    assert!(SemanticFilter::is_same_filter(&single, &region_is("East")));
}

#[test]
fn test_same_filter_compares_conditions() {
    assert!(SemanticFilter::is_same_filter(&region_is("East"), &region_is("East")));
    assert!(!SemanticFilter::is_same_filter(&region_is("East"), &region_is("West")));
}

#[test]
fn test_default_and_any_value_filters() {
    assert!(SemanticFilter::get_default_value_filter(vec![]).is_none());

    let default = SemanticFilter::get_default_value_filter(vec![column("Sales", "Region")]).unwrap();
    assert!(SemanticFilter::is_default_filter(&default));
    let compare = default.condition().unwrap().as_compare().unwrap();
    assert!(matches!(compare.right.as_ref(), SQExpr::DefaultValue));

    let any = SemanticFilter::get_any_value_filter(vec![
        column("Sales", "Region"),
        column("Sales", "Year"),
    ])
    .unwrap();
    assert!(SemanticFilter::is_any_filter(&any));
    let in_expr = any.condition().unwrap().as_in().unwrap();
    assert_eq!(in_expr.args.len(), 2);
    assert_eq!(in_expr.values.len(), 1);

    assert!(!SemanticFilter::is_any_filter(&region_is("East")));
}

#[test]
fn test_filter_contract_round_trip() {
    let filter = SemanticFilter::merge(&[
        region_is("East"),
        SemanticFilter::from_sq_expr(SQExprBuilder::equal(
            column("Store", "Name"),
            SQExprBuilder::text("Main"),
        )),
    ])
    .unwrap();
    let json = serde_json::to_string(&filter.to_filter_definition()).unwrap();
    let definition = FilterDefinition::from_json(&json).unwrap();
    let restored = SemanticFilter::from_filter_definition(&definition).unwrap();

    assert_eq!(restored, filter);
    assert!(SemanticFilter::is_same_filter(&restored, &filter));
}
