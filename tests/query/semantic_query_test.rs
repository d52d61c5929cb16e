//! Integration tests for immutable semantic queries and the query contract.

use dataview::data_view::SortDirection;
use dataview::query::{NamedSQExpr, QueryDefinition, SemanticFilter, SemanticQuery};
use dataview::sqexpr::{QueryAggregateFunction, SQExprBuilder, SQExprRef};
use dataview::EngineError;

fn column(entity: &str, name: &str) -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("model", entity, None), name)
}

fn sales_query() -> SemanticQuery {
    SemanticQuery::default()
        .add_select(column("Sales", "Region"), None)
        .add_select(
            SQExprBuilder::aggregate(column("Sales", "Amount"), QueryAggregateFunction::Sum),
            Some("Total"),
        )
}

#[test]
fn test_mutators_return_new_queries() {
    let query = sales_query();
    let with_store = query.add_select(column("Store", "Name"), None);

    assert_eq!(query.selects().len(), 2);
    assert_eq!(query.from().len(), 1);
    assert_eq!(with_store.selects().len(), 3);
    assert_eq!(with_store.from().keys().collect::<Vec<_>>(), vec!["s", "s2"]);
}

#[test]
fn test_select_names() {
    let query = sales_query().add_select(column("Sales", "Region"), None);
    let names: Vec<_> = query.selects().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Region", "Total", "Region1"]);
    assert!(query.select_by_name("Total").is_some());
}

#[test]
fn test_group_by_and_order_by() {
    let query = sales_query()
        .group_by(vec![NamedSQExpr::new("Region", column("Sales", "Region"))])
        .order_by_expr(column("Sales", "Region"), SortDirection::Ascending);
    assert_eq!(query.group_by_items().len(), 1);
    assert_eq!(query.order_by_items()[0].direction, SortDirection::Ascending);
    assert_eq!(query.from().len(), 1);
}

#[test]
fn test_where_replaces_and_add_where_appends() {
    let east = SemanticFilter::from_sq_expr(SQExprBuilder::equal(
        column("Sales", "Region"),
        SQExprBuilder::text("East"),
    ));
    let main = SemanticFilter::from_sq_expr(SQExprBuilder::equal(
        column("Store", "Name"),
        SQExprBuilder::text("Main"),
    ));

    let filtered = sales_query().where_(&east).add_where(&main);
    assert_eq!(filtered.where_items().len(), 2);
    assert_eq!(filtered.from().keys().collect::<Vec<_>>(), vec!["s", "s2"]);

    let replaced = filtered.where_(&east);
    assert_eq!(replaced.where_items().len(), 1);
    // Store is no longer referenced.
    assert_eq!(replaced.from().len(), 1);
}

#[test]
fn test_contract_round_trip() {
    let query = sales_query().order_by_expr(column("Sales", "Region"), SortDirection::Descending);
    let definition = query.to_query_definition();
    let json = serde_json::to_string(&definition).unwrap();

    let parsed = QueryDefinition::from_json(&json).unwrap();
    let restored = SemanticQuery::from_query_definition(&parsed).unwrap();
    assert_eq!(restored, query);
}

#[test]
fn test_contract_without_variable_is_an_error() {
    let json = r#"{
        "from": [{"name": "s", "schema": "model", "entity": "Sales"}],
        "select": [{"name": "Amount", "expr": {"kind": "ColumnRef", "ref": "Amount",
                    "source": {"kind": "Entity", "schema": "", "entity": "Sales"}}}]
    }"#;
    let definition = QueryDefinition::from_json(json).unwrap();
    let err = SemanticQuery::from_query_definition(&definition).unwrap_err();
    assert!(matches!(err, EngineError::MissingSourceVariable { ref entity } if entity == "Sales"));

    assert!(matches!(
        QueryDefinition::from_json("{").unwrap_err(),
        EngineError::Json { .. }
    ));
}
