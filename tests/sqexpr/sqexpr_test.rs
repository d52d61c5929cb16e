//! Integration tests for expression construction, equality, serialization
//! and validation.

use std::sync::Arc;

use dataview::schema::{
    ConceptualCapabilities, ConceptualEntities, ConceptualEntity, ConceptualProperty,
    ConceptualSchema, FederatedConceptualSchema,
};
use dataview::sqexpr::{
    sq_expr_equals, validate_expr, QueryAggregateFunction, QueryComparisonKind, SQExpr,
    SQExprBuilder, SQExprKind, SQExprRef, SQExprShortSerializer, SQExprValidationError, TimeUnit,
};
use dataview::types::ValueType;

fn sales() -> SQExprRef {
    SQExprBuilder::entity("s", "Sales", Some("s"))
}

fn amount() -> SQExprRef {
    SQExprBuilder::column_ref(sales(), "Amount")
}

fn schema() -> FederatedConceptualSchema {
    FederatedConceptualSchema::new(vec![ConceptualSchema {
        name: "s".to_string(),
        entities: ConceptualEntities(vec![ConceptualEntity {
            name: "Sales".to_string(),
            properties: vec![
                ConceptualProperty::column("Amount", ValueType::double()),
                ConceptualProperty::column("Region", ValueType::text()),
            ],
            hierarchies: vec![],
        }]),
        capabilities: ConceptualCapabilities::default(),
    }])
}

/// A filter touching most node kinds.
fn sample_filter() -> SQExprRef {
    let region = SQExprBuilder::column_ref(sales(), "Region");
    let big = SQExprBuilder::compare(
        QueryComparisonKind::GreaterThan,
        SQExprBuilder::aggregate(amount(), QueryAggregateFunction::Sum),
        SQExprBuilder::double(100.0),
    );
    let regions = SQExprBuilder::in_expr(
        vec![region.clone()],
        vec![vec![SQExprBuilder::text("East")], vec![SQExprBuilder::text("West")]],
    );
    let recent = SQExprBuilder::between(
        SQExprBuilder::column_ref(sales(), "Date"),
        SQExprBuilder::date_add(TimeUnit::Month, -3, SQExprBuilder::now()),
        SQExprBuilder::now(),
    );
    let named = SQExprBuilder::not(SQExprBuilder::starts_with(region, SQExprBuilder::text("X")));
    let left = SQExprBuilder::and(Some(big), Some(regions));
    let right = SQExprBuilder::or(Some(recent), Some(named));
    SQExprBuilder::and(left, right).unwrap()
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_json_round_trip_preserves_equality() {
    let expr = sample_filter();
    let json = serde_json::to_string(&expr).unwrap();
    let parsed: SQExprRef = serde_json::from_str(&json).unwrap();

    assert!(sq_expr_equals(&expr, &parsed));
    assert_eq!(
        SQExprShortSerializer::serialize(&expr),
        SQExprShortSerializer::serialize(&parsed)
    );
}

#[test]
fn test_json_tags_expression_kind() {
    let json = serde_json::to_value(amount()).unwrap();
    assert_eq!(json["kind"], "ColumnRef");
}

#[test]
fn test_short_serializer_ignores_variables() {
    let with_variable = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", Some("a")), "Amount");
    let without = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Amount");
    assert_eq!(
        SQExprShortSerializer::serialize(&with_variable),
        SQExprShortSerializer::serialize(&without)
    );
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_kinds_and_measures() {
    let sum = SQExprBuilder::aggregate(amount(), QueryAggregateFunction::Sum);
    assert_eq!(sum.kind(), SQExprKind::Aggregation);
    assert!(sum.is_measure());
    assert!(amount().is_field());
    assert!(!amount().is_measure());
}

#[test]
fn test_or_of_in_expressions_merges() {
    let region = SQExprBuilder::column_ref(sales(), "Region");
    let east = SQExprBuilder::in_expr(vec![region.clone()], vec![vec![SQExprBuilder::text("East")]]);
    let west = SQExprBuilder::in_expr(vec![region], vec![vec![SQExprBuilder::text("West")]]);

    let merged = SQExprBuilder::or(Some(east), Some(west)).unwrap();
    let SQExpr::In(in_expr) = merged.as_ref() else {
        panic!("expected In, got {:?}", merged.kind());
    };
    assert_eq!(in_expr.values.len(), 2);
}

#[test]
fn test_equality_is_structural() {
    assert!(sq_expr_equals(&sample_filter(), &sample_filter()));
    let other = SQExprBuilder::and(Some(sample_filter()), Some(SQExprBuilder::boolean(true))).unwrap();
    assert!(!sq_expr_equals(&sample_filter(), &other));
    assert!(!Arc::ptr_eq(&sample_filter(), &sample_filter()));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validation_against_schema() {
    let schema = schema();
    let valid = SQExprBuilder::aggregate(amount(), QueryAggregateFunction::Avg);
    assert!(validate_expr(&valid, &schema, false).is_empty());

    let missing = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Store", None), "Name");
    assert_eq!(
        validate_expr(&missing, &schema, false),
        vec![SQExprValidationError::InvalidEntityReference]
    );
}
