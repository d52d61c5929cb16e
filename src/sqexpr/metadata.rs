//! Metadata inference: what kind of field an expression denotes and of
//! which type, resolved against the conceptual schema.

use serde::{Deserialize, Serialize};

use super::utils::resolve_property;
use super::{QueryAggregateFunction, SQExpr};
use crate::schema::{ConceptualDefaultAggregate, ConceptualProperty, FederatedConceptualSchema};
use crate::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Column,
    Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SQExprMetadata {
    pub kind: FieldKind,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<QueryAggregateFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_aggregate: Option<ConceptualDefaultAggregate>,
    #[serde(default)]
    pub id_on_entity_key: bool,
}

impl SQExprMetadata {
    fn from_property(property: &ConceptualProperty) -> Self {
        Self {
            kind: if property.is_measure() {
                FieldKind::Measure
            } else {
                FieldKind::Column
            },
            value_type: property.value_type,
            format: property.format.clone(),
            aggregate: None,
            default_aggregate: property.column.as_ref().and_then(|c| c.default_aggregate),
            id_on_entity_key: property.id_on_entity_key(),
        }
    }
}

/// Result type of applying `func` to a value of `arg` type.
pub fn aggregate_result_type(func: QueryAggregateFunction, arg: ValueType) -> ValueType {
    match func {
        QueryAggregateFunction::Count | QueryAggregateFunction::CountNonNull => {
            ValueType::integer()
        }
        QueryAggregateFunction::Avg
        | QueryAggregateFunction::Median
        | QueryAggregateFunction::StandardDeviation
        | QueryAggregateFunction::Variance => ValueType::double(),
        QueryAggregateFunction::Sum | QueryAggregateFunction::Min | QueryAggregateFunction::Max => {
            arg
        }
    }
}

/// Infer metadata for `expr`.
///
/// Resolves column/measure references and hierarchy levels through the
/// schema, and derives metadata for aggregation, percentile, arithmetic and
/// scoped-eval wrappers. `None` when the expression does not resolve to a
/// field.
pub fn get_metadata(expr: &SQExpr, schema: &FederatedConceptualSchema) -> Option<SQExprMetadata> {
    match expr {
        SQExpr::ColumnRef(_) | SQExpr::MeasureRef(_) | SQExpr::HierarchyLevel(_) => {
            resolve_property(expr, schema).map(SQExprMetadata::from_property)
        }
        SQExpr::Aggregation(e) => {
            let mut metadata = get_metadata(&e.arg, schema)?;
            metadata.value_type = aggregate_result_type(e.func, metadata.value_type);
            metadata.kind = FieldKind::Measure;
            metadata.aggregate = Some(e.func);
            if matches!(
                e.func,
                QueryAggregateFunction::Count | QueryAggregateFunction::CountNonNull
            ) {
                metadata.format = None;
            }
            Some(metadata)
        }
        SQExpr::Percentile(e) => {
            let mut metadata = get_metadata(&e.arg, schema)?;
            metadata.kind = FieldKind::Measure;
            metadata.value_type = ValueType::double();
            Some(metadata)
        }
        SQExpr::Arithmetic(_) => Some(SQExprMetadata {
            kind: FieldKind::Measure,
            value_type: ValueType::double(),
            format: None,
            aggregate: None,
            default_aggregate: None,
            id_on_entity_key: false,
        }),
        SQExpr::ScopedEval(e) => get_metadata(&e.expression, schema),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use crate::sqexpr::SQExprBuilder;

    fn schema() -> FederatedConceptualSchema {
        FederatedConceptualSchema::new(vec![ConceptualSchema {
            name: "s".to_string(),
            entities: ConceptualEntities(vec![ConceptualEntity {
                name: "Sales".to_string(),
                properties: vec![
                    ConceptualProperty::column("Amount", ValueType::decimal()).with_format("0.00"),
                    ConceptualProperty::measure("Total", ValueType::double()),
                ],
                hierarchies: vec![],
            }]),
            capabilities: ConceptualCapabilities::default(),
        }])
    }

    #[test]
    fn test_column_metadata() {
        let expr = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Amount");
        let metadata = get_metadata(&expr, &schema()).unwrap();
        assert_eq!(metadata.kind, FieldKind::Column);
        assert_eq!(metadata.value_type, ValueType::decimal());
        assert_eq!(metadata.format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_aggregation_types() {
        let column = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Amount");
        let schema = schema();

        let count = SQExprBuilder::aggregate(column.clone(), QueryAggregateFunction::Count);
        let metadata = get_metadata(&count, &schema).unwrap();
        assert_eq!(metadata.kind, FieldKind::Measure);
        assert_eq!(metadata.value_type, ValueType::integer());
        assert_eq!(metadata.format, None);

        let avg = SQExprBuilder::aggregate(column.clone(), QueryAggregateFunction::Avg);
        assert_eq!(get_metadata(&avg, &schema).unwrap().value_type, ValueType::double());

        let sum = SQExprBuilder::aggregate(column, QueryAggregateFunction::Sum);
        assert_eq!(get_metadata(&sum, &schema).unwrap().value_type, ValueType::decimal());
    }

    #[test]
    fn test_measure_and_unknown() {
        let schema = schema();
        let measure = SQExprBuilder::measure_ref(SQExprBuilder::entity("s", "Sales", None), "Total");
        assert_eq!(get_metadata(&measure, &schema).unwrap().kind, FieldKind::Measure);

        let missing = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Nope");
        assert!(get_metadata(&missing, &schema).is_none());
        assert!(get_metadata(&SQExprBuilder::integer(1), &schema).is_none());
    }
}
