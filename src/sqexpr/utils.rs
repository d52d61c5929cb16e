//! Schema resolution and assorted helpers over expression trees.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::metadata::{get_metadata, FieldKind};
use super::visitor::{collect_nodes, rewrite_children, SQExprRewriter};
use super::*;
use crate::schema::{ConceptualProperty, FederatedConceptualSchema};

// =============================================================================
// Schema resolution
// =============================================================================

/// `(schema, entity)` an entity-valued source denotes.
///
/// Entities resolve to themselves; a property variation resolves to the
/// variation's target entity in the same schema.
pub fn resolve_source_entity(
    source: &SQExpr,
    schema: &FederatedConceptualSchema,
) -> Option<(String, String)> {
    match source {
        SQExpr::Entity(e) => Some((e.schema.clone(), e.entity.clone())),
        SQExpr::PropertyVariationSource(pv) => {
            let entity = pv.arg.as_entity()?;
            let property = schema.find_property(&entity.schema, &entity.entity, &pv.property)?;
            let variation = property
                .column
                .as_ref()?
                .variations
                .iter()
                .find(|v| v.name == pv.name)?;
            Some((entity.schema.clone(), variation.target_entity.clone()))
        }
        _ => None,
    }
}

/// The conceptual property behind a column/measure reference or a
/// hierarchy level. Aggregations resolve through to their argument.
pub fn resolve_property<'s>(
    expr: &SQExpr,
    schema: &'s FederatedConceptualSchema,
) -> Option<&'s ConceptualProperty> {
    match expr {
        SQExpr::ColumnRef(e) | SQExpr::MeasureRef(e) => {
            let entity = e.source.as_entity()?;
            schema.find_property(&entity.schema, &entity.entity, &e.reference)
        }
        SQExpr::HierarchyLevel(e) => {
            let SQExpr::Hierarchy(hierarchy) = e.arg.as_ref() else {
                return None;
            };
            let (schema_name, entity) = resolve_source_entity(&hierarchy.arg, schema)?;
            let level =
                schema.find_hierarchy_level(&schema_name, &entity, &hierarchy.hierarchy, &e.level)?;
            schema.find_property(&schema_name, &entity, &level.column)
        }
        SQExpr::Aggregation(e) => resolve_property(&e.arg, schema),
        _ => None,
    }
}

/// Name of the schema the first entity under `expr` belongs to.
pub fn schema_name_of(expr: &SQExprRef) -> Option<String> {
    collect_nodes(expr, |e| matches!(e, SQExpr::Entity(_)))
        .first()
        .and_then(|e| e.as_entity().map(|entity| entity.schema.clone()))
}

/// One `HierarchyLevel` expression per level of the hierarchy `expr`
/// refers to, in level order.
pub fn hierarchy_levels_of(expr: &SQExprRef, schema: &FederatedConceptualSchema) -> Vec<SQExprRef> {
    let SQExpr::Hierarchy(hierarchy) = expr.as_ref() else {
        return Vec::new();
    };
    let Some((schema_name, entity)) = resolve_source_entity(&hierarchy.arg, schema) else {
        return Vec::new();
    };
    schema
        .find_hierarchy(&schema_name, &entity, &hierarchy.hierarchy)
        .map(|h| {
            h.levels
                .iter()
                .map(|level| SQExprBuilder::hierarchy_level(Arc::clone(expr), &level.name))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Aggregates
// =============================================================================

/// Aggregate functions valid for the field `expr` denotes.
///
/// Measures support none. Numeric columns support the arithmetic family
/// (plus `Median` when the schema can compute it); date-time columns support
/// `Min`/`Max`; everything else supports counting, except that an entity key
/// column is not counted with `Count`.
pub fn get_supported_aggregates(
    expr: &SQExprRef,
    schema: &FederatedConceptualSchema,
) -> Vec<QueryAggregateFunction> {
    use QueryAggregateFunction::*;

    let Some(metadata) = get_metadata(expr, schema) else {
        return Vec::new();
    };
    if metadata.kind == FieldKind::Measure {
        return Vec::new();
    }

    let value_type = metadata.value_type;
    if value_type.is_numeric() {
        let mut aggregates = vec![
            Sum,
            Avg,
            Min,
            Max,
            Count,
            CountNonNull,
            StandardDeviation,
            Variance,
        ];
        let supports_median = schema_name_of(expr)
            .and_then(|name| schema.schema(&name).map(|s| s.capabilities.supports_median))
            .unwrap_or(false);
        if supports_median {
            aggregates.push(Median);
        }
        return aggregates;
    }
    if value_type.is_date_time() {
        return vec![Min, Max];
    }

    let mut aggregates = Vec::new();
    if !metadata.id_on_entity_key {
        aggregates.push(Count);
    }
    aggregates.push(CountNonNull);
    aggregates
}

// =============================================================================
// Shape checks
// =============================================================================

pub fn is_default_value(expr: &SQExpr) -> bool {
    matches!(expr, SQExpr::DefaultValue)
}

pub fn is_any_value(expr: &SQExpr) -> bool {
    matches!(expr, SQExpr::AnyValue)
}

/// Comparand fields of an identity expression: the non-constant side of
/// every `Equal` comparison in an `And` chain, or the arguments of an `In`.
pub fn get_key_fields(identity: &SQExprRef) -> Vec<SQExprRef> {
    let mut fields = Vec::new();
    collect_key_fields(identity, &mut fields);
    fields
}

fn collect_key_fields(expr: &SQExprRef, fields: &mut Vec<SQExprRef>) {
    match expr.as_ref() {
        SQExpr::And(e) => {
            collect_key_fields(&e.left, fields);
            collect_key_fields(&e.right, fields);
        }
        SQExpr::Compare(e) if e.comparison == QueryComparisonKind::Equal => {
            let field = if e.left.as_constant().is_some() {
                &e.right
            } else {
                &e.left
            };
            fields.push(Arc::clone(field));
        }
        SQExpr::In(e) => fields.extend(e.args.iter().cloned()),
        _ => {}
    }
}

// =============================================================================
// Entity variables
// =============================================================================

/// Distinct `from` variables referenced by entities under `expr`.
pub fn gather_entity_variables(expr: &SQExprRef) -> BTreeSet<String> {
    collect_nodes(expr, |e| matches!(e, SQExpr::Entity(_)))
        .iter()
        .filter_map(|e| e.as_entity().and_then(|entity| entity.variable.clone()))
        .collect()
}

struct EntityVariableRewriter<'a> {
    renames: &'a HashMap<String, String>,
}

impl SQExprRewriter for EntityVariableRewriter<'_> {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        if let SQExpr::Entity(entity) = expr.as_ref() {
            if let Some(new_name) = entity.variable.as_ref().and_then(|v| self.renames.get(v)) {
                return SQExprBuilder::entity(&entity.schema, &entity.entity, Some(new_name.as_str()));
            }
            return Arc::clone(expr);
        }
        rewrite_children(self, expr)
    }
}

/// Rename entity variables according to `renames` (old → new).
pub fn replace_entity_variable(expr: &SQExprRef, renames: &HashMap<String, String>) -> SQExprRef {
    if renames.is_empty() {
        return Arc::clone(expr);
    }
    EntityVariableRewriter { renames }.rewrite(expr)
}
