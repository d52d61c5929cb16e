//! Expression validation against a conceptual schema.
//!
//! Validation never fails: it walks the whole tree and returns every problem
//! it found as an error code.

use super::metadata::get_metadata;
use super::utils::{get_supported_aggregates, resolve_source_entity};
use super::visitor::{walk_expr, SQExprVisitor};
use super::{SQExpr, SQExprRef};
use crate::schema::FederatedConceptualSchema;
use crate::types::ValueType;

/// Problems found in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SQExprValidationError {
    #[error("aggregate function is not supported for its argument")]
    InvalidAggregateFunction,
    #[error("schema reference does not resolve")]
    InvalidSchemaReference,
    #[error("entity reference does not resolve")]
    InvalidEntityReference,
    #[error("column reference does not resolve to a column")]
    InvalidColumnReference,
    #[error("measure reference does not resolve to a measure")]
    InvalidMeasureReference,
    #[error("hierarchy reference does not resolve")]
    InvalidHierarchyReference,
    #[error("hierarchy level reference does not resolve")]
    InvalidHierarchyLevelReference,
    #[error("left operand has an invalid type")]
    InvalidLeftOperandType,
    #[error("right operand has an invalid type")]
    InvalidRightOperandType,
    #[error("value type is not compatible with its argument")]
    InvalidValueType,
    #[error("invalid percentile argument")]
    InvalidPercentileArgument,
    #[error("scope arguments must be fields")]
    InvalidScopeArgument,
}

/// Validate `expr` against `schema`.
///
/// With `ignore_aggregates`, aggregate functions are not checked against the
/// aggregates their argument supports.
pub fn validate_expr(
    expr: &SQExprRef,
    schema: &FederatedConceptualSchema,
    ignore_aggregates: bool,
) -> Vec<SQExprValidationError> {
    let mut validator = SQExprValidator {
        schema,
        ignore_aggregates,
        errors: Vec::new(),
    };
    walk_expr(&mut validator, expr);
    validator.errors
}

struct SQExprValidator<'a> {
    schema: &'a FederatedConceptualSchema,
    ignore_aggregates: bool,
    errors: Vec<SQExprValidationError>,
}

impl SQExprValidator<'_> {
    fn register(&mut self, error: SQExprValidationError) {
        self.errors.push(error);
    }

    /// Static type of an operand, when it can be known.
    fn operand_type(&self, expr: &SQExpr) -> Option<ValueType> {
        match expr {
            SQExpr::Constant(c) if !c.value_type.is_null() => Some(c.value_type),
            SQExpr::Constant(_) => None,
            SQExpr::Now | SQExpr::DateAdd(_) | SQExpr::DateSpan(_) => Some(ValueType::date_time()),
            _ => get_metadata(expr, self.schema).map(|m| m.value_type),
        }
    }

    fn comparable(&self, left: &SQExpr, right: &SQExpr) -> bool {
        match (self.operand_type(left), self.operand_type(right)) {
            (Some(l), Some(r)) => {
                l.is_compatible_from(&r)
                    || r.is_compatible_from(&l)
                    || (l.is_numeric() && r.is_numeric())
                    || (l.is_date_time() && r.is_date_time())
            }
            _ => true,
        }
    }

    fn is_text_operand(&self, expr: &SQExpr) -> bool {
        self.operand_type(expr).map_or(true, |t| t.is_text())
    }

    fn is_numeric_operand(&self, expr: &SQExpr) -> bool {
        self.operand_type(expr).map_or(true, |t| t.is_numeric())
    }

    fn validate_entity(&mut self, schema_name: &str, entity: &str) {
        match self.schema.schema(schema_name) {
            None => self.register(SQExprValidationError::InvalidSchemaReference),
            Some(schema) if schema.entities.with_name(entity).is_none() => {
                self.register(SQExprValidationError::InvalidEntityReference)
            }
            Some(_) => {}
        }
    }
}

impl SQExprVisitor for SQExprValidator<'_> {
    fn enter(&mut self, expr: &SQExprRef) -> bool {
        use SQExprValidationError::*;

        match expr.as_ref() {
            SQExpr::Entity(e) => self.validate_entity(&e.schema, &e.entity),
            SQExpr::ColumnRef(e) => {
                if let Some(entity) = e.source.as_entity() {
                    if self.schema.entity(&entity.schema, &entity.entity).is_some() {
                        let property =
                            self.schema
                                .find_property(&entity.schema, &entity.entity, &e.reference);
                        if property.map_or(true, |p| p.is_measure()) {
                            self.register(InvalidColumnReference);
                        }
                    }
                }
            }
            SQExpr::MeasureRef(e) => {
                if let Some(entity) = e.source.as_entity() {
                    if self.schema.entity(&entity.schema, &entity.entity).is_some() {
                        let property =
                            self.schema
                                .find_property(&entity.schema, &entity.entity, &e.reference);
                        if !property.is_some_and(|p| p.is_measure()) {
                            self.register(InvalidMeasureReference);
                        }
                    }
                }
            }
            SQExpr::Aggregation(e) => {
                if !self.ignore_aggregates && get_metadata(&e.arg, self.schema).is_some() {
                    let supported = get_supported_aggregates(&e.arg, self.schema);
                    if !supported.contains(&e.func) {
                        self.register(InvalidAggregateFunction);
                    }
                }
            }
            SQExpr::Hierarchy(e) => {
                if let Some((schema_name, entity)) = resolve_source_entity(&e.arg, self.schema) {
                    if self.schema.entity(&schema_name, &entity).is_some()
                        && self
                            .schema
                            .find_hierarchy(&schema_name, &entity, &e.hierarchy)
                            .is_none()
                    {
                        self.register(InvalidHierarchyReference);
                    }
                }
            }
            SQExpr::HierarchyLevel(e) => {
                if let SQExpr::Hierarchy(h) = e.arg.as_ref() {
                    if let Some((schema_name, entity)) = resolve_source_entity(&h.arg, self.schema)
                    {
                        if self
                            .schema
                            .find_hierarchy(&schema_name, &entity, &h.hierarchy)
                            .is_some()
                            && self
                                .schema
                                .find_hierarchy_level(&schema_name, &entity, &h.hierarchy, &e.level)
                                .is_none()
                        {
                            self.register(InvalidHierarchyLevelReference);
                        }
                    }
                } else {
                    self.register(InvalidHierarchyReference);
                }
            }
            SQExpr::PropertyVariationSource(e) => {
                if let Some(entity) = e.arg.as_entity() {
                    if self.schema.entity(&entity.schema, &entity.entity).is_some()
                        && resolve_source_entity(expr, self.schema).is_none()
                    {
                        self.register(InvalidColumnReference);
                    }
                }
            }
            SQExpr::Percentile(e) => {
                let numeric_arg = get_metadata(&e.arg, self.schema)
                    .map_or(false, |m| m.value_type.is_numeric());
                if !(0.0..=1.0).contains(&e.k) || !numeric_arg {
                    self.register(InvalidPercentileArgument);
                }
            }
            SQExpr::Compare(e) => {
                if !self.comparable(&e.left, &e.right) {
                    self.register(InvalidRightOperandType);
                }
            }
            SQExpr::Between(e) => {
                if !self.comparable(&e.arg, &e.lower) {
                    self.register(InvalidLeftOperandType);
                }
                if !self.comparable(&e.arg, &e.upper) {
                    self.register(InvalidRightOperandType);
                }
            }
            SQExpr::In(e) => {
                let mismatch = e.values.iter().any(|tuple| {
                    tuple.len() != e.args.len()
                        || tuple
                            .iter()
                            .zip(&e.args)
                            .any(|(value, arg)| !self.comparable(arg, value))
                });
                if mismatch {
                    self.register(InvalidValueType);
                }
            }
            SQExpr::Contains(e) | SQExpr::StartsWith(e) => {
                if !self.is_text_operand(&e.left) {
                    self.register(InvalidLeftOperandType);
                }
                if !self.is_text_operand(&e.right) {
                    self.register(InvalidRightOperandType);
                }
            }
            SQExpr::Arithmetic(e) => {
                if !self.is_numeric_operand(&e.left) {
                    self.register(InvalidLeftOperandType);
                }
                if !self.is_numeric_operand(&e.right) {
                    self.register(InvalidRightOperandType);
                }
            }
            SQExpr::ScopedEval(e) => {
                if e.scope.iter().any(|s| !s.is_field()) {
                    self.register(InvalidScopeArgument);
                }
            }
            _ => {}
        }
        true
    }
}
