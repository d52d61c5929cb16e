//! Structural equality of expressions.

use std::sync::Arc;

use super::fill_rule::{FillRuleDefinition, RuleColorStop};
use super::{SQConstantExpr, SQExpr, SQExprRef};

/// Semantic equality: same kind, equal fields, pairwise-equal children.
///
/// Constants compare by type and encoded value. Entities compare by schema
/// and entity name; the `from` variable is an alias, not part of identity.
pub fn sq_expr_equals(a: &SQExpr, b: &SQExpr) -> bool {
    ExprEquality { ignore_case: false }.equals(a, b)
}

/// Like [`sq_expr_equals`], but text constants compare case-insensitively.
pub fn sq_expr_equals_ignore_case(a: &SQExpr, b: &SQExpr) -> bool {
    ExprEquality { ignore_case: true }.equals(a, b)
}

/// Pairwise equality of two expression lists.
pub fn sequence_equals(a: &[SQExprRef], b: &[SQExprRef]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| sq_expr_equals(x, y))
}

/// Equality of two lists ignoring order (each element of `a` matches some
/// element of `b` and lengths agree).
pub fn set_equals(a: &[SQExprRef], b: &[SQExprRef]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| sq_expr_equals(x, y)))
}

struct ExprEquality {
    ignore_case: bool,
}

impl ExprEquality {
    fn eq_ref(&self, a: &SQExprRef, b: &SQExprRef) -> bool {
        Arc::ptr_eq(a, b) || self.equals(a, b)
    }

    fn eq_refs(&self, a: &[SQExprRef], b: &[SQExprRef]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.eq_ref(x, y))
    }

    fn eq_opt(&self, a: Option<&SQExprRef>, b: Option<&SQExprRef>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.eq_ref(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn eq_constant(&self, a: &SQConstantExpr, b: &SQConstantExpr) -> bool {
        if a.value_type != b.value_type {
            return false;
        }
        if self.ignore_case && a.value_type.is_text() {
            return a.value_encoded.to_lowercase() == b.value_encoded.to_lowercase();
        }
        a.value_encoded == b.value_encoded
    }

    fn eq_stop(
        &self,
        a: &RuleColorStop<SQExprRef, SQExprRef>,
        b: &RuleColorStop<SQExprRef, SQExprRef>,
    ) -> bool {
        self.eq_ref(&a.color, &b.color) && self.eq_opt(a.value.as_ref(), b.value.as_ref())
    }

    fn eq_fill_rule(&self, a: &FillRuleDefinition, b: &FillRuleDefinition) -> bool {
        let (stops_a, stops_b) = (a.stops(), b.stops());
        if a.linear_gradient2.is_some() != b.linear_gradient2.is_some()
            || stops_a.len() != stops_b.len()
            || !stops_a.iter().zip(&stops_b).all(|(x, y)| self.eq_stop(x, y))
        {
            return false;
        }
        match (a.null_coloring_strategy(), b.null_coloring_strategy()) {
            (Some(x), Some(y)) => {
                self.eq_ref(&x.strategy, &y.strategy)
                    && self.eq_opt(x.color.as_ref(), y.color.as_ref())
            }
            (None, None) => true,
            _ => false,
        }
    }

    fn equals(&self, a: &SQExpr, b: &SQExpr) -> bool {
        match (a, b) {
            (SQExpr::Entity(x), SQExpr::Entity(y)) => x.schema == y.schema && x.entity == y.entity,
            (SQExpr::ColumnRef(x), SQExpr::ColumnRef(y))
            | (SQExpr::MeasureRef(x), SQExpr::MeasureRef(y)) => {
                x.reference == y.reference && self.eq_ref(&x.source, &y.source)
            }
            (SQExpr::Aggregation(x), SQExpr::Aggregation(y)) => {
                x.func == y.func && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::Percentile(x), SQExpr::Percentile(y)) => {
                x.k == y.k && x.exclusive == y.exclusive && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::Hierarchy(x), SQExpr::Hierarchy(y)) => {
                x.hierarchy == y.hierarchy && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::HierarchyLevel(x), SQExpr::HierarchyLevel(y)) => {
                x.level == y.level && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::PropertyVariationSource(x), SQExpr::PropertyVariationSource(y)) => {
                x.name == y.name && x.property == y.property && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::SelectRef(x), SQExpr::SelectRef(y)) => x.expression_name == y.expression_name,
            (SQExpr::And(x), SQExpr::And(y))
            | (SQExpr::Or(x), SQExpr::Or(y))
            | (SQExpr::Contains(x), SQExpr::Contains(y))
            | (SQExpr::StartsWith(x), SQExpr::StartsWith(y)) => {
                self.eq_ref(&x.left, &y.left) && self.eq_ref(&x.right, &y.right)
            }
            (SQExpr::Not(x), SQExpr::Not(y)) | (SQExpr::Exists(x), SQExpr::Exists(y)) => {
                self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::Compare(x), SQExpr::Compare(y)) => {
                x.comparison == y.comparison
                    && self.eq_ref(&x.left, &y.left)
                    && self.eq_ref(&x.right, &y.right)
            }
            (SQExpr::Between(x), SQExpr::Between(y)) => {
                self.eq_ref(&x.arg, &y.arg)
                    && self.eq_ref(&x.lower, &y.lower)
                    && self.eq_ref(&x.upper, &y.upper)
            }
            (SQExpr::In(x), SQExpr::In(y)) => {
                self.eq_refs(&x.args, &y.args)
                    && x.values.len() == y.values.len()
                    && x.values
                        .iter()
                        .zip(&y.values)
                        .all(|(tx, ty)| self.eq_refs(tx, ty))
            }
            (SQExpr::Constant(x), SQExpr::Constant(y)) => self.eq_constant(x, y),
            (SQExpr::DateSpan(x), SQExpr::DateSpan(y)) => {
                x.unit == y.unit && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::DateAdd(x), SQExpr::DateAdd(y)) => {
                x.unit == y.unit && x.amount == y.amount && self.eq_ref(&x.arg, &y.arg)
            }
            (SQExpr::Now, SQExpr::Now)
            | (SQExpr::DefaultValue, SQExpr::DefaultValue)
            | (SQExpr::AnyValue, SQExpr::AnyValue) => true,
            (SQExpr::Arithmetic(x), SQExpr::Arithmetic(y)) => {
                x.operator == y.operator
                    && self.eq_ref(&x.left, &y.left)
                    && self.eq_ref(&x.right, &y.right)
            }
            (SQExpr::ScopedEval(x), SQExpr::ScopedEval(y)) => {
                self.eq_ref(&x.expression, &y.expression) && self.eq_refs(&x.scope, &y.scope)
            }
            (SQExpr::FillRule(x), SQExpr::FillRule(y)) => {
                self.eq_ref(&x.input, &y.input) && self.eq_fill_rule(&x.rule, &y.rule)
            }
            (SQExpr::ResourcePackageItem(x), SQExpr::ResourcePackageItem(y)) => {
                x.package_name == y.package_name
                    && x.package_type == y.package_type
                    && x.item_name == y.item_name
            }
            _ => false,
        }
    }
}
