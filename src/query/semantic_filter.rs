//! Immutable semantic filter.

use serde::{Deserialize, Serialize};

use super::semantic_query::rebase_filter;
use super::{rebase_expr, trim_from, SQFilter, SQFrom};
use crate::sqexpr::equality::{sequence_equals, sq_expr_equals};
use crate::sqexpr::utils::{is_any_value, is_default_value};
use crate::sqexpr::{SQExpr, SQExprBuilder, SQExprRef};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticFilter {
    from: SQFrom,
    #[serde(rename = "where")]
    where_items: Vec<SQFilter>,
}

impl SemanticFilter {
    /// Build a filter. Expressions must already be bound to `from`.
    pub fn new(from: SQFrom, where_items: Vec<SQFilter>) -> Self {
        let mut filter = Self { from, where_items };
        filter.from = trim_from(
            &filter.from,
            filter.where_items.iter().flat_map(|w| w.exprs()),
        );
        filter
    }

    /// A filter whose single condition is `expr`.
    ///
    /// Every entity under `expr` gets a `from` variable: the lower-cased
    /// first letter of its name, with `2`, `3`, ... on collision. Entity
    /// nodes are rewritten to carry their variable.
    pub fn from_sq_expr(expr: SQExprRef) -> Self {
        let mut from = SQFrom::new();
        let condition = rebase_expr(&mut from, &strip_variables(&expr));
        Self::new(from, vec![SQFilter::new(condition)])
    }

    pub fn from(&self) -> &SQFrom {
        &self.from
    }

    pub fn where_items(&self) -> &[SQFilter] {
        &self.where_items
    }

    /// The first clause's condition.
    pub fn condition(&self) -> Option<&SQExprRef> {
        self.where_items.first().map(|w| &w.condition)
    }

    /// Combine filters into one, rebased onto the first filter's `from`.
    /// Variables of later filters that collide are renamed.
    pub fn merge(filters: &[SemanticFilter]) -> Option<SemanticFilter> {
        let (first, rest) = filters.split_first()?;
        if rest.is_empty() {
            return Some(first.clone());
        }

        let mut from = first.from.clone();
        let mut where_items = first.where_items.clone();
        for filter in rest {
            where_items.extend(rebase_filter(&mut from, filter));
        }
        Some(Self::new(from, where_items))
    }

    /// Whether the filter resets its fields to their default values.
    pub fn is_default_filter(filter: &SemanticFilter) -> bool {
        filter.single_condition().is_some_and(|c| condition_is(c, is_default_value))
    }

    /// Whether the filter matches any value of its fields.
    pub fn is_any_filter(filter: &SemanticFilter) -> bool {
        filter.single_condition().is_some_and(|c| condition_is(c, is_any_value))
    }

    /// Whether two filters express the same conditions, regardless of
    /// variable names.
    pub fn is_same_filter(left: &SemanticFilter, right: &SemanticFilter) -> bool {
        left.where_items.len() == right.where_items.len()
            && left
                .where_items
                .iter()
                .zip(&right.where_items)
                .all(|(l, r)| {
                    sq_expr_equals(&l.condition, &r.condition)
                        && match (&l.target, &r.target) {
                            (None, None) => true,
                            (Some(a), Some(b)) => sequence_equals(a, b),
                            _ => false,
                        }
                })
    }

    /// `field = DefaultValue`, or an `In` of default values for several
    /// fields.
    pub fn get_default_value_filter(fields: Vec<SQExprRef>) -> Option<SemanticFilter> {
        sentinel_filter(fields, SQExprBuilder::default_value)
    }

    /// `field = AnyValue`, or an `In` of any-values for several fields.
    pub fn get_any_value_filter(fields: Vec<SQExprRef>) -> Option<SemanticFilter> {
        sentinel_filter(fields, SQExprBuilder::any_value)
    }

    fn single_condition(&self) -> Option<&SQExprRef> {
        match self.where_items.as_slice() {
            [only] => Some(&only.condition),
            _ => None,
        }
    }
}

fn sentinel_filter(fields: Vec<SQExprRef>, sentinel: fn() -> SQExprRef) -> Option<SemanticFilter> {
    let condition = match fields.len() {
        0 => return None,
        1 => SQExprBuilder::equal(fields[0].clone(), sentinel()),
        n => SQExprBuilder::in_expr(fields, vec![(0..n).map(|_| sentinel()).collect()]),
    };
    Some(SemanticFilter::from_sq_expr(condition))
}

/// Whether a condition compares its fields against the sentinel `is`.
fn condition_is(condition: &SQExprRef, is: fn(&SQExpr) -> bool) -> bool {
    match condition.as_ref() {
        SQExpr::Compare(c) => is(&c.right) || is(&c.left),
        SQExpr::In(e) => !e.values.is_empty() && e.values.iter().flatten().all(|v| is(v)),
        other => is(other),
    }
}

/// Drop every entity variable so the expression gets fresh ones.
fn strip_variables(expr: &SQExprRef) -> SQExprRef {
    use crate::sqexpr::{rewrite_children, SQExprRewriter};
    use std::sync::Arc;

    struct Strip;
    impl SQExprRewriter for Strip {
        fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
            match expr.as_ref() {
                SQExpr::Entity(e) if e.variable.is_some() => {
                    SQExprBuilder::entity(&e.schema, &e.entity, None)
                }
                SQExpr::Entity(_) => Arc::clone(expr),
                _ => rewrite_children(self, expr),
            }
        }
    }
    Strip.rewrite(expr)
}
