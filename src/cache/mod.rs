//! Caches threaded explicitly through a transform run.
//!
//! # Key Format
//!
//! Color allocators are keyed by [`expr_hash`] of the fill-rule expression:
//! a SHA256 of its short serialization. Two structurally equal rules share
//! one allocator; the same rule applied to different inputs does not,
//! because the input is part of the expression.

mod hash;
pub use hash::expr_hash;

use std::collections::HashMap;
use std::sync::Arc;

use crate::data_view::DataViewMetadata;
use crate::objects::color::GradientColorAllocator;
use crate::sqexpr::{sq_expr_equals, SQExpr, SQExprRef};
use crate::types::DataValue;

/// Gradient allocators by fill-rule expression.
///
/// Building an allocator resolves the rule's stops and the input column's
/// value range, so it is done once per rule and reused for every row.
/// Failed builds are cached too.
#[derive(Debug, Default)]
pub struct ColorAllocatorCache {
    allocators: HashMap<String, Option<Arc<GradientColorAllocator>>>,
}

impl ColorAllocatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.allocators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocators.is_empty()
    }

    /// Allocator for a `FillRule` expression, building it on first use.
    ///
    /// Stop colors and values must be constants. Missing stop values default
    /// from the aggregates of the metadata column whose expression equals
    /// the rule's input.
    pub fn get_or_create(
        &mut self,
        rule_expr: &SQExprRef,
        metadata: &DataViewMetadata,
        null_color: &str,
    ) -> Option<Arc<GradientColorAllocator>> {
        let key = expr_hash(rule_expr);
        if let Some(cached) = self.allocators.get(&key) {
            return cached.clone();
        }

        let allocator = build_allocator(rule_expr, metadata, null_color).map(Arc::new);
        tracing::trace!(key = %key, built = allocator.is_some(), "color allocator created");
        self.allocators.insert(key, allocator.clone());
        allocator
    }
}

fn build_allocator(
    rule_expr: &SQExprRef,
    metadata: &DataViewMetadata,
    null_color: &str,
) -> Option<GradientColorAllocator> {
    let fill_rule = rule_expr.as_fill_rule()?;
    let evaluated = fill_rule
        .rule
        .try_map(
            |color| constant_text(color).ok_or(()),
            |value| constant_number(value).ok_or(()),
            |strategy| constant_text(strategy).ok_or(()),
        )
        .ok()?;

    let range = metadata
        .columns
        .iter()
        .find(|c| c.expr.as_ref().is_some_and(|e| sq_expr_equals(e, &fill_rule.input)))
        .and_then(|c| c.aggregates.as_ref())
        .and_then(|a| a.range());

    GradientColorAllocator::new(&evaluated, range, null_color)
}

fn constant_text(expr: &SQExpr) -> Option<String> {
    match &expr.as_constant()?.value {
        DataValue::Text(s) => Some(s.clone()),
        _ => None,
    }
}

fn constant_number(expr: &SQExpr) -> Option<f64> {
    expr.as_constant()?.value.as_f64()
}
