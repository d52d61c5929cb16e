//! Traversal and rewriting.
//!
//! [`SQExprVisitor`] is a read-only visitor: its hooks do nothing by default
//! and [`walk_expr`] drives a full pre-order traversal through them.
//!
//! [`SQExprRewriter`] produces a new tree. The default `rewrite` delegates to
//! [`rewrite_children`], which keeps the original `Arc` whenever none of a
//! node's children changed, so a rewriter that overrides nothing returns the
//! input reference itself.

use std::sync::Arc;

use super::*;

// =============================================================================
// Visitor
// =============================================================================

/// Read-only visitor over an expression tree.
pub trait SQExprVisitor {
    /// Called before a node's children. Returning `false` skips the children.
    fn enter(&mut self, _expr: &SQExprRef) -> bool {
        true
    }

    /// Called after a node's children (or after `enter` returned `false`).
    fn leave(&mut self, _expr: &SQExprRef) {}
}

/// Walk `expr` depth-first, calling `enter`/`leave` on every node.
pub fn walk_expr<V: SQExprVisitor + ?Sized>(visitor: &mut V, expr: &SQExprRef) {
    if visitor.enter(expr) {
        for child in expr.children() {
            walk_expr(visitor, child);
        }
    }
    visitor.leave(expr);
}

/// Collects every node matching a predicate, in pre-order.
pub(crate) struct NodeCollector<F> {
    pub predicate: F,
    pub found: Vec<SQExprRef>,
}

impl<F: FnMut(&SQExpr) -> bool> SQExprVisitor for NodeCollector<F> {
    fn enter(&mut self, expr: &SQExprRef) -> bool {
        if (self.predicate)(expr) {
            self.found.push(Arc::clone(expr));
        }
        true
    }
}

/// All nodes of `expr` (including itself) for which `predicate` holds.
pub fn collect_nodes(expr: &SQExprRef, predicate: impl FnMut(&SQExpr) -> bool) -> Vec<SQExprRef> {
    let mut collector = NodeCollector {
        predicate,
        found: Vec::new(),
    };
    walk_expr(&mut collector, expr);
    collector.found
}

// =============================================================================
// Rewriter
// =============================================================================

/// Tree rewriter. Override `rewrite` to replace nodes; call
/// [`rewrite_children`] from the override to keep descending.
pub trait SQExprRewriter {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        rewrite_children(self, expr)
    }
}

/// Rewrite one child, recording whether its reference changed.
fn child<R: SQExprRewriter + ?Sized>(
    rewriter: &mut R,
    expr: &SQExprRef,
    changed: &mut bool,
) -> SQExprRef {
    let rewritten = rewriter.rewrite(expr);
    if !Arc::ptr_eq(&rewritten, expr) {
        *changed = true;
    }
    rewritten
}

fn children<R: SQExprRewriter + ?Sized>(
    rewriter: &mut R,
    exprs: &[SQExprRef],
    changed: &mut bool,
) -> Vec<SQExprRef> {
    exprs.iter().map(|e| child(rewriter, e, changed)).collect()
}

fn rewrite_stop<R: SQExprRewriter + ?Sized>(
    rewriter: &mut R,
    stop: &RuleColorStop<SQExprRef, SQExprRef>,
    changed: &mut bool,
) -> RuleColorStop<SQExprRef, SQExprRef> {
    let color = child(rewriter, &stop.color, changed);
    let value = match &stop.value {
        Some(v) => Some(child(rewriter, v, changed)),
        None => None,
    };
    RuleColorStop { color, value }
}

fn rewrite_fill_rule<R: SQExprRewriter + ?Sized>(
    rewriter: &mut R,
    rule: &FillRuleDefinition,
    changed: &mut bool,
) -> FillRuleDefinition {
    let mut rewritten = FillRuleDefinition {
        linear_gradient2: None,
        linear_gradient3: None,
    };
    if let Some(g) = &rule.linear_gradient2 {
        rewritten.linear_gradient2 = Some(LinearGradient2 {
            min: rewrite_stop(rewriter, &g.min, changed),
            max: rewrite_stop(rewriter, &g.max, changed),
            null_coloring_strategy: None,
        });
    }
    if let Some(g) = &rule.linear_gradient3 {
        rewritten.linear_gradient3 = Some(LinearGradient3 {
            min: rewrite_stop(rewriter, &g.min, changed),
            mid: rewrite_stop(rewriter, &g.mid, changed),
            max: rewrite_stop(rewriter, &g.max, changed),
            null_coloring_strategy: None,
        });
    }
    if let Some(n) = rule.null_coloring_strategy() {
        let strategy = child(rewriter, &n.strategy, changed);
        let color = match &n.color {
            Some(color) => Some(child(rewriter, color, changed)),
            None => None,
        };
        rewritten = rewritten.with_null_coloring(NullColoringStrategy { strategy, color });
    }
    rewritten
}

/// Rewrite every child of `expr` through `rewriter`.
///
/// Returns `expr` itself (same `Arc`) when no child changed.
pub fn rewrite_children<R: SQExprRewriter + ?Sized>(rewriter: &mut R, expr: &SQExprRef) -> SQExprRef {
    let mut changed = false;
    let c = &mut changed;

    let rebuilt = match expr.as_ref() {
        SQExpr::Entity(_)
        | SQExpr::SelectRef(_)
        | SQExpr::Constant(_)
        | SQExpr::Now
        | SQExpr::DefaultValue
        | SQExpr::AnyValue
        | SQExpr::ResourcePackageItem(_) => return Arc::clone(expr),
        SQExpr::ColumnRef(e) => SQExpr::ColumnRef(SQPropRefExpr {
            source: child(rewriter, &e.source, c),
            reference: e.reference.clone(),
        }),
        SQExpr::MeasureRef(e) => SQExpr::MeasureRef(SQPropRefExpr {
            source: child(rewriter, &e.source, c),
            reference: e.reference.clone(),
        }),
        SQExpr::Aggregation(e) => SQExpr::Aggregation(SQAggregationExpr {
            arg: child(rewriter, &e.arg, c),
            func: e.func,
        }),
        SQExpr::Percentile(e) => SQExpr::Percentile(SQPercentileExpr {
            arg: child(rewriter, &e.arg, c),
            k: e.k,
            exclusive: e.exclusive,
        }),
        SQExpr::Hierarchy(e) => SQExpr::Hierarchy(SQHierarchyExpr {
            arg: child(rewriter, &e.arg, c),
            hierarchy: e.hierarchy.clone(),
        }),
        SQExpr::HierarchyLevel(e) => SQExpr::HierarchyLevel(SQHierarchyLevelExpr {
            arg: child(rewriter, &e.arg, c),
            level: e.level.clone(),
        }),
        SQExpr::PropertyVariationSource(e) => {
            SQExpr::PropertyVariationSource(SQPropertyVariationSourceExpr {
                arg: child(rewriter, &e.arg, c),
                name: e.name.clone(),
                property: e.property.clone(),
            })
        }
        SQExpr::And(e) => SQExpr::And(rewrite_binary(rewriter, e, c)),
        SQExpr::Or(e) => SQExpr::Or(rewrite_binary(rewriter, e, c)),
        SQExpr::Contains(e) => SQExpr::Contains(rewrite_binary(rewriter, e, c)),
        SQExpr::StartsWith(e) => SQExpr::StartsWith(rewrite_binary(rewriter, e, c)),
        SQExpr::Not(e) => SQExpr::Not(SQUnaryExpr {
            arg: child(rewriter, &e.arg, c),
        }),
        SQExpr::Exists(e) => SQExpr::Exists(SQUnaryExpr {
            arg: child(rewriter, &e.arg, c),
        }),
        SQExpr::Compare(e) => SQExpr::Compare(SQCompareExpr {
            comparison: e.comparison,
            left: child(rewriter, &e.left, c),
            right: child(rewriter, &e.right, c),
        }),
        SQExpr::Between(e) => SQExpr::Between(SQBetweenExpr {
            arg: child(rewriter, &e.arg, c),
            lower: child(rewriter, &e.lower, c),
            upper: child(rewriter, &e.upper, c),
        }),
        SQExpr::In(e) => SQExpr::In(SQInExpr {
            args: children(rewriter, &e.args, c),
            values: e
                .values
                .iter()
                .map(|tuple| children(rewriter, tuple, c))
                .collect(),
        }),
        SQExpr::DateSpan(e) => SQExpr::DateSpan(SQDateSpanExpr {
            unit: e.unit,
            arg: child(rewriter, &e.arg, c),
        }),
        SQExpr::DateAdd(e) => SQExpr::DateAdd(SQDateAddExpr {
            unit: e.unit,
            amount: e.amount,
            arg: child(rewriter, &e.arg, c),
        }),
        SQExpr::Arithmetic(e) => SQExpr::Arithmetic(SQArithmeticExpr {
            left: child(rewriter, &e.left, c),
            right: child(rewriter, &e.right, c),
            operator: e.operator,
        }),
        SQExpr::ScopedEval(e) => SQExpr::ScopedEval(SQScopedEvalExpr {
            expression: child(rewriter, &e.expression, c),
            scope: children(rewriter, &e.scope, c),
        }),
        SQExpr::FillRule(e) => SQExpr::FillRule(SQFillRuleExpr {
            input: child(rewriter, &e.input, c),
            rule: rewrite_fill_rule(rewriter, &e.rule, c),
        }),
    };

    if changed {
        Arc::new(rebuilt)
    } else {
        Arc::clone(expr)
    }
}

fn rewrite_binary<R: SQExprRewriter + ?Sized>(
    rewriter: &mut R,
    expr: &SQBinaryExpr,
    changed: &mut bool,
) -> SQBinaryExpr {
    SQBinaryExpr {
        left: child(rewriter, &expr.left, changed),
        right: child(rewriter, &expr.right, changed),
    }
}
