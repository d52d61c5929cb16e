//! Integration tests for visitors and rewriters.

use std::collections::HashMap;
use std::sync::Arc;

use dataview::sqexpr::utils::{gather_entity_variables, replace_entity_variable};
use dataview::sqexpr::visitor::collect_nodes;
use dataview::sqexpr::{
    rewrite_children, walk_expr, EqualsToInRewriter, QueryAggregateFunction, SQExpr,
    SQExprBuilder, SQExprRef, SQExprRewriter, SQExprVisitor,
};

fn column(entity: &str, name: &str) -> SQExprRef {
    SQExprBuilder::column_ref(SQExprBuilder::entity("s", entity, Some("v")), name)
}

fn eq(name: &str, value: &str) -> SQExprRef {
    SQExprBuilder::equal(column("Sales", name), SQExprBuilder::text(value))
}

fn tree() -> SQExprRef {
    let sum = SQExprBuilder::aggregate(column("Sales", "Amount"), QueryAggregateFunction::Sum);
    let filter = SQExprBuilder::or(Some(eq("Region", "East")), Some(eq("Region", "West")));
    SQExprBuilder::and(
        filter,
        Some(SQExprBuilder::compare(
            dataview::sqexpr::QueryComparisonKind::LessThan,
            sum,
            SQExprBuilder::integer(10),
        )),
    )
    .unwrap()
}

/// Overrides nothing.
struct Identity;
impl SQExprRewriter for Identity {}

/// Replaces every text constant with upper case.
struct UpperText;
impl SQExprRewriter for UpperText {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        match expr.as_ref() {
            SQExpr::Constant(c) => match c.value.as_str() {
                Some(text) => SQExprBuilder::text(text.to_uppercase()),
                None => Arc::clone(expr),
            },
            _ => rewrite_children(self, expr),
        }
    }
}

#[derive(Default)]
struct Counter {
    entered: usize,
    left: usize,
}

impl SQExprVisitor for Counter {
    fn enter(&mut self, _expr: &SQExprRef) -> bool {
        self.entered += 1;
        true
    }

    fn leave(&mut self, _expr: &SQExprRef) {
        self.left += 1;
    }
}

#[test]
fn test_identity_rewriter_returns_input() {
    let expr = tree();
    assert!(Arc::ptr_eq(&Identity.rewrite(&expr), &expr));
}

#[test]
fn test_rewriter_rebuilds_only_changed_paths() {
    let expr = tree();
    let rewritten = UpperText.rewrite(&expr);
    assert!(!Arc::ptr_eq(&expr, &rewritten));

    let (SQExpr::And(before), SQExpr::And(after)) = (expr.as_ref(), rewritten.as_ref()) else {
        panic!("expected And at the root");
    };
    // The comparison holds no text and is shared.
    assert!(Arc::ptr_eq(&before.right, &after.right));
    assert!(!Arc::ptr_eq(&before.left, &after.left));

    let texts: Vec<_> = collect_nodes(&rewritten, |e| matches!(e, SQExpr::Constant(_)))
        .iter()
        .filter_map(|c| c.as_constant().and_then(|c| c.value.as_str().map(str::to_string)))
        .collect();
    assert_eq!(texts, vec!["EAST".to_string(), "WEST".to_string()]);
}

#[test]
fn test_visitor_enters_and_leaves_every_node() {
    let mut counter = Counter::default();
    walk_expr(&mut counter, &tree());
    assert_eq!(counter.entered, counter.left);
    assert_eq!(counter.entered, collect_nodes(&tree(), |_| true).len());
}

#[test]
fn test_equals_to_in() {
    let expr = SQExprBuilder::or(Some(eq("Region", "East")), Some(eq("Region", "West"))).unwrap();
    let rewritten = EqualsToInRewriter::rewrite(&expr);
    let in_expr = rewritten.as_in().unwrap();
    assert_eq!(in_expr.args, vec![column("Sales", "Region")]);
    assert_eq!(
        in_expr.values,
        vec![vec![SQExprBuilder::text("East")], vec![SQExprBuilder::text("West")]]
    );

    // Anything that is not an equality chain is left alone.
    let sum = SQExprBuilder::aggregate(column("Sales", "Amount"), QueryAggregateFunction::Sum);
    assert!(Arc::ptr_eq(&EqualsToInRewriter::rewrite(&sum), &sum));
}

#[test]
fn test_entity_variable_renames() {
    let expr = tree();
    let renames = HashMap::from([("v".to_string(), "w".to_string())]);
    let renamed = replace_entity_variable(&expr, &renames);

    assert_eq!(gather_entity_variables(&renamed).into_iter().collect::<Vec<_>>(), vec!["w"]);
    // Variables are not part of expression identity.
    assert_eq!(renamed, expr);
}
