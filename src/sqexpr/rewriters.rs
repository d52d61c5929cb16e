//! Filter-shape rewriters.

use std::sync::Arc;

use super::equality::sq_expr_equals;
use super::{QueryComparisonKind, SQExpr, SQExprBuilder, SQExprRef};

/// Folds equality filters into a single `In`.
///
/// Accepts an `Or` of tuples, where each tuple is an `And` chain of
/// `field = constant` comparisons (or an existing `In`). Every tuple must
/// constrain the same set of fields. Any other shape leaves the expression
/// untouched.
///
/// ```text
/// (a = 1 AND b = 2) OR (b = 4 AND a = 3)   =>   (a, b) IN ((1, 2), (3, 4))
/// ```
pub struct EqualsToInRewriter;

type Tuple = Vec<(SQExprRef, SQExprRef)>;

impl EqualsToInRewriter {
    pub fn rewrite(expr: &SQExprRef) -> SQExprRef {
        Self::try_rewrite(expr).unwrap_or_else(|| Arc::clone(expr))
    }

    fn try_rewrite(expr: &SQExprRef) -> Option<SQExprRef> {
        let mut tuples: Vec<Tuple> = Vec::new();
        Self::collect_or(expr, &mut tuples)?;

        let args: Vec<SQExprRef> = tuples.first()?.iter().map(|(f, _)| Arc::clone(f)).collect();
        for (i, arg) in args.iter().enumerate() {
            if args[..i].iter().any(|other| sq_expr_equals(other, arg)) {
                return None;
            }
        }

        let mut values = Vec::with_capacity(tuples.len());
        for tuple in &tuples {
            if tuple.len() != args.len() {
                return None;
            }
            let row = args
                .iter()
                .map(|arg| {
                    tuple
                        .iter()
                        .find(|(field, _)| sq_expr_equals(field, arg))
                        .map(|(_, value)| Arc::clone(value))
                })
                .collect::<Option<Vec<_>>>()?;
            values.push(row);
        }

        Some(SQExprBuilder::in_expr(args, values))
    }

    fn collect_or(expr: &SQExprRef, tuples: &mut Vec<Tuple>) -> Option<()> {
        match expr.as_ref() {
            SQExpr::Or(e) => {
                Self::collect_or(&e.left, tuples)?;
                Self::collect_or(&e.right, tuples)
            }
            SQExpr::In(e) => {
                for row in &e.values {
                    tuples.push(e.args.iter().cloned().zip(row.iter().cloned()).collect());
                }
                Some(())
            }
            _ => {
                let mut tuple = Tuple::new();
                Self::collect_and(expr, &mut tuple)?;
                tuples.push(tuple);
                Some(())
            }
        }
    }

    fn collect_and(expr: &SQExprRef, tuple: &mut Tuple) -> Option<()> {
        match expr.as_ref() {
            SQExpr::And(e) => {
                Self::collect_and(&e.left, tuple)?;
                Self::collect_and(&e.right, tuple)
            }
            SQExpr::Compare(e) if e.comparison == QueryComparisonKind::Equal => {
                let (field, value) = match (e.left.as_constant(), e.right.as_constant()) {
                    (None, Some(_)) => (&e.left, &e.right),
                    (Some(_), None) => (&e.right, &e.left),
                    _ => return None,
                };
                tuple.push((Arc::clone(field), Arc::clone(value)));
                Some(())
            }
            _ => None,
        }
    }
}
