//! Canonical short serialization.
//!
//! Produces a compact JSON string that is equal for semantically-equal
//! trees and different otherwise. The string is used as an identity key
//! (scope identities, selectors) and as a cache key.

use serde_json::{json, Map, Value};

use super::fill_rule::{FillRuleDefinition, RuleColorStop};
use super::{SQExpr, SQExprRef};

pub struct SQExprShortSerializer;

impl SQExprShortSerializer {
    pub fn serialize(expr: &SQExpr) -> String {
        Self::to_value(expr).to_string()
    }

    pub fn serialize_array(exprs: &[SQExprRef]) -> String {
        Self::list(exprs).to_string()
    }

    /// JSON form of `expr`. Object keys are emitted sorted, which keeps the
    /// string form deterministic.
    pub fn to_value(expr: &SQExpr) -> Value {
        let v = |e: &SQExprRef| Self::to_value(e);

        match expr {
            SQExpr::Entity(e) => json!({ "e": { "s": e.schema, "e": e.entity } }),
            SQExpr::ColumnRef(e) => json!({ "col": { "s": v(&e.source), "r": e.reference } }),
            SQExpr::MeasureRef(e) => json!({ "measure": { "s": v(&e.source), "r": e.reference } }),
            SQExpr::Aggregation(e) => json!({ "agg": { "a": v(&e.arg), "f": e.func.code() } }),
            SQExpr::Percentile(e) => {
                json!({ "percentile": { "a": v(&e.arg), "k": e.k, "x": e.exclusive } })
            }
            SQExpr::Hierarchy(e) => json!({ "h": { "s": v(&e.arg), "h": e.hierarchy } }),
            SQExpr::HierarchyLevel(e) => json!({ "hL": { "s": v(&e.arg), "l": e.level } }),
            SQExpr::PropertyVariationSource(e) => {
                json!({ "pv": { "s": v(&e.arg), "n": e.name, "p": e.property } })
            }
            SQExpr::SelectRef(e) => json!({ "sr": e.expression_name }),
            SQExpr::And(e) => json!({ "and": { "l": v(&e.left), "r": v(&e.right) } }),
            SQExpr::Or(e) => json!({ "or": { "l": v(&e.left), "r": v(&e.right) } }),
            SQExpr::Not(e) => json!({ "not": v(&e.arg) }),
            SQExpr::Compare(e) => json!({
                "comp": { "k": e.comparison.code(), "l": v(&e.left), "r": v(&e.right) }
            }),
            SQExpr::Between(e) => json!({
                "between": { "a": v(&e.arg), "l": v(&e.lower), "u": v(&e.upper) }
            }),
            SQExpr::In(e) => json!({
                "in": {
                    "a": Self::list(&e.args),
                    "v": e.values.iter().map(|t| Self::list(t)).collect::<Vec<_>>(),
                }
            }),
            SQExpr::Contains(e) => json!({ "contains": { "l": v(&e.left), "r": v(&e.right) } }),
            SQExpr::StartsWith(e) => {
                json!({ "startsWith": { "l": v(&e.left), "r": v(&e.right) } })
            }
            SQExpr::Exists(e) => json!({ "exists": v(&e.arg) }),
            SQExpr::Constant(e) => json!({
                "const": { "t": e.value_type.extended_type().bits(), "v": e.value_encoded }
            }),
            SQExpr::DateSpan(e) => json!({ "ds": { "u": e.unit.code(), "a": v(&e.arg) } }),
            SQExpr::DateAdd(e) => json!({
                "da": { "u": e.unit.code(), "n": e.amount, "a": v(&e.arg) }
            }),
            SQExpr::Now => json!({ "now": {} }),
            SQExpr::DefaultValue => json!({ "dft": {} }),
            SQExpr::AnyValue => json!({ "any": {} }),
            SQExpr::Arithmetic(e) => json!({
                "arith": { "o": e.operator.code(), "l": v(&e.left), "r": v(&e.right) }
            }),
            SQExpr::ScopedEval(e) => json!({
                "scoped": { "e": v(&e.expression), "s": Self::list(&e.scope) }
            }),
            SQExpr::FillRule(e) => json!({
                "fillRule": { "i": v(&e.input), "r": Self::fill_rule_value(&e.rule) }
            }),
            SQExpr::ResourcePackageItem(e) => json!({
                "rpi": { "p": e.package_name, "t": e.package_type, "i": e.item_name }
            }),
        }
    }

    fn list(exprs: &[SQExprRef]) -> Value {
        Value::Array(exprs.iter().map(|e| Self::to_value(e)).collect())
    }

    fn stop_value(stop: &RuleColorStop<SQExprRef, SQExprRef>) -> Value {
        json!({
            "c": Self::to_value(&stop.color),
            "v": stop.value.as_ref().map(|v| Self::to_value(v)),
        })
    }

    fn fill_rule_value(rule: &FillRuleDefinition) -> Value {
        let gradient = if rule.linear_gradient2.is_some() { "g2" } else { "g3" };
        let stops: Vec<Value> = rule.stops().into_iter().map(Self::stop_value).collect();
        let null_coloring = rule.null_coloring_strategy().map(|n| {
            json!({
                "s": Self::to_value(&n.strategy),
                "c": n.color.as_ref().map(|c| Self::to_value(c)),
            })
        });
        let mut map = Map::new();
        map.insert(gradient.to_string(), Value::Array(stops));
        map.insert("n".to_string(), null_coloring.unwrap_or(Value::Null));
        Value::Object(map)
    }
}
