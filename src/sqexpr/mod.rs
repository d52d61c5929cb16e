//! Semantic query expressions.
//!
//! [`SQExpr`] is an immutable expression tree describing references into a
//! conceptual schema (entities, columns, measures, hierarchies) and the
//! operations applied to them (aggregation, comparison, arithmetic, filter
//! predicates, fill rules).
//!
//! Nodes are shared through [`SQExprRef`] (`Arc<SQExpr>`) and never mutated.
//! Every edit produces a new tree through an [`SQExprRewriter`], which only
//! reconstructs the nodes whose children actually changed; untouched subtrees
//! keep their identity, so `Arc::ptr_eq` is a valid "did anything change" test.
//!
//! Semantic equality is structural ([`sq_expr_equals`]) and is what
//! `PartialEq` for `SQExpr` implements.

pub mod builder;
pub mod encoding;
pub mod equality;
pub mod fill_rule;
pub mod metadata;
pub mod rewriters;
pub mod serializer;
pub mod utils;
pub mod validation;
pub mod visitor;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{DataValue, ValueType};

pub use builder::SQExprBuilder;
pub use equality::{sq_expr_equals, sq_expr_equals_ignore_case};
pub use fill_rule::{
    FillRule, FillRuleDefinition, LinearGradient2, LinearGradient3, NullColoringStrategy,
    RuleColorStop,
};
pub use metadata::{get_metadata, FieldKind, SQExprMetadata};
pub use rewriters::EqualsToInRewriter;
pub use serializer::SQExprShortSerializer;
pub use validation::{validate_expr, SQExprValidationError};
pub use visitor::{rewrite_children, walk_expr, SQExprRewriter, SQExprVisitor};

/// Shared handle to an immutable expression node.
pub type SQExprRef = Arc<SQExpr>;

// =============================================================================
// Enumerations
// =============================================================================

/// Closed set of expression kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SQExprKind {
    Entity,
    ColumnRef,
    MeasureRef,
    Aggregation,
    Percentile,
    Hierarchy,
    HierarchyLevel,
    PropertyVariationSource,
    SelectRef,
    And,
    Or,
    Not,
    Compare,
    Between,
    In,
    Contains,
    StartsWith,
    Exists,
    Constant,
    DateSpan,
    DateAdd,
    Now,
    DefaultValue,
    AnyValue,
    Arithmetic,
    ScopedEval,
    FillRule,
    ResourcePackageItem,
}

/// Aggregate functions a query can apply to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueryAggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    CountNonNull,
    Median,
    StandardDeviation,
    Variance,
}

impl QueryAggregateFunction {
    pub const fn code(self) -> u8 {
        match self {
            QueryAggregateFunction::Sum => 0,
            QueryAggregateFunction::Avg => 1,
            QueryAggregateFunction::Count => 2,
            QueryAggregateFunction::Min => 3,
            QueryAggregateFunction::Max => 4,
            QueryAggregateFunction::CountNonNull => 5,
            QueryAggregateFunction::Median => 6,
            QueryAggregateFunction::StandardDeviation => 7,
            QueryAggregateFunction::Variance => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryComparisonKind {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl QueryComparisonKind {
    pub const fn code(self) -> u8 {
        match self {
            QueryComparisonKind::Equal => 0,
            QueryComparisonKind::GreaterThan => 1,
            QueryComparisonKind::GreaterThanOrEqual => 2,
            QueryComparisonKind::LessThan => 3,
            QueryComparisonKind::LessThanOrEqual => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
    Decade,
    Second,
    Minute,
    Hour,
}

impl TimeUnit {
    pub const fn code(self) -> u8 {
        match self {
            TimeUnit::Day => 0,
            TimeUnit::Week => 1,
            TimeUnit::Month => 2,
            TimeUnit::Year => 3,
            TimeUnit::Decade => 4,
            TimeUnit::Second => 5,
            TimeUnit::Minute => 6,
            TimeUnit::Hour => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOperatorKind {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOperatorKind {
    pub const fn code(self) -> u8 {
        match self {
            ArithmeticOperatorKind::Add => 0,
            ArithmeticOperatorKind::Subtract => 1,
            ArithmeticOperatorKind::Multiply => 2,
            ArithmeticOperatorKind::Divide => 3,
        }
    }
}

// =============================================================================
// Node payloads
// =============================================================================

/// Reference to an entity (table) of a conceptual schema.
///
/// `variable` is the short alias the entity has in an enclosing `SQFrom`;
/// it is not part of the entity's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SQEntityExpr {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
}

/// Column or measure reference on a source (usually an entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQPropRefExpr {
    pub source: SQExprRef,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQAggregationExpr {
    pub arg: SQExprRef,
    pub func: QueryAggregateFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQPercentileExpr {
    pub arg: SQExprRef,
    pub k: f64,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQHierarchyExpr {
    pub arg: SQExprRef,
    pub hierarchy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQHierarchyLevelExpr {
    pub arg: SQExprRef,
    pub level: String,
}

/// A variation (e.g. a date table) reached through a column of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQPropertyVariationSourceExpr {
    pub arg: SQExprRef,
    pub name: String,
    pub property: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SQSelectRefExpr {
    pub expression_name: String,
}

/// Payload shared by `And`, `Or`, `Contains` and `StartsWith`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQBinaryExpr {
    pub left: SQExprRef,
    pub right: SQExprRef,
}

/// Payload shared by `Not` and `Exists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQUnaryExpr {
    pub arg: SQExprRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQCompareExpr {
    pub comparison: QueryComparisonKind,
    pub left: SQExprRef,
    pub right: SQExprRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQBetweenExpr {
    pub arg: SQExprRef,
    pub lower: SQExprRef,
    pub upper: SQExprRef,
}

/// `args IN values`, where each entry of `values` is a tuple matching `args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQInExpr {
    pub args: Vec<SQExprRef>,
    pub values: Vec<Vec<SQExprRef>>,
}

/// A literal. `value_encoded` is the canonical text form used for equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SQConstantExpr {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: DataValue,
    pub value_encoded: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQDateSpanExpr {
    pub unit: TimeUnit,
    pub arg: SQExprRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQDateAddExpr {
    pub unit: TimeUnit,
    pub amount: i64,
    pub arg: SQExprRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQArithmeticExpr {
    pub left: SQExprRef,
    pub right: SQExprRef,
    pub operator: ArithmeticOperatorKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQScopedEvalExpr {
    pub expression: SQExprRef,
    pub scope: Vec<SQExprRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SQFillRuleExpr {
    pub input: SQExprRef,
    pub rule: FillRuleDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SQResourcePackageItemExpr {
    pub package_name: String,
    pub package_type: i32,
    pub item_name: String,
}

// =============================================================================
// Expression
// =============================================================================

/// Semantic query expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SQExpr {
    Entity(SQEntityExpr),
    ColumnRef(SQPropRefExpr),
    MeasureRef(SQPropRefExpr),
    Aggregation(SQAggregationExpr),
    Percentile(SQPercentileExpr),
    Hierarchy(SQHierarchyExpr),
    HierarchyLevel(SQHierarchyLevelExpr),
    PropertyVariationSource(SQPropertyVariationSourceExpr),
    SelectRef(SQSelectRefExpr),
    And(SQBinaryExpr),
    Or(SQBinaryExpr),
    Not(SQUnaryExpr),
    Compare(SQCompareExpr),
    Between(SQBetweenExpr),
    In(SQInExpr),
    Contains(SQBinaryExpr),
    StartsWith(SQBinaryExpr),
    Exists(SQUnaryExpr),
    Constant(SQConstantExpr),
    DateSpan(SQDateSpanExpr),
    DateAdd(SQDateAddExpr),
    Now,
    DefaultValue,
    AnyValue,
    Arithmetic(SQArithmeticExpr),
    ScopedEval(SQScopedEvalExpr),
    FillRule(SQFillRuleExpr),
    ResourcePackageItem(SQResourcePackageItemExpr),
}

impl SQExpr {
    pub fn kind(&self) -> SQExprKind {
        match self {
            SQExpr::Entity(_) => SQExprKind::Entity,
            SQExpr::ColumnRef(_) => SQExprKind::ColumnRef,
            SQExpr::MeasureRef(_) => SQExprKind::MeasureRef,
            SQExpr::Aggregation(_) => SQExprKind::Aggregation,
            SQExpr::Percentile(_) => SQExprKind::Percentile,
            SQExpr::Hierarchy(_) => SQExprKind::Hierarchy,
            SQExpr::HierarchyLevel(_) => SQExprKind::HierarchyLevel,
            SQExpr::PropertyVariationSource(_) => SQExprKind::PropertyVariationSource,
            SQExpr::SelectRef(_) => SQExprKind::SelectRef,
            SQExpr::And(_) => SQExprKind::And,
            SQExpr::Or(_) => SQExprKind::Or,
            SQExpr::Not(_) => SQExprKind::Not,
            SQExpr::Compare(_) => SQExprKind::Compare,
            SQExpr::Between(_) => SQExprKind::Between,
            SQExpr::In(_) => SQExprKind::In,
            SQExpr::Contains(_) => SQExprKind::Contains,
            SQExpr::StartsWith(_) => SQExprKind::StartsWith,
            SQExpr::Exists(_) => SQExprKind::Exists,
            SQExpr::Constant(_) => SQExprKind::Constant,
            SQExpr::DateSpan(_) => SQExprKind::DateSpan,
            SQExpr::DateAdd(_) => SQExprKind::DateAdd,
            SQExpr::Now => SQExprKind::Now,
            SQExpr::DefaultValue => SQExprKind::DefaultValue,
            SQExpr::AnyValue => SQExprKind::AnyValue,
            SQExpr::Arithmetic(_) => SQExprKind::Arithmetic,
            SQExpr::ScopedEval(_) => SQExprKind::ScopedEval,
            SQExpr::FillRule(_) => SQExprKind::FillRule,
            SQExpr::ResourcePackageItem(_) => SQExprKind::ResourcePackageItem,
        }
    }

    /// Direct children in a fixed, kind-specific order.
    pub fn children(&self) -> Vec<&SQExprRef> {
        match self {
            SQExpr::Entity(_)
            | SQExpr::SelectRef(_)
            | SQExpr::Constant(_)
            | SQExpr::Now
            | SQExpr::DefaultValue
            | SQExpr::AnyValue
            | SQExpr::ResourcePackageItem(_) => Vec::new(),
            SQExpr::ColumnRef(e) | SQExpr::MeasureRef(e) => vec![&e.source],
            SQExpr::Aggregation(e) => vec![&e.arg],
            SQExpr::Percentile(e) => vec![&e.arg],
            SQExpr::Hierarchy(e) => vec![&e.arg],
            SQExpr::HierarchyLevel(e) => vec![&e.arg],
            SQExpr::PropertyVariationSource(e) => vec![&e.arg],
            SQExpr::And(e) | SQExpr::Or(e) | SQExpr::Contains(e) | SQExpr::StartsWith(e) => {
                vec![&e.left, &e.right]
            }
            SQExpr::Not(e) | SQExpr::Exists(e) => vec![&e.arg],
            SQExpr::Compare(e) => vec![&e.left, &e.right],
            SQExpr::Between(e) => vec![&e.arg, &e.lower, &e.upper],
            SQExpr::In(e) => e
                .args
                .iter()
                .chain(e.values.iter().flatten())
                .collect(),
            SQExpr::DateSpan(e) => vec![&e.arg],
            SQExpr::DateAdd(e) => vec![&e.arg],
            SQExpr::Arithmetic(e) => vec![&e.left, &e.right],
            SQExpr::ScopedEval(e) => std::iter::once(&e.expression).chain(e.scope.iter()).collect(),
            SQExpr::FillRule(e) => std::iter::once(&e.input).chain(e.rule.exprs()).collect(),
        }
    }

    pub fn as_entity(&self) -> Option<&SQEntityExpr> {
        match self {
            SQExpr::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&SQConstantExpr> {
        match self {
            SQExpr::Constant(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_column_ref(&self) -> Option<&SQPropRefExpr> {
        match self {
            SQExpr::ColumnRef(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_in(&self) -> Option<&SQInExpr> {
        match self {
            SQExpr::In(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_compare(&self) -> Option<&SQCompareExpr> {
        match self {
            SQExpr::Compare(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_fill_rule(&self) -> Option<&SQFillRuleExpr> {
        match self {
            SQExpr::FillRule(e) => Some(e),
            _ => None,
        }
    }

    /// Expressions that denote a single groupable field.
    pub fn is_field(&self) -> bool {
        matches!(
            self,
            SQExpr::ColumnRef(_) | SQExpr::HierarchyLevel(_) | SQExpr::PropertyVariationSource(_)
        )
    }

    pub fn is_measure(&self) -> bool {
        matches!(
            self,
            SQExpr::MeasureRef(_) | SQExpr::Aggregation(_) | SQExpr::Percentile(_)
        )
    }

    /// Canonical key; equal for semantically-equal trees.
    pub fn short_key(&self) -> String {
        SQExprShortSerializer::serialize(self)
    }
}

impl PartialEq for SQExpr {
    fn eq(&self, other: &Self) -> bool {
        sq_expr_equals(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_children() {
        let entity = SQExprBuilder::entity("s", "Sales", None);
        let column = SQExprBuilder::column_ref(entity.clone(), "Amount");
        let sum = SQExprBuilder::aggregate(column.clone(), QueryAggregateFunction::Sum);

        assert_eq!(sum.kind(), SQExprKind::Aggregation);
        assert_eq!(sum.children().len(), 1);
        assert!(Arc::ptr_eq(sum.children()[0], &column));
        assert!(column.is_field());
        assert!(sum.is_measure());
    }

    #[test]
    fn test_in_children_include_values() {
        let column = SQExprBuilder::column_ref(SQExprBuilder::entity("s", "e", None), "c");
        let in_expr = SQExprBuilder::in_expr(
            vec![column],
            vec![vec![SQExprBuilder::text("a")], vec![SQExprBuilder::text("b")]],
        );
        assert_eq!(in_expr.children().len(), 3);
    }
}
