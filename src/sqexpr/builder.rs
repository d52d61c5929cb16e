//! Constructors for expression nodes.

use std::sync::Arc;

use chrono::NaiveDateTime;

use super::encoding;
use super::equality::sq_expr_equals;
use super::*;
use crate::types::{DataValue, ValueType};

/// Factory for [`SQExpr`] nodes. Every constructor returns a shared
/// [`SQExprRef`].
pub struct SQExprBuilder;

impl SQExprBuilder {
    // =========================================================================
    // References
    // =========================================================================

    pub fn entity(
        schema: impl Into<String>,
        entity: impl Into<String>,
        variable: Option<&str>,
    ) -> SQExprRef {
        Arc::new(SQExpr::Entity(SQEntityExpr {
            schema: schema.into(),
            entity: entity.into(),
            variable: variable.map(str::to_string),
        }))
    }

    pub fn column_ref(source: SQExprRef, property: impl Into<String>) -> SQExprRef {
        Arc::new(SQExpr::ColumnRef(SQPropRefExpr {
            source,
            reference: property.into(),
        }))
    }

    pub fn measure_ref(source: SQExprRef, property: impl Into<String>) -> SQExprRef {
        Arc::new(SQExpr::MeasureRef(SQPropRefExpr {
            source,
            reference: property.into(),
        }))
    }

    pub fn aggregate(source: SQExprRef, func: QueryAggregateFunction) -> SQExprRef {
        Arc::new(SQExpr::Aggregation(SQAggregationExpr { arg: source, func }))
    }

    pub fn percentile(source: SQExprRef, k: f64, exclusive: bool) -> SQExprRef {
        Arc::new(SQExpr::Percentile(SQPercentileExpr {
            arg: source,
            k,
            exclusive,
        }))
    }

    pub fn hierarchy(source: SQExprRef, hierarchy: impl Into<String>) -> SQExprRef {
        Arc::new(SQExpr::Hierarchy(SQHierarchyExpr {
            arg: source,
            hierarchy: hierarchy.into(),
        }))
    }

    pub fn hierarchy_level(source: SQExprRef, level: impl Into<String>) -> SQExprRef {
        Arc::new(SQExpr::HierarchyLevel(SQHierarchyLevelExpr {
            arg: source,
            level: level.into(),
        }))
    }

    pub fn property_variation_source(
        source: SQExprRef,
        name: impl Into<String>,
        property: impl Into<String>,
    ) -> SQExprRef {
        Arc::new(SQExpr::PropertyVariationSource(SQPropertyVariationSourceExpr {
            arg: source,
            name: name.into(),
            property: property.into(),
        }))
    }

    pub fn select_ref(expression_name: impl Into<String>) -> SQExprRef {
        Arc::new(SQExpr::SelectRef(SQSelectRefExpr {
            expression_name: expression_name.into(),
        }))
    }

    // =========================================================================
    // Logical
    // =========================================================================

    /// `left AND right`; a missing side yields the other side.
    pub fn and(left: Option<SQExprRef>, right: Option<SQExprRef>) -> Option<SQExprRef> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Arc::new(SQExpr::And(SQBinaryExpr { left, right }))),
            (left, right) => left.or(right),
        }
    }

    /// `left OR right`; two `In` nodes over the same arguments merge into one.
    pub fn or(left: Option<SQExprRef>, right: Option<SQExprRef>) -> Option<SQExprRef> {
        match (left, right) {
            (Some(left), Some(right)) => Some(
                try_use_in_exprs(&left, &right)
                    .unwrap_or_else(|| Arc::new(SQExpr::Or(SQBinaryExpr { left, right }))),
            ),
            (left, right) => left.or(right),
        }
    }

    pub fn not(arg: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::Not(SQUnaryExpr { arg }))
    }

    pub fn exists(arg: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::Exists(SQUnaryExpr { arg }))
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    pub fn compare(comparison: QueryComparisonKind, left: SQExprRef, right: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::Compare(SQCompareExpr {
            comparison,
            left,
            right,
        }))
    }

    pub fn equal(left: SQExprRef, right: SQExprRef) -> SQExprRef {
        Self::compare(QueryComparisonKind::Equal, left, right)
    }

    pub fn between(arg: SQExprRef, lower: SQExprRef, upper: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::Between(SQBetweenExpr { arg, lower, upper }))
    }

    pub fn in_expr(args: Vec<SQExprRef>, values: Vec<Vec<SQExprRef>>) -> SQExprRef {
        debug_assert!(values.iter().all(|tuple| tuple.len() == args.len()));
        Arc::new(SQExpr::In(SQInExpr { args, values }))
    }

    pub fn contains(left: SQExprRef, right: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::Contains(SQBinaryExpr { left, right }))
    }

    pub fn starts_with(left: SQExprRef, right: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::StartsWith(SQBinaryExpr { left, right }))
    }

    // =========================================================================
    // Constants
    // =========================================================================

    fn constant(value_type: ValueType, value: DataValue, value_encoded: String) -> SQExprRef {
        Arc::new(SQExpr::Constant(SQConstantExpr {
            value_type,
            value,
            value_encoded,
        }))
    }

    pub fn text(value: impl Into<String>) -> SQExprRef {
        let value = value.into();
        let encoded = encoding::encode_text(&value);
        Self::constant(ValueType::text(), DataValue::Text(value), encoded)
    }

    pub fn integer(value: i64) -> SQExprRef {
        Self::constant(
            ValueType::integer(),
            DataValue::from(value),
            encoding::encode_integer(value),
        )
    }

    pub fn double(value: f64) -> SQExprRef {
        Self::constant(
            ValueType::double(),
            DataValue::from(value),
            encoding::encode_double(value),
        )
    }

    pub fn decimal(value: f64) -> SQExprRef {
        Self::constant(
            ValueType::decimal(),
            DataValue::from(value),
            encoding::encode_decimal(value),
        )
    }

    pub fn boolean(value: bool) -> SQExprRef {
        Self::constant(
            ValueType::boolean(),
            DataValue::from(value),
            encoding::encode_boolean(value),
        )
    }

    pub fn date_time(value: NaiveDateTime) -> SQExprRef {
        let encoded = encoding::encode_date_time(&value);
        Self::constant(ValueType::date_time(), DataValue::from(value), encoded)
    }

    pub fn null_constant() -> SQExprRef {
        Self::constant(
            ValueType::null(),
            DataValue::Null,
            encoding::NULL_ENCODED.to_string(),
        )
    }

    /// Constant of an explicit type, e.g. an identity key value.
    pub fn typed_constant(value: DataValue, value_type: ValueType) -> SQExprRef {
        if value.is_null() {
            return Self::null_constant();
        }
        let encoded = encoding::encode_value(&value, &value_type);
        Self::constant(value_type, value, encoded)
    }

    /// Constant typed after the runtime value.
    pub fn value(value: DataValue) -> SQExprRef {
        let value_type = value.value_type();
        Self::typed_constant(value, value_type)
    }

    // =========================================================================
    // Dates, arithmetic and the rest
    // =========================================================================

    pub fn date_span(unit: TimeUnit, arg: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::DateSpan(SQDateSpanExpr { unit, arg }))
    }

    pub fn date_add(unit: TimeUnit, amount: i64, arg: SQExprRef) -> SQExprRef {
        Arc::new(SQExpr::DateAdd(SQDateAddExpr { unit, amount, arg }))
    }

    pub fn now() -> SQExprRef {
        Arc::new(SQExpr::Now)
    }

    pub fn default_value() -> SQExprRef {
        Arc::new(SQExpr::DefaultValue)
    }

    pub fn any_value() -> SQExprRef {
        Arc::new(SQExpr::AnyValue)
    }

    pub fn arithmetic(
        left: SQExprRef,
        right: SQExprRef,
        operator: ArithmeticOperatorKind,
    ) -> SQExprRef {
        Arc::new(SQExpr::Arithmetic(SQArithmeticExpr {
            left,
            right,
            operator,
        }))
    }

    pub fn scoped_eval(expression: SQExprRef, scope: Vec<SQExprRef>) -> SQExprRef {
        Arc::new(SQExpr::ScopedEval(SQScopedEvalExpr { expression, scope }))
    }

    pub fn fill_rule(input: SQExprRef, rule: FillRuleDefinition) -> SQExprRef {
        Arc::new(SQExpr::FillRule(SQFillRuleExpr { input, rule }))
    }

    pub fn resource_package_item(
        package_name: impl Into<String>,
        package_type: i32,
        item_name: impl Into<String>,
    ) -> SQExprRef {
        Arc::new(SQExpr::ResourcePackageItem(SQResourcePackageItemExpr {
            package_name: package_name.into(),
            package_type,
            item_name: item_name.into(),
        }))
    }
}

/// Merge two `In` expressions over equal argument lists into one `In` whose
/// tuples are the concatenation of both. `None` when they cannot merge.
pub fn try_use_in_exprs(left: &SQExprRef, right: &SQExprRef) -> Option<SQExprRef> {
    let (SQExpr::In(left), SQExpr::In(right)) = (left.as_ref(), right.as_ref()) else {
        return None;
    };
    if left.args.len() != right.args.len()
        || !left
            .args
            .iter()
            .zip(&right.args)
            .all(|(l, r)| sq_expr_equals(l, r))
    {
        return None;
    }

    let values = left
        .values
        .iter()
        .chain(&right.values)
        .cloned()
        .collect();
    Some(SQExprBuilder::in_expr(left.args.clone(), values))
}
