//! Evaluation contexts for object-property expressions.
//!
//! A context answers "what is the value of this expression here". The
//! categorical and table contexts are row indexed: call
//! `set_current_row_index` before `get_expr_value`. The static context only
//! knows constants. The matrix context does not resolve expressions against
//! matrix cells and falls back to static evaluation.

use std::sync::Arc;

use super::color::GradientColorAllocator;
use crate::cache::ColorAllocatorCache;
use crate::data_view::{DataViewCategorical, DataViewMatrix, DataViewMetadata, DataViewTable};
use crate::sqexpr::{sq_expr_equals, SQExprRef};
use crate::types::DataValue;

pub trait EvalContext {
    /// Value of `expr` in the current scope; `None` when it cannot be
    /// resolved here.
    fn get_expr_value(&self, expr: &SQExprRef) -> Option<DataValue>;

    /// Move to row `index`. A no-op for contexts without rows.
    fn set_current_row_index(&mut self, _index: usize) {}

    /// Gradient allocator for a `FillRule` expression.
    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>>;
}

/// What every context shares: the DataView metadata (for fill-rule ranges)
/// and the color allocator cache of the current run.
pub struct EvalResources<'a> {
    pub metadata: &'a DataViewMetadata,
    pub colors: &'a mut ColorAllocatorCache,
    pub null_color: &'a str,
}

impl<'a> EvalResources<'a> {
    pub fn new(
        metadata: &'a DataViewMetadata,
        colors: &'a mut ColorAllocatorCache,
        null_color: &'a str,
    ) -> Self {
        Self {
            metadata,
            colors,
            null_color,
        }
    }

    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>> {
        self.colors.get_or_create(rule, self.metadata, self.null_color)
    }
}

fn constant_value(expr: &SQExprRef) -> Option<DataValue> {
    expr.as_constant().map(|c| c.value.clone())
}

// =============================================================================
// Static
// =============================================================================

pub struct StaticEvalContext<'a> {
    resources: EvalResources<'a>,
}

impl<'a> StaticEvalContext<'a> {
    pub fn new(resources: EvalResources<'a>) -> Self {
        Self { resources }
    }
}

impl EvalContext for StaticEvalContext<'_> {
    fn get_expr_value(&self, expr: &SQExprRef) -> Option<DataValue> {
        constant_value(expr)
    }

    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>> {
        self.resources.color_allocator(rule)
    }
}

// =============================================================================
// Categorical
// =============================================================================

pub struct CategoricalEvalContext<'a> {
    resources: EvalResources<'a>,
    categorical: &'a DataViewCategorical,
    row: usize,
}

impl<'a> CategoricalEvalContext<'a> {
    pub fn new(resources: EvalResources<'a>, categorical: &'a DataViewCategorical) -> Self {
        Self {
            resources,
            categorical,
            row: 0,
        }
    }
}

impl EvalContext for CategoricalEvalContext<'_> {
    /// Constants, then category columns, then value columns whose source
    /// expression equals `expr`.
    fn get_expr_value(&self, expr: &SQExprRef) -> Option<DataValue> {
        if let Some(value) = constant_value(expr) {
            return Some(value);
        }
        let same = |source: &Option<SQExprRef>| {
            source.as_ref().is_some_and(|e| sq_expr_equals(e, expr))
        };

        let category = self
            .categorical
            .categories
            .iter()
            .flatten()
            .find(|c| same(&c.source.expr))
            .map(|c| &c.values);
        let values = category.or_else(|| {
            self.categorical
                .values
                .as_ref()?
                .columns()
                .find(|c| same(&c.source.expr))
                .map(|c| &c.values)
        })?;
        values.get(self.row).cloned()
    }

    fn set_current_row_index(&mut self, index: usize) {
        self.row = index;
    }

    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>> {
        self.resources.color_allocator(rule)
    }
}

// =============================================================================
// Table
// =============================================================================

pub struct TableEvalContext<'a> {
    resources: EvalResources<'a>,
    table: &'a DataViewTable,
    row: usize,
}

impl<'a> TableEvalContext<'a> {
    pub fn new(resources: EvalResources<'a>, table: &'a DataViewTable) -> Self {
        Self {
            resources,
            table,
            row: 0,
        }
    }
}

impl EvalContext for TableEvalContext<'_> {
    fn get_expr_value(&self, expr: &SQExprRef) -> Option<DataValue> {
        if let Some(value) = constant_value(expr) {
            return Some(value);
        }
        let column = self.table.columns.iter().position(|c| {
            c.expr.as_ref().is_some_and(|e| sq_expr_equals(e, expr))
        })?;
        self.table.cell(self.row, column).cloned()
    }

    fn set_current_row_index(&mut self, index: usize) {
        self.row = index;
    }

    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>> {
        self.resources.color_allocator(rule)
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// Matrix scopes evaluate statically: expressions are not resolved against
/// the matrix cells, so only constants (and fill rules over them) produce
/// values.
pub struct MatrixEvalContext<'a> {
    inner: StaticEvalContext<'a>,
    matrix: &'a DataViewMatrix,
}

impl<'a> MatrixEvalContext<'a> {
    pub fn new(resources: EvalResources<'a>, matrix: &'a DataViewMatrix) -> Self {
        Self {
            inner: StaticEvalContext::new(resources),
            matrix,
        }
    }

    pub fn matrix(&self) -> &DataViewMatrix {
        self.matrix
    }
}

impl EvalContext for MatrixEvalContext<'_> {
    fn get_expr_value(&self, expr: &SQExprRef) -> Option<DataValue> {
        self.inner.get_expr_value(expr)
    }

    fn color_allocator(&mut self, rule: &SQExprRef) -> Option<Arc<GradientColorAllocator>> {
        self.inner.color_allocator(rule)
    }
}
