//! Select projection.
//!
//! Applies select transforms to the metadata columns (display name, query
//! name, roles, type, format, expression, sort), drops the columns a split
//! leaves out, and points every shape at the rewritten columns.

use std::sync::Arc;

use tracing::trace;

use super::options::{DataViewSelectTransform, DataViewSplitTransform, DataViewTransforms};
use crate::data_view::{
    DataView, DataViewCategorical, DataViewHierarchy, DataViewMatrix, DataViewMetadataColumn,
    DataViewTable,
};

/// What happens to one column reference.
pub(crate) enum ColumnRewrite {
    Keep,
    Replace(Arc<DataViewMetadataColumn>),
    Drop,
}

/// Rewrites columns by select index. Each distinct column `Arc` is projected
/// once, so a column shared between metadata and a shape stays shared.
pub(crate) struct SelectProjector<'a> {
    transforms: &'a DataViewTransforms,
    split: Option<&'a DataViewSplitTransform>,
    projected: Vec<(Arc<DataViewMetadataColumn>, Arc<DataViewMetadataColumn>)>,
}

impl<'a> SelectProjector<'a> {
    pub(crate) fn new(
        transforms: &'a DataViewTransforms,
        split: Option<&'a DataViewSplitTransform>,
    ) -> Self {
        Self {
            transforms,
            split,
            projected: Vec::new(),
        }
    }

    pub(crate) fn rewrite(&mut self, column: &Arc<DataViewMetadataColumn>) -> ColumnRewrite {
        let Some(index) = column.index else {
            return ColumnRewrite::Keep;
        };
        if self.split.is_some_and(|split| !split.contains(index)) {
            return ColumnRewrite::Drop;
        }
        let Some(select) = self.transforms.select(index) else {
            return ColumnRewrite::Keep;
        };
        if let Some((_, new)) = self.projected.iter().find(|(old, _)| Arc::ptr_eq(old, column)) {
            return ColumnRewrite::Replace(Arc::clone(new));
        }
        let new = Arc::new(project_column(column, select));
        self.projected.push((Arc::clone(column), Arc::clone(&new)));
        ColumnRewrite::Replace(new)
    }
}

fn project_column(
    column: &DataViewMetadataColumn,
    select: &DataViewSelectTransform,
) -> DataViewMetadataColumn {
    let mut projected = column.clone();
    if !select.display_name.is_empty() {
        projected.display_name = select.display_name.clone();
    }
    if select.query_name.is_some() {
        projected.query_name = select.query_name.clone();
    }
    if select.format.is_some() {
        projected.format = select.format.clone();
    }
    if select.value_type.is_some() {
        projected.value_type = select.value_type;
    }
    if select.expr.is_some() {
        projected.expr = select.expr.clone();
    }
    if select.sort.is_some() {
        projected.sort = select.sort;
    }
    projected.roles = select.roles.clone();
    projected
}

/// Project `prototype` through the select transforms for one split.
pub(crate) fn apply_selects(
    prototype: &DataView,
    transforms: &DataViewTransforms,
    split: Option<&DataViewSplitTransform>,
) -> DataView {
    let mut data_view = prototype.clone();
    let mut projector = SelectProjector::new(transforms, split);
    rewrite_sources(&mut data_view, &mut |c| projector.rewrite(c));
    trace!(columns = data_view.metadata.columns.len(), "applied selects");
    data_view
}

/// Apply `rewrite` to every column reference of `data_view`: metadata
/// columns, categorical sources, matrix level and value sources, table
/// columns and the single column.
pub(crate) fn rewrite_sources(
    data_view: &mut DataView,
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) {
    let metadata = Arc::make_mut(&mut data_view.metadata);
    metadata.columns = rewrite_list(&metadata.columns, rewrite);

    if let Some(categorical) = data_view.categorical.as_mut() {
        rewrite_categorical(Arc::make_mut(categorical), rewrite);
    }
    if let Some(matrix) = data_view.matrix.as_mut() {
        rewrite_matrix(Arc::make_mut(matrix), rewrite);
    }
    if let Some(table) = data_view.table.as_mut() {
        rewrite_table(Arc::make_mut(table), rewrite);
    }
    if let Some(single) = data_view.single.as_mut() {
        if let Some(column) = &single.column {
            if let ColumnRewrite::Replace(new) = rewrite(column) {
                Arc::make_mut(single).column = Some(new);
            }
        }
    }
}

fn rewrite_list(
    columns: &[Arc<DataViewMetadataColumn>],
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) -> Vec<Arc<DataViewMetadataColumn>> {
    columns
        .iter()
        .filter_map(|column| match rewrite(column) {
            ColumnRewrite::Keep => Some(Arc::clone(column)),
            ColumnRewrite::Replace(new) => Some(new),
            ColumnRewrite::Drop => None,
        })
        .collect()
}

/// Replace a column in place; `false` when the column is dropped.
fn rewrite_in_place(
    source: &mut Arc<DataViewMetadataColumn>,
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) -> bool {
    match rewrite(source) {
        ColumnRewrite::Keep => true,
        ColumnRewrite::Replace(new) => {
            *source = new;
            true
        }
        ColumnRewrite::Drop => false,
    }
}

fn rewrite_categorical(
    categorical: &mut DataViewCategorical,
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) {
    if let Some(categories) = categorical.categories.as_mut() {
        categories.retain_mut(|c| rewrite_in_place(&mut c.source, rewrite));
    }
    if categorical.categories.as_ref().is_some_and(|c| c.is_empty()) {
        categorical.categories = None;
    }

    if let Some(values) = categorical.values.as_mut() {
        if let Some(source) = values.source.as_mut() {
            rewrite_in_place(source, rewrite);
        }
        for group in &mut values.groups {
            group.values.retain_mut(|c| rewrite_in_place(&mut c.source, rewrite));
        }
        values.groups.retain(|g| !g.values.is_empty());
    }
}

/// Matrix columns are renamed but never dropped: a matrix split keeps its
/// full hierarchy.
fn rewrite_matrix(
    matrix: &mut DataViewMatrix,
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) {
    fn rewrite_hierarchy(
        hierarchy: &mut DataViewHierarchy,
        rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
    ) {
        for level in &mut hierarchy.levels {
            for source in &mut level.sources {
                rewrite_in_place(source, rewrite);
            }
        }
    }
    rewrite_hierarchy(&mut matrix.rows, rewrite);
    rewrite_hierarchy(&mut matrix.columns, rewrite);
    for source in &mut matrix.value_sources {
        rewrite_in_place(source, rewrite);
    }
}

fn rewrite_table(
    table: &mut DataViewTable,
    rewrite: &mut dyn FnMut(&Arc<DataViewMetadataColumn>) -> ColumnRewrite,
) {
    let mut kept = Vec::with_capacity(table.columns.len());
    for column in &mut table.columns {
        kept.push(rewrite_in_place(column, rewrite));
    }
    if kept.iter().all(|k| *k) {
        return;
    }

    let mut keep = kept.iter();
    table.columns.retain(|_| keep.next().copied().unwrap_or(true));
    for row in &mut table.rows {
        let cells = row
            .iter()
            .zip(&kept)
            .filter(|(_, k)| **k)
            .map(|(cell, _)| cell.clone())
            .collect();
        *row = Arc::new(cells);
    }
}
