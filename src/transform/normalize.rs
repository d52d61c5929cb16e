//! Variant-value normalization.
//!
//! A column bound to a role with `required_types` may still carry values of
//! other runtime types (a numeric role receiving a date, say). Those values
//! are replaced by null in every shape. Only the arrays and nodes that
//! actually hold a rejected value are copied.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::VisualDataRole;
use crate::data_view::{
    DataView, DataViewHierarchy, DataViewMatrixNode, DataViewMetadata, DataViewMetadataColumn,
    DataViewTreeNode,
};
use crate::types::DataValue;

pub(crate) struct Normalizer<'a> {
    roles: Vec<&'a VisualDataRole>,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(roles: &'a [VisualDataRole]) -> Self {
        Self {
            roles: roles.iter().filter(|r| r.required_types.is_some()).collect(),
        }
    }

    fn accepts(&self, column: &DataViewMetadataColumn, value: &DataValue) -> bool {
        if value.is_null() {
            return true;
        }
        let value_type = value.value_type();
        self.roles
            .iter()
            .filter(|role| column.has_role(&role.name))
            .all(|role| role.accepts(&value_type))
    }

    fn constrains(&self, column: &DataViewMetadataColumn) -> bool {
        self.roles.iter().any(|role| column.has_role(&role.name))
    }

    /// A copy of `values` with rejected entries nulled, or `None` when every
    /// value is accepted.
    fn nulled(
        &self,
        column: &DataViewMetadataColumn,
        values: &Arc<Vec<DataValue>>,
    ) -> Option<Arc<Vec<DataValue>>> {
        if !self.constrains(column) || values.iter().all(|v| self.accepts(column, v)) {
            return None;
        }
        let normalized = values
            .iter()
            .map(|v| if self.accepts(column, v) { v.clone() } else { DataValue::Null })
            .collect();
        Some(Arc::new(normalized))
    }

    /// Null out rejected values across every shape of `data_view`.
    pub(crate) fn apply(&self, data_view: &mut DataView) {
        if self.roles.is_empty() {
            return;
        }
        self.normalize_categorical(data_view);
        self.normalize_table(data_view);
        self.normalize_tree(data_view);
        self.normalize_matrix(data_view);
        self.normalize_single(data_view);
    }

    fn normalize_categorical(&self, data_view: &mut DataView) {
        let Some(categorical) = data_view.categorical.as_mut() else {
            return;
        };

        let category_updates: Vec<_> = categorical
            .categories
            .iter()
            .flatten()
            .enumerate()
            .filter_map(|(i, c)| Some((i, self.nulled(&c.source, &c.values)?)))
            .collect();
        let mut value_updates = Vec::new();
        for (g, group) in categorical.values.iter().flat_map(|v| v.groups.iter()).enumerate() {
            for (c, column) in group.values.iter().enumerate() {
                let values = self.nulled(&column.source, &column.values);
                let highlights = column
                    .highlights
                    .as_ref()
                    .and_then(|h| self.nulled(&column.source, h));
                if values.is_some() || highlights.is_some() {
                    value_updates.push((g, c, values, highlights));
                }
            }
        }
        if category_updates.is_empty() && value_updates.is_empty() {
            return;
        }

        let categorical = Arc::make_mut(categorical);
        if let Some(categories) = categorical.categories.as_mut() {
            for (i, values) in category_updates {
                categories[i].values = values;
            }
        }
        if let Some(columns) = categorical.values.as_mut() {
            for (g, c, values, highlights) in value_updates {
                let column = &mut columns.groups[g].values[c];
                if let Some(values) = values {
                    column.values = values;
                }
                if highlights.is_some() {
                    column.highlights = highlights;
                }
            }
        }
        debug!("normalized categorical values");
    }

    fn normalize_table(&self, data_view: &mut DataView) {
        let Some(table) = data_view.table.as_mut() else {
            return;
        };
        let updates: Vec<_> = table
            .rows
            .iter()
            .enumerate()
            .filter_map(|(r, row)| {
                let rejected = row
                    .iter()
                    .zip(&table.columns)
                    .any(|(cell, column)| !self.accepts(column, cell));
                rejected.then(|| {
                    let cells = row
                        .iter()
                        .zip(&table.columns)
                        .map(|(cell, column)| {
                            if self.accepts(column, cell) { cell.clone() } else { DataValue::Null }
                        })
                        .collect();
                    (r, Arc::new(cells))
                })
            })
            .collect();
        if updates.is_empty() {
            return;
        }
        let table = Arc::make_mut(table);
        for (r, row) in updates {
            table.rows[r] = row;
        }
        debug!("normalized table values");
    }

    fn normalize_tree(&self, data_view: &mut DataView) {
        let root = match data_view.tree.as_ref() {
            Some(tree) => self.tree_node(&data_view.metadata, &tree.root),
            None => return,
        };
        if let (Some(root), Some(tree)) = (root, data_view.tree.as_mut()) {
            Arc::make_mut(tree).root = root;
            debug!("normalized tree values");
        }
    }

    /// Normalized copy of a tree node, `None` when the subtree is unchanged.
    /// Node values are keyed by metadata column index.
    fn tree_node(
        &self,
        metadata: &DataViewMetadata,
        node: &Arc<DataViewTreeNode>,
    ) -> Option<Arc<DataViewTreeNode>> {
        let rejected: Vec<usize> = node
            .values
            .iter()
            .filter(|(index, value)| {
                metadata
                    .column_by_index(**index)
                    .is_some_and(|column| !self.accepts(column, &value.value))
            })
            .map(|(index, _)| *index)
            .collect();
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| self.tree_node(metadata, child))
            .collect();
        if rejected.is_empty() && children.iter().all(Option::is_none) {
            return None;
        }

        let mut copy = (**node).clone();
        for index in rejected {
            if let Some(value) = copy.values.get_mut(&index) {
                value.value = DataValue::Null;
            }
        }
        if let Some(existing) = copy.children.as_mut() {
            for (slot, child) in existing.iter_mut().zip(children) {
                if let Some(child) = child {
                    *slot = child;
                }
            }
        }
        Some(Arc::new(copy))
    }

    fn normalize_matrix(&self, data_view: &mut DataView) {
        let Some(matrix) = data_view.matrix.as_ref() else {
            return;
        };
        let rows = self.matrix_node(&matrix.rows.root, &matrix.rows, &matrix.value_sources);
        let columns = self.matrix_node(&matrix.columns.root, &matrix.columns, &[]);
        if rows.is_none() && columns.is_none() {
            return;
        }
        if let Some(matrix) = data_view.matrix.as_mut() {
            let matrix = Arc::make_mut(matrix);
            if let Some(root) = rows {
                matrix.rows.root = root;
            }
            if let Some(root) = columns {
                matrix.columns.root = root;
            }
            debug!("normalized matrix values");
        }
    }

    /// Normalized copy of a matrix node. Header values are checked against
    /// their level source and cell values against their value source.
    fn matrix_node(
        &self,
        node: &Arc<DataViewMatrixNode>,
        hierarchy: &DataViewHierarchy,
        value_sources: &[Arc<DataViewMetadataColumn>],
    ) -> Option<Arc<DataViewMatrixNode>> {
        let header_source = node.level.and_then(|level| {
            hierarchy
                .levels
                .get(level)?
                .sources
                .get(node.level_source_index.unwrap_or(0))
        });
        let header_rejected = match (header_source, &node.value) {
            (Some(source), Some(value)) => !self.accepts(source, value),
            _ => false,
        };
        let rejected_cells: Vec<usize> = node
            .values
            .iter()
            .flatten()
            .filter(|(_, value)| {
                value_sources
                    .get(value.value_source_index())
                    .is_some_and(|source| !self.accepts(source, &value.value))
            })
            .map(|(key, _)| *key)
            .collect();
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| self.matrix_node(child, hierarchy, value_sources))
            .collect();
        if !header_rejected && rejected_cells.is_empty() && children.iter().all(Option::is_none) {
            return None;
        }

        let mut copy = (**node).clone();
        if header_rejected {
            copy.value = Some(DataValue::Null);
        }
        if let Some(values) = copy.values.as_mut() {
            for key in rejected_cells {
                if let Some(value) = values.get_mut(&key) {
                    value.value = DataValue::Null;
                }
            }
        }
        if let Some(existing) = copy.children.as_mut() {
            for (slot, child) in existing.iter_mut().zip(children) {
                if let Some(child) = child {
                    *slot = child;
                }
            }
        }
        Some(Arc::new(copy))
    }

    fn normalize_single(&self, data_view: &mut DataView) {
        let Some(single) = data_view.single.as_mut() else {
            return;
        };
        let rejected = single
            .column
            .as_ref()
            .is_some_and(|column| !self.accepts(column, &single.value));
        if rejected {
            Arc::make_mut(single).value = DataValue::Null;
            debug!("normalized single value");
        }
    }
}
