//! Projection-order reordering.
//!
//! A role's `ordering` lists select indices in the order the user arranged
//! them. The query may return them in another order. Matrix composite
//! levels (several sources sharing a role on one level) and table columns
//! are put back in projection order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::data_view::{
    DataViewHierarchy, DataViewMatrix, DataViewMatrixNode, DataViewMetadataColumn, DataViewTable,
};

type Ordering = BTreeMap<String, Vec<usize>>;

fn position_in(ordering: &[usize], column: &DataViewMetadataColumn) -> usize {
    column
        .index
        .and_then(|index| ordering.iter().position(|&o| o == index))
        .unwrap_or(usize::MAX)
}

/// The role shared by every source of a composite level, with its ordering.
fn composite_ordering<'o>(
    sources: &[Arc<DataViewMetadataColumn>],
    ordering: &'o Ordering,
) -> Option<&'o [usize]> {
    if sources.len() < 2 {
        return None;
    }
    ordering
        .iter()
        .find(|(role, _)| sources.iter().all(|s| s.has_role(role)))
        .map(|(_, order)| order.as_slice())
}

/// Reorder the composite levels of both matrix hierarchies, deepest level
/// first.
pub(crate) fn reorder_matrix(matrix: &mut DataViewMatrix, ordering: &Ordering) {
    reorder_hierarchy(&mut matrix.rows, ordering);
    reorder_hierarchy(&mut matrix.columns, ordering);
}

fn reorder_hierarchy(hierarchy: &mut DataViewHierarchy, ordering: &Ordering) {
    for level in (0..hierarchy.levels.len()).rev() {
        let sources = &hierarchy.levels[level].sources;
        let Some(order) = composite_ordering(sources, ordering) else {
            continue;
        };
        let mut permutation: Vec<usize> = (0..sources.len()).collect();
        permutation.sort_by_key(|&i| position_in(order, &sources[i]));
        if permutation.iter().enumerate().all(|(new, &old)| new == old) {
            continue;
        }

        // old source index -> new source index
        let mut remap = vec![0; permutation.len()];
        for (new, &old) in permutation.iter().enumerate() {
            remap[old] = new;
        }
        let reordered = permutation
            .iter()
            .map(|&old| Arc::clone(&hierarchy.levels[level].sources[old]))
            .collect();
        hierarchy.levels[level].sources = reordered;
        remap_level(&mut hierarchy.root, level, &remap);
        debug!(level, "reordered composite matrix level");
    }
}

fn remap_level(node: &mut Arc<DataViewMatrixNode>, level: usize, remap: &[usize]) {
    let node = Arc::make_mut(node);
    if node.level == Some(level) {
        let map = |index: Option<usize>| index.map(|i| remap.get(i).copied().unwrap_or(i));
        node.level_source_index = map(node.level_source_index);
        if let Some(level_values) = node.level_values.as_mut() {
            for value in level_values.iter_mut() {
                value.level_source_index = map(value.level_source_index);
            }
            level_values.sort_by_key(|v| v.level_source_index);
        }
        return;
    }
    for child in node.children.iter_mut().flatten() {
        remap_level(child, level, remap);
    }
}

/// Put table columns of each ordered role in projection order within the
/// slots they occupy, moving the cells along.
pub(crate) fn reorder_table(table: &mut DataViewTable, ordering: &Ordering) {
    let mut permutation: Vec<usize> = (0..table.columns.len()).collect();
    for (role, order) in ordering {
        let slots: Vec<usize> = (0..table.columns.len())
            .filter(|&i| table.columns[permutation[i]].has_role(role))
            .collect();
        if slots.len() < 2 {
            continue;
        }
        let mut occupants: Vec<usize> = slots.iter().map(|&slot| permutation[slot]).collect();
        occupants.sort_by_key(|&column| position_in(order, &table.columns[column]));
        for (slot, column) in slots.into_iter().zip(occupants) {
            permutation[slot] = column;
        }
    }
    if permutation.iter().enumerate().all(|(slot, &column)| slot == column) {
        return;
    }

    let columns = permutation.iter().map(|&c| Arc::clone(&table.columns[c])).collect();
    table.columns = columns;
    for row in &mut table.rows {
        let cells = permutation
            .iter()
            .map(|&c| row.get(c).cloned().unwrap_or_default())
            .collect();
        *row = Arc::new(cells);
    }
    debug!(?permutation, "reordered table columns");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_view::{DataViewHierarchyLevel, DataViewMatrixLevelValue};
    use crate::types::DataValue;

    fn column(name: &str, index: usize, role: &str) -> Arc<DataViewMetadataColumn> {
        Arc::new(DataViewMetadataColumn::new(name).with_index(index).with_role(role))
    }

    #[test]
    fn test_table_columns_follow_ordering() {
        let mut table = DataViewTable::new(
            vec![column("A", 0, "Values"), column("Key", 2, "Rows"), column("B", 1, "Values")],
            vec![vec![1.into(), "k".into(), 2.into()]],
        );
        let ordering = [("Values".to_string(), vec![1, 0])].into_iter().collect();
        reorder_table(&mut table, &ordering);

        let names: Vec<_> = table.columns.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["B", "Key", "A"]);
        assert_eq!(*table.rows[0], vec![DataValue::from(2), "k".into(), 1.into()]);
    }

    #[test]
    fn test_composite_level_reordered() {
        let first = column("First", 0, "Rows");
        let second = column("Second", 1, "Rows");
        let node = DataViewMatrixNode {
            level: Some(0),
            level_source_index: Some(0),
            level_values: Some(vec![
                DataViewMatrixLevelValue { value: "a".into(), level_source_index: Some(0) },
                DataViewMatrixLevelValue { value: "b".into(), level_source_index: Some(1) },
            ]),
            ..Default::default()
        };
        let mut matrix = DataViewMatrix {
            rows: DataViewHierarchy::new(
                DataViewMatrixNode::default().with_children(vec![node]),
                vec![DataViewHierarchyLevel::new(vec![first, second])],
            ),
            ..Default::default()
        };
        let original = matrix.clone();
        let ordering = [("Rows".to_string(), vec![1, 0])].into_iter().collect();
        reorder_matrix(&mut matrix, &ordering);

        assert_eq!(matrix.rows.levels[0].sources[0].display_name, "Second");
        let node = &matrix.rows.root.children()[0];
        assert_eq!(node.level_source_index, Some(1));
        let values: Vec<_> = node.level_values.iter().flatten().map(|v| v.value.clone()).collect();
        assert_eq!(values, vec![DataValue::from("b"), "a".into()]);

        // The original tree is untouched.
        assert_eq!(original.rows.root.children()[0].level_source_index, Some(0));
    }
}
