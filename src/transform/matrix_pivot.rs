//! Matrix pivot.
//!
//! When every grouping of a matrix query landed on rows but the visual binds
//! those groupings to its column roles, the row hierarchy becomes the column
//! hierarchy. Rows collapse to a single root whose values are keyed by the
//! flattened column-leaf index.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::analysis::DataViewMatrixMapping;
use crate::data_view::{DataViewHierarchy, DataViewMatrix, DataViewMatrixNode};

/// Whether the row levels of `matrix` belong on columns under `mapping`.
pub(crate) fn should_pivot(matrix: &DataViewMatrix, mapping: &DataViewMatrixMapping) -> bool {
    let Some(columns) = &mapping.columns else {
        return false;
    };
    let column_roles = columns.roles();
    let row_roles = mapping.rows.as_ref().map(|r| r.roles()).unwrap_or_default();

    let levels = &matrix.rows.levels;
    !levels.is_empty()
        && matrix.columns.is_measure_headers_only()
        && levels.iter().all(|level| {
            level.sources.iter().all(|source| {
                column_roles.iter().any(|r| source.has_role(r))
                    && !row_roles.iter().any(|r| source.has_role(r))
            })
        })
}

/// Move the row hierarchy of `matrix` onto its columns.
///
/// With several measures, each new column leaf gets the original measure
/// headers as children (keeping their `level_source_index`) and the measure
/// level is appended below the moved levels.
pub(crate) fn pivot_matrix(matrix: &mut DataViewMatrix) {
    let measure_count = matrix.value_sources.len().max(1);
    let row_levels = matrix.rows.levels.len();
    let row_leaves = matrix.rows.leaves();

    let mut values = BTreeMap::new();
    for (leaf_index, leaf) in row_leaves.iter().enumerate() {
        for (key, value) in leaf.values.iter().flatten() {
            let measure = value.value_source_index.unwrap_or(*key);
            let flattened = if measure_count == 1 {
                leaf_index
            } else {
                leaf_index * measure_count + measure
            };
            let mut value = value.clone();
            if measure_count > 1 {
                value.value_source_index = Some(measure);
            }
            values.insert(flattened, value);
        }
    }

    let measure_headers: Vec<Arc<DataViewMatrixNode>> = if measure_count > 1 {
        matrix
            .columns
            .leaves()
            .iter()
            .map(|leaf| {
                Arc::new(DataViewMatrixNode {
                    level: Some(row_levels),
                    level_source_index: leaf.level_source_index,
                    value: leaf.value.clone(),
                    ..Default::default()
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut column_levels = std::mem::take(&mut matrix.rows.levels);
    if measure_count > 1 {
        column_levels.extend(matrix.columns.levels.iter().cloned());
    }
    let column_root = strip_values(&matrix.rows.root, &measure_headers);

    matrix.columns = DataViewHierarchy {
        root: column_root,
        levels: column_levels,
    };
    matrix.rows = DataViewHierarchy::new(
        DataViewMatrixNode {
            values: Some(values),
            ..Default::default()
        },
        Vec::new(),
    );
    debug!(
        column_leaves = row_leaves.len(),
        measures = measure_count,
        "pivoted matrix rows onto columns"
    );
}

/// Copy of a row subtree without cell values; leaves get `measure_headers`
/// as children when there are any.
fn strip_values(
    node: &Arc<DataViewMatrixNode>,
    measure_headers: &[Arc<DataViewMatrixNode>],
) -> Arc<DataViewMatrixNode> {
    let mut stripped = DataViewMatrixNode {
        values: None,
        children: None,
        ..(**node).clone()
    };
    if node.is_leaf() {
        if !measure_headers.is_empty() {
            stripped.children = Some(measure_headers.to_vec());
        }
    } else {
        stripped.children = Some(
            node.children()
                .iter()
                .map(|child| strip_values(child, measure_headers))
                .collect(),
        );
    }
    Arc::new(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DataViewRoleMapping;
    use crate::data_view::{DataViewHierarchyLevel, DataViewMatrixNodeValue, DataViewMetadataColumn};
    use crate::types::DataValue;

    fn mapping() -> DataViewMatrixMapping {
        DataViewMatrixMapping {
            rows: Some(DataViewRoleMapping::for_in("Rows")),
            columns: Some(DataViewRoleMapping::for_in("Columns")),
            values: Some(DataViewRoleMapping::for_in("Values")),
        }
    }

    fn matrix(measures: usize) -> DataViewMatrix {
        let year = Arc::new(DataViewMetadataColumn::new("Year").with_index(0).with_role("Columns"));
        let sources: Vec<_> = (0..measures)
            .map(|i| Arc::new(DataViewMetadataColumn::new(format!("M{i}")).with_index(i + 1).measure()))
            .collect();
        let cells = |base: f64| {
            (0..measures).map(move |m| {
                let mut value = DataViewMatrixNodeValue::new((base + m as f64).into());
                value.value_source_index = Some(m);
                (m, value)
            })
        };
        let rows = DataViewMatrixNode::default().with_children(vec![
            DataViewMatrixNode::leaf(0, 2020.into()).with_values(cells(10.0)),
            DataViewMatrixNode::leaf(0, 2021.into()).with_values(cells(20.0)),
        ]);
        let column_leaves = (0..measures)
            .map(|m| DataViewMatrixNode {
                level: Some(0),
                level_source_index: Some(m),
                ..Default::default()
            })
            .collect();
        DataViewMatrix {
            rows: DataViewHierarchy::new(rows, vec![DataViewHierarchyLevel::new(vec![year])]),
            columns: DataViewHierarchy::new(
                DataViewMatrixNode::default().with_children(column_leaves),
                vec![DataViewHierarchyLevel::new(sources.clone())],
            ),
            value_sources: sources,
        }
    }

    fn root_values(matrix: &DataViewMatrix) -> Vec<(usize, DataValue)> {
        matrix.rows.root.values.iter().flatten().map(|(k, v)| (*k, v.value.clone())).collect()
    }

    #[test]
    fn test_single_measure_pivot() {
        let mut matrix = matrix(1);
        assert!(should_pivot(&matrix, &mapping()));
        pivot_matrix(&mut matrix);

        assert!(matrix.rows.levels.is_empty());
        assert_eq!(matrix.columns.levels.len(), 1);
        let leaves: Vec<_> = matrix.columns.leaves().iter().filter_map(|n| n.value.clone()).collect();
        assert_eq!(leaves, vec![DataValue::from(2020), 2021.into()]);
        assert_eq!(root_values(&matrix), vec![(0, 10.0.into()), (1, 20.0.into())]);
    }

    #[test]
    fn test_multi_measure_pivot_adds_headers() {
        let mut matrix = matrix(2);
        pivot_matrix(&mut matrix);

        assert_eq!(matrix.columns.levels.len(), 2);
        let leaves = matrix.columns.leaves();
        assert_eq!(leaves.len(), 4);
        assert_eq!(leaves[3].level_source_index, Some(1));
        assert_eq!(leaves[3].level, Some(1));
        assert_eq!(
            root_values(&matrix),
            vec![(0, 10.0.into()), (1, 11.0.into()), (2, 20.0.into()), (3, 21.0.into())]
        );
    }

    #[test]
    fn test_no_pivot_when_rows_bound_to_rows() {
        let mut matrix = matrix(1);
        let year = Arc::new(DataViewMetadataColumn::new("Year").with_index(0).with_role("Rows"));
        matrix.rows.levels[0].sources = vec![year];
        assert!(!should_pivot(&matrix, &mapping()));
    }
}
