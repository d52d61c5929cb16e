//! Matrix to categorical unpivot.
//!
//! A query for a categorical visual with a dynamic series can come back as
//! a two-level row matrix (category level and series level, measures as
//! column headers). This rebuilds the categorical shape from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::pivot::replace_columns;
use crate::analysis::DataViewCategoricalMapping;
use crate::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMatrix, DataViewMatrixNode,
    DataViewMatrixNodeValue, DataViewMetadataColumn, DataViewScopeIdentity, DataViewValueColumn,
    DataViewValueColumnGroup, DataViewValueColumns,
};
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

/// A distinct category or series member, in first-appearance order.
struct Member {
    value: DataValue,
    identity: Option<DataViewScopeIdentity>,
}

#[derive(Default)]
struct Members {
    members: Vec<Member>,
    identity_fields: Option<Vec<SQExprRef>>,
}

impl Members {
    fn position_or_insert(&mut self, node: &DataViewMatrixNode) -> usize {
        let value = node.value.clone().unwrap_or_default();
        let found = self.members.iter().position(|m| match (&m.identity, &node.identity) {
            (Some(a), Some(b)) => a == b,
            _ => m.value == value,
        });
        found.unwrap_or_else(|| {
            self.members.push(Member {
                value,
                identity: node.identity.clone(),
            });
            self.members.len() - 1
        })
    }

    fn identities(&self) -> Option<Vec<DataViewScopeIdentity>> {
        self.members.iter().map(|m| m.identity.clone()).collect()
    }
}

/// Rebuild `data_view`'s matrix as a series-grouped categorical. `None`
/// when the matrix is not a category level and a series level over
/// measure-only columns.
pub(crate) fn unpivot_matrix(
    data_view: &DataView,
    mapping: &DataViewCategoricalMapping,
) -> Option<DataView> {
    if data_view.categorical.is_some() {
        return None;
    }
    let matrix = data_view.matrix.as_ref()?;
    let category_level = category_level(matrix, mapping)?;
    let series_level = 1 - category_level;

    let mut categories = Members::default();
    let mut series = Members::default();
    let mut cells: Vec<(usize, usize, &BTreeMap<usize, DataViewMatrixNodeValue>)> = Vec::new();
    for outer in matrix.rows.root.children() {
        for inner in outer.children() {
            let (category_node, series_node, category_parent, series_parent) = if category_level == 0 {
                (outer, inner, &matrix.rows.root, outer)
            } else {
                (inner, outer, outer, &matrix.rows.root)
            };
            if categories.identity_fields.is_none() {
                categories.identity_fields = category_parent.child_identity_fields.clone();
            }
            if series.identity_fields.is_none() {
                series.identity_fields = series_parent.child_identity_fields.clone();
            }
            let category = categories.position_or_insert(category_node);
            let series_index = series.position_or_insert(series_node);
            if let Some(values) = &inner.values {
                cells.push((series_index, category, values));
            }
        }
    }

    let category_source = Arc::clone(matrix.rows.levels[category_level].sources.first()?);
    let series_source = Arc::clone(matrix.rows.levels[series_level].sources.first()?);
    let measures = &matrix.value_sources;
    let row_count = categories.members.len();
    let has_highlights = cells
        .iter()
        .any(|(_, _, values)| values.values().any(|v| v.highlight.is_some()));

    let mut new_sources = Vec::new();
    let mut groups = Vec::with_capacity(series.members.len());
    for (series_index, member) in series.members.iter().enumerate() {
        let mut columns = Vec::with_capacity(measures.len());
        for (measure, measure_source) in measures.iter().enumerate() {
            let mut source = (**measure_source).clone();
            source.group_name = Some(member.value.clone());
            let source = Arc::new(source);
            new_sources.push(Arc::clone(&source));

            let mut values = vec![DataValue::Null; row_count];
            let mut highlights = vec![DataValue::Null; row_count];
            for (_, row, cell) in cells.iter().filter(|(s, _, _)| *s == series_index) {
                let found = cell
                    .iter()
                    .find(|(key, v)| v.value_source_index.unwrap_or(**key) == measure);
                if let Some((_, value)) = found {
                    values[*row] = value.value.clone();
                    highlights[*row] = value.highlight.clone().unwrap_or_default();
                }
            }
            let mut column = DataViewValueColumn::new(source, values);
            column.highlights = has_highlights.then(|| Arc::new(highlights));
            column.identity = member.identity.clone();
            columns.push(column);
        }
        groups.push(DataViewValueColumnGroup {
            identity: member.identity.clone(),
            name: Some(member.value.clone()),
            values: columns,
            objects: None,
        });
    }

    let mut category = DataViewCategoryColumn::new(
        category_source,
        categories.members.iter().map(|m| m.value.clone()).collect(),
    );
    if let Some(identities) = categories.identities() {
        category.identity = Some(Arc::new(identities));
        category.identity_fields = categories.identity_fields.clone();
    }

    let values = DataViewValueColumns {
        groups,
        source: Some(series_source),
        identity_fields: series.identity_fields,
    };
    debug!(
        categories = row_count,
        series = series.members.len(),
        "unpivoted matrix into categorical"
    );

    let mut unpivoted = data_view.clone();
    unpivoted.matrix = None;
    unpivoted.categorical = Some(Arc::new(DataViewCategorical {
        categories: Some(vec![category]),
        values: Some(values),
    }));
    replace_columns(Arc::make_mut(&mut unpivoted.metadata), measures, new_sources);
    Some(unpivoted)
}

/// Index of the row level bound to the mapping's categories, when the other
/// level is bound to its series role.
fn category_level(matrix: &DataViewMatrix, mapping: &DataViewCategoricalMapping) -> Option<usize> {
    let levels = &matrix.rows.levels;
    if levels.len() != 2 || levels.iter().any(|l| l.sources.len() != 1) {
        return None;
    }
    if !matrix.columns.is_measure_headers_only() {
        return None;
    }
    let series_role = mapping.values.as_ref()?.grouping_role()?;
    let category_roles = mapping.categories.as_ref()?.roles();
    let is_category = |source: &DataViewMetadataColumn| category_roles.iter().any(|r| source.has_role(r));

    let (first, second) = (&levels[0].sources[0], &levels[1].sources[0]);
    if is_category(first.as_ref()) && second.has_role(series_role) {
        Some(0)
    } else if is_category(second.as_ref()) && first.has_role(series_role) {
        Some(1)
    } else {
        None
    }
}
