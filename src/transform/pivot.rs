//! Categorical pivot, self-cross-join and unpivot.
//!
//! A categorical with one category column and static (ungrouped) values,
//! whose category column is bound to the mapping's series role, is turned
//! into a series-grouped categorical:
//!
//! - **pivot**: the category is only a series. Every category row becomes a
//!   series with one point per value column, and the categories go away.
//! - **self-cross-join**: the category is also bound as a category. Rows
//!   stay, and every row becomes a series that only has a value on its own
//!   row (a diagonal matrix, nulls elsewhere).
//!
//! [`unpivot_categorical`] inverts the pivot.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::DataViewCategoricalMapping;
use crate::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewValueColumn, DataViewValueColumnGroup, DataViewValueColumns,
};
use crate::types::DataValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PivotKind {
    Pivot,
    SelfCrossJoin,
}

/// Which pivot, if any, `categorical` needs under `mapping`.
pub(crate) fn pivot_kind(
    categorical: &DataViewCategorical,
    mapping: &DataViewCategoricalMapping,
) -> Option<PivotKind> {
    let series_role = mapping.values.as_ref()?.grouping_role()?;
    let [category] = categorical.categories.as_deref()? else {
        return None;
    };
    let values = categorical.values.as_ref()?;
    if values.is_empty() || values.is_grouped() {
        return None;
    }
    if !category.source.has_role(series_role) {
        return None;
    }

    let category_roles = mapping
        .categories
        .as_ref()
        .map(|c| c.roles())
        .unwrap_or_default();
    if category_roles.iter().any(|r| category.source.has_role(r)) {
        Some(PivotKind::SelfCrossJoin)
    } else {
        Some(PivotKind::Pivot)
    }
}

/// Pivot or self-cross-join `data_view` when its categorical needs it.
pub(crate) fn pivot_if_necessary(
    data_view: &mut DataView,
    mapping: &DataViewCategoricalMapping,
) -> Option<PivotKind> {
    let categorical = data_view.categorical.as_ref()?;
    let kind = pivot_kind(categorical, mapping)?;
    debug!(?kind, "pivoting categorical");

    let (pivoted, old_sources, new_sources) = match kind {
        PivotKind::Pivot => pivot(categorical),
        PivotKind::SelfCrossJoin => self_cross_join(categorical),
    };
    data_view.categorical = Some(Arc::new(pivoted));
    replace_columns(Arc::make_mut(&mut data_view.metadata), &old_sources, new_sources);
    Some(kind)
}

fn with_group_name(
    source: &DataViewMetadataColumn,
    group_name: &DataValue,
) -> Arc<DataViewMetadataColumn> {
    let mut column = source.clone();
    column.group_name = Some(group_name.clone());
    Arc::new(column)
}

type PivotOutput = (
    DataViewCategorical,
    Vec<Arc<DataViewMetadataColumn>>,
    Vec<Arc<DataViewMetadataColumn>>,
);

fn pivot(categorical: &DataViewCategorical) -> PivotOutput {
    let categories = categorical.categories.as_deref().unwrap_or_default();
    let category = &categories[0];
    let value_columns: Vec<&DataViewValueColumn> = categorical
        .values
        .iter()
        .flat_map(|v| v.columns())
        .collect();

    let mut new_sources = Vec::new();
    let mut groups = Vec::with_capacity(category.values.len());
    for (row, category_value) in category.values.iter().enumerate() {
        let identity = category.identity.as_ref().and_then(|ids| ids.get(row)).cloned();
        let columns = value_columns
            .iter()
            .map(|column| {
                let source = with_group_name(&column.source, category_value);
                new_sources.push(Arc::clone(&source));
                DataViewValueColumn {
                    source,
                    values: Arc::new(vec![column.values.get(row).cloned().unwrap_or_default()]),
                    highlights: column
                        .highlights
                        .as_ref()
                        .map(|h| Arc::new(vec![h.get(row).cloned().unwrap_or_default()])),
                    identity: identity.clone(),
                    min: column.min.clone(),
                    max: column.max.clone(),
                    subtotal: column.subtotal.clone(),
                    objects: None,
                }
            })
            .collect();
        groups.push(DataViewValueColumnGroup {
            identity,
            name: Some(category_value.clone()),
            values: columns,
            objects: None,
        });
    }

    let pivoted = DataViewCategorical {
        categories: None,
        values: Some(DataViewValueColumns {
            groups,
            source: Some(Arc::clone(&category.source)),
            identity_fields: category.identity_fields.clone(),
        }),
    };
    let old_sources = value_columns.iter().map(|c| Arc::clone(&c.source)).collect();
    (pivoted, old_sources, new_sources)
}

fn self_cross_join(categorical: &DataViewCategorical) -> PivotOutput {
    let categories = categorical.categories.as_deref().unwrap_or_default();
    let category = &categories[0];
    let row_count = category.values.len();
    let value_columns: Vec<&DataViewValueColumn> = categorical
        .values
        .iter()
        .flat_map(|v| v.columns())
        .collect();

    let diagonal = |values: &[DataValue], row: usize| {
        let mut out = vec![DataValue::Null; row_count];
        if let Some(value) = values.get(row) {
            out[row] = value.clone();
        }
        Arc::new(out)
    };

    let mut new_sources = Vec::new();
    let mut groups = Vec::with_capacity(row_count);
    for (row, category_value) in category.values.iter().enumerate() {
        let identity = category.identity.as_ref().and_then(|ids| ids.get(row)).cloned();
        let columns = value_columns
            .iter()
            .map(|column| {
                let source = with_group_name(&column.source, category_value);
                new_sources.push(Arc::clone(&source));
                DataViewValueColumn {
                    source,
                    values: diagonal(&column.values, row),
                    highlights: column.highlights.as_ref().map(|h| diagonal(h, row)),
                    identity: identity.clone(),
                    min: column.min.clone(),
                    max: column.max.clone(),
                    subtotal: column.subtotal.clone(),
                    objects: None,
                }
            })
            .collect();
        groups.push(DataViewValueColumnGroup {
            identity,
            name: Some(category_value.clone()),
            values: columns,
            objects: None,
        });
    }

    let joined = DataViewCategorical {
        categories: categorical.categories.clone(),
        values: Some(DataViewValueColumns {
            groups,
            source: Some(Arc::clone(&category.source)),
            identity_fields: category.identity_fields.clone(),
        }),
    };
    let old_sources = value_columns.iter().map(|c| Arc::clone(&c.source)).collect();
    (joined, old_sources, new_sources)
}

/// Inverse of the categorical pivot: a category-less categorical whose
/// series each hold one point per measure becomes a categorical with the
/// series as its category. `None` when `data_view` does not have that
/// shape.
pub fn unpivot_categorical(data_view: &DataView) -> Option<DataView> {
    let categorical = data_view.categorical.as_ref()?;
    if categorical.categories.is_some() {
        return None;
    }
    let values = categorical.values.as_ref()?;
    let series_source = values.source.as_ref()?;
    let first = values.groups.first()?;
    let measure_count = first.values.len();
    let well_formed = values.groups.iter().all(|g| {
        g.values.len() == measure_count && g.values.iter().all(|c| c.values.len() == 1)
    });
    if measure_count == 0 || !well_formed {
        return None;
    }

    let identities: Option<Vec<_>> = values.groups.iter().map(|g| g.identity.clone()).collect();
    let mut category = DataViewCategoryColumn::new(
        Arc::clone(series_source),
        values
            .groups
            .iter()
            .map(|g| g.name.clone().unwrap_or_default())
            .collect(),
    );
    if let Some(identities) = identities {
        category.identity = Some(Arc::new(identities));
        category.identity_fields = values.identity_fields.clone();
    }

    let mut old_sources = Vec::new();
    let mut new_sources = Vec::new();
    let mut columns = Vec::with_capacity(measure_count);
    for measure in 0..measure_count {
        let template = &first.values[measure];
        let mut source = (*template.source).clone();
        source.group_name = None;
        let source = Arc::new(source);
        new_sources.push(Arc::clone(&source));

        let point = |g: &DataViewValueColumnGroup| g.values[measure].values[0].clone();
        let highlights = template.highlights.as_ref().map(|_| {
            Arc::new(
                values
                    .groups
                    .iter()
                    .map(|g| {
                        g.values[measure]
                            .highlights
                            .as_ref()
                            .and_then(|h| h.first().cloned())
                            .unwrap_or_default()
                    })
                    .collect(),
            )
        });
        columns.push(DataViewValueColumn {
            source,
            values: Arc::new(values.groups.iter().map(point).collect()),
            highlights,
            identity: None,
            min: template.min.clone(),
            max: template.max.clone(),
            subtotal: template.subtotal.clone(),
            objects: None,
        });
        old_sources.extend(values.groups.iter().map(|g| Arc::clone(&g.values[measure].source)));
    }

    debug!(series = values.groups.len(), measures = measure_count, "unpivoting categorical");
    let mut unpivoted = data_view.clone();
    unpivoted.categorical = Some(Arc::new(DataViewCategorical {
        categories: Some(vec![category]),
        values: Some(DataViewValueColumns::ungrouped(columns)),
    }));
    replace_columns(Arc::make_mut(&mut unpivoted.metadata), &old_sources, new_sources);
    Some(unpivoted)
}

/// Swap `old` metadata columns for `new` ones, inserting the new columns
/// where the first old one was.
pub(crate) fn replace_columns(
    metadata: &mut DataViewMetadata,
    old: &[Arc<DataViewMetadataColumn>],
    new: Vec<Arc<DataViewMetadataColumn>>,
) {
    let is_old = |column: &Arc<DataViewMetadataColumn>| {
        old.iter().any(|o| {
            Arc::ptr_eq(o, column) || (o.same_select(column) && o.group_name == column.group_name)
        })
    };
    let position = metadata
        .columns
        .iter()
        .position(|c| is_old(c))
        .unwrap_or(metadata.columns.len());
    let before = metadata.columns[..position].iter().filter(|c| !is_old(c));
    let after = metadata.columns[position..].iter().filter(|c| !is_old(c));

    let columns: Vec<_> = before
        .cloned()
        .chain(new)
        .chain(after.cloned())
        .collect();
    metadata.columns = columns;
}
