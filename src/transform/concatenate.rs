//! Category concatenation.
//!
//! A visual can cap a category role at one column while the query returns
//! several for it (a hierarchy drilled to several levels at once). The
//! columns are merged into one text column whose values join the formatted
//! values of each source column.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::pivot::replace_columns;
use crate::analysis::DataViewMapping;
use crate::data_view::{DataView, DataViewCategoryColumn, DataViewMetadataColumn};
use crate::format::ValueFormatter;
use crate::types::{DataValue, ValueType};

pub(crate) struct Concatenation<'a> {
    pub separator: &'a str,
    pub formatter: &'a dyn ValueFormatter,
    pub ordering: Option<&'a BTreeMap<String, Vec<usize>>>,
}

impl Concatenation<'_> {
    /// Concatenate the category columns of every role `mapping` caps at one
    /// column. Returns the roles that were concatenated.
    pub(crate) fn apply(&self, data_view: &mut DataView, mapping: &DataViewMapping) -> Vec<String> {
        let Some(category_mapping) = mapping
            .categorical
            .as_ref()
            .and_then(|c| c.categories.as_ref())
        else {
            return Vec::new();
        };

        let mut concatenated = Vec::new();
        for role in category_mapping.roles() {
            if mapping.max_for_role(role) != Some(1) {
                continue;
            }
            if self.concatenate_role(data_view, role) {
                concatenated.push(role.to_string());
            }
        }
        concatenated
    }

    fn concatenate_role(&self, data_view: &mut DataView, role: &str) -> bool {
        let Some(categorical) = data_view.categorical.as_mut() else {
            return false;
        };
        let categories = categorical.categories.as_deref().unwrap_or_default();
        let Some((column, members)) = self.merge(categories, role) else {
            return false;
        };
        let old_sources: Vec<_> = members.iter().map(|&i| Arc::clone(&categories[i].source)).collect();
        let insert_at = members.iter().copied().min().unwrap_or(0);
        let source = Arc::clone(&column.source);

        if let Some(categories) = Arc::make_mut(categorical).categories.as_mut() {
            let mut index = 0;
            categories.retain(|_| {
                let keep = !members.contains(&index);
                index += 1;
                keep
            });
            categories.insert(insert_at.min(categories.len()), column);
        }
        replace_columns(Arc::make_mut(&mut data_view.metadata), &old_sources, vec![source]);

        debug!(role, columns = members.len(), "concatenated category columns");
        true
    }

    /// The merged column for `role` and the category indices it replaces,
    /// in projection order.
    fn merge(
        &self,
        categories: &[DataViewCategoryColumn],
        role: &str,
    ) -> Option<(DataViewCategoryColumn, Vec<usize>)> {
        let mut members: Vec<usize> = categories
            .iter()
            .enumerate()
            .filter(|(_, c)| c.source.has_role(role))
            .map(|(i, _)| i)
            .collect();
        if members.len() < 2 {
            return None;
        }
        if let Some(order) = self.ordering.and_then(|o| o.get(role)) {
            let position = |i: &usize| {
                categories[*i]
                    .source
                    .index
                    .and_then(|index| order.iter().position(|&o| o == index))
                    .unwrap_or(usize::MAX)
            };
            members.sort_by_key(position);
        }

        let first = &categories[members[0]];
        let row_count = first.values.len();
        debug_assert!(members.iter().all(|&i| categories[i].values.len() == row_count));

        let values = (0..row_count)
            .map(|row| {
                let parts: Vec<String> = members
                    .iter()
                    .map(|&i| {
                        let column = &categories[i];
                        let value = column.values.get(row).unwrap_or(&DataValue::Null);
                        self.formatter.format(value, column.source.format.as_deref())
                    })
                    .collect();
                DataValue::Text(parts.join(self.separator))
            })
            .collect();

        let display_name = members
            .iter()
            .map(|&i| categories[i].source.display_name.as_str())
            .collect::<Vec<_>>()
            .join(self.separator);
        let mut source = DataViewMetadataColumn::new(display_name)
            .with_role(role)
            .with_type(ValueType::text());
        source.query_name = first.source.query_name.clone();
        source.index = first.source.index;

        let column = DataViewCategoryColumn {
            source: Arc::new(source),
            values: Arc::new(values),
            identity: first.identity.clone(),
            identity_fields: first.identity_fields.clone(),
            objects: None,
        };
        Some((column, members))
    }
}
