//! Object application.
//!
//! Evaluates the visual's object definitions into every scope of a
//! DataView:
//!
//! | scope | selector | lands in |
//! |-------|----------|----------|
//! | DataView | none, or no data and no metadata | `metadata.objects` |
//! | column | `metadata` only | `column.objects` |
//! | category row | identity / scope wildcard | `categories[0].objects[row]` |
//! | series | series identity | `group.objects` |
//! | value point | role wildcard, or category and series | `column.objects[row]` |
//! | table row | row identity | `table.row_objects[row]` |
//! | matrix / tree node | node identity | `node.objects` |
//!
//! Per-row arrays are `None` when no row got anything.

use std::sync::Arc;

use tracing::trace;

use super::selects::{rewrite_sources, ColumnRewrite};
use crate::cache::ColorAllocatorCache;
use crate::data_view::{
    DataView, DataViewMatrixNode, DataViewMetadataColumn, DataViewObjects, DataViewScopeIdentity,
    DataViewTreeNode,
};
use crate::objects::{
    evaluate_data_view_objects, CategoricalEvalContext, DataViewObjectDefinition,
    DataViewObjectDefinitions, DataViewObjectDescriptors, EvalContext, EvalResources,
    MatrixEvalContext, Selector, StaticEvalContext, TableEvalContext,
};

type Definition<'d> = (&'d str, &'d DataViewObjectDefinition);

pub(crate) struct ObjectApplication<'a> {
    pub descriptors: &'a DataViewObjectDescriptors,
    pub definitions: &'a DataViewObjectDefinitions,
    pub null_color: &'a str,
}

/// Store per-row objects only when some row has any.
fn per_row(rows: Vec<DataViewObjects>) -> Option<Vec<DataViewObjects>> {
    rows.iter().any(|o| !o.is_empty()).then_some(rows)
}

impl<'a> ObjectApplication<'a> {
    fn all(&self) -> Vec<Definition<'a>> {
        self.definitions
            .iter()
            .flat_map(|(name, defs)| defs.iter().map(move |d| (name.as_str(), d)))
            .collect()
    }

    fn selected<'s>(
        definitions: &'s [Definition<'a>],
        predicate: impl Fn(&Selector) -> bool + 's,
    ) -> impl Iterator<Item = Definition<'a>> + 's {
        definitions.iter().copied().filter(move |(_, definition)| {
            definition.selector.as_ref().is_some_and(|s| predicate(s))
        })
    }

    /// Definitions addressing exactly the data scope `identities` (no role
    /// wildcards, no column).
    fn scoped<'s>(
        definitions: &'s [Definition<'a>],
        identities: &'s [&'s DataViewScopeIdentity],
    ) -> Vec<Definition<'a>> {
        Self::selected(definitions, move |s| {
            s.has_data() && !s.has_role_wildcard() && s.matches_scope(identities, None)
        })
        .collect()
    }

    pub(crate) fn apply(&self, data_view: &mut DataView, colors: &mut ColorAllocatorCache) {
        let definitions = self.all();
        if definitions.is_empty() {
            return;
        }
        self.apply_metadata(data_view, colors, &definitions);
        self.apply_columns(data_view, colors, &definitions);
        self.apply_categorical(data_view, colors, &definitions);
        self.apply_table(data_view, colors, &definitions);
        self.apply_matrix(data_view, colors, &definitions);
        self.apply_tree(data_view, colors, &definitions);
    }

    fn apply_metadata(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let metadata_level = definitions.iter().copied().filter(|(_, d)| d.is_metadata_level());
        let objects = {
            let resources = EvalResources::new(&data_view.metadata, colors, self.null_color);
            let mut ctx = StaticEvalContext::new(resources);
            evaluate_data_view_objects(&mut ctx, self.descriptors, metadata_level)
        };
        if let Some(objects) = objects {
            trace!(objects = objects.0.len(), "metadata objects");
            Arc::make_mut(&mut data_view.metadata).objects = Some(objects);
        }
    }

    fn apply_columns(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let mut evaluated: Vec<(Arc<DataViewMetadataColumn>, DataViewObjects)> = Vec::new();
        {
            let metadata = &data_view.metadata;
            let mut ctx = StaticEvalContext::new(EvalResources::new(metadata, colors, self.null_color));
            for column in &metadata.columns {
                let column_level = Self::selected(definitions, |s| s.matches_column(column));
                if let Some(objects) = evaluate_data_view_objects(&mut ctx, self.descriptors, column_level) {
                    evaluated.push((Arc::clone(column), objects));
                }
            }
        }
        if evaluated.is_empty() {
            return;
        }
        trace!(columns = evaluated.len(), "column objects");

        let mut replaced: Vec<(Arc<DataViewMetadataColumn>, Arc<DataViewMetadataColumn>)> = Vec::new();
        rewrite_sources(data_view, &mut |column| {
            if let Some((_, new)) = replaced.iter().find(|(old, _)| Arc::ptr_eq(old, column)) {
                return ColumnRewrite::Replace(Arc::clone(new));
            }
            let found = evaluated.iter().find(|(target, _)| {
                Arc::ptr_eq(target, column)
                    || (target.same_select(column) && target.group_name == column.group_name)
            });
            let Some((_, objects)) = found else {
                return ColumnRewrite::Keep;
            };
            let new = Arc::new(DataViewMetadataColumn {
                objects: Some(objects.clone()),
                ..(**column).clone()
            });
            replaced.push((Arc::clone(column), Arc::clone(&new)));
            ColumnRewrite::Replace(new)
        });
    }

    fn apply_categorical(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let Some(categorical) = data_view.categorical.as_ref() else {
            return;
        };
        let data_definitions: Vec<_> = Self::selected(definitions, Selector::has_data).collect();
        if data_definitions.is_empty() {
            return;
        }

        let category_identities = categorical
            .categories
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.identity.clone());
        let row_count = categorical.row_count();
        let resources = EvalResources::new(&data_view.metadata, colors, self.null_color);
        let mut ctx = CategoricalEvalContext::new(resources, categorical);

        // Category rows.
        let mut category_objects = None;
        if let Some(identities) = &category_identities {
            let rows = identities
                .iter()
                .enumerate()
                .map(|(row, identity)| {
                    let matching = Self::scoped(&data_definitions, &[identity]);
                    if matching.is_empty() {
                        return DataViewObjects::default();
                    }
                    ctx.set_current_row_index(row);
                    evaluate_data_view_objects(&mut ctx, self.descriptors, matching).unwrap_or_default()
                })
                .collect();
            category_objects = per_row(rows);
            trace!(rows = identities.len(), found = category_objects.is_some(), "category objects");
        }

        // Series groups and value points.
        let mut group_objects = Vec::new();
        let mut point_objects = Vec::new();
        for (g, group) in categorical.values.iter().flat_map(|v| v.groups.iter()).enumerate() {
            if let Some(identity) = &group.identity {
                let matching = Self::scoped(&data_definitions, &[identity]);
                if !matching.is_empty() {
                    if let Some(objects) = evaluate_data_view_objects(&mut ctx, self.descriptors, matching) {
                        group_objects.push((g, objects));
                    }
                }
            }

            for (c, column) in group.values.iter().enumerate() {
                let rows = (0..row_count)
                    .map(|row| {
                        let mut scope: Vec<&DataViewScopeIdentity> = Vec::new();
                        if let Some(identity) = category_identities.as_ref().and_then(|ids| ids.get(row)) {
                            scope.push(identity);
                        }
                        if let Some(identity) = &column.identity {
                            scope.push(identity);
                        }
                        let matching: Vec<_> = Self::selected(&data_definitions, |s| {
                            (s.has_role_wildcard() || scope.len() >= 2)
                                && s.matches_scope(&scope, Some(column.source.as_ref()))
                        })
                        .collect();
                        if matching.is_empty() {
                            return DataViewObjects::default();
                        }
                        ctx.set_current_row_index(row);
                        evaluate_data_view_objects(&mut ctx, self.descriptors, matching).unwrap_or_default()
                    })
                    .collect();
                if let Some(rows) = per_row(rows) {
                    point_objects.push((g, c, rows));
                }
            }
        }
        trace!(series = group_objects.len(), columns = point_objects.len(), "value objects");
        drop(ctx);

        if category_objects.is_none() && group_objects.is_empty() && point_objects.is_empty() {
            return;
        }
        let Some(categorical) = data_view.categorical.as_mut() else {
            return;
        };
        let categorical = Arc::make_mut(categorical);
        if let Some(category) = categorical.categories.as_mut().and_then(|c| c.first_mut()) {
            if category_objects.is_some() {
                category.objects = category_objects;
            }
        }
        if let Some(values) = categorical.values.as_mut() {
            for (g, objects) in group_objects {
                values.groups[g].objects = Some(objects);
            }
            for (g, c, rows) in point_objects {
                values.groups[g].values[c].objects = Some(rows);
            }
        }
    }

    fn apply_table(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let Some(table) = data_view.table.as_ref() else {
            return;
        };
        let Some(identities) = &table.identity else {
            return;
        };
        let row_objects = {
            let resources = EvalResources::new(&data_view.metadata, colors, self.null_color);
            let mut ctx = TableEvalContext::new(resources, table);
            let rows = identities
                .iter()
                .enumerate()
                .map(|(row, identity)| {
                    let matching = Self::scoped(definitions, &[identity]);
                    if matching.is_empty() {
                        return DataViewObjects::default();
                    }
                    ctx.set_current_row_index(row);
                    evaluate_data_view_objects(&mut ctx, self.descriptors, matching).unwrap_or_default()
                })
                .collect();
            per_row(rows)
        };
        trace!(found = row_objects.is_some(), "table row objects");
        if let (Some(row_objects), Some(table)) = (row_objects, data_view.table.as_mut()) {
            Arc::make_mut(table).row_objects = Some(row_objects);
        }
    }

    fn apply_matrix(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let Some(matrix) = data_view.matrix.as_ref() else {
            return;
        };
        let (rows, columns) = {
            let resources = EvalResources::new(&data_view.metadata, colors, self.null_color);
            let mut ctx = MatrixEvalContext::new(resources, matrix);
            (
                self.matrix_node(&mut ctx, definitions, &matrix.rows.root),
                self.matrix_node(&mut ctx, definitions, &matrix.columns.root),
            )
        };
        if rows.is_none() && columns.is_none() {
            return;
        }
        trace!(rows = rows.is_some(), columns = columns.is_some(), "matrix objects");
        if let Some(matrix) = data_view.matrix.as_mut() {
            let matrix = Arc::make_mut(matrix);
            if let Some(root) = rows {
                matrix.rows.root = root;
            }
            if let Some(root) = columns {
                matrix.columns.root = root;
            }
        }
    }

    /// Copy of `node` with objects applied, `None` when nothing in the
    /// subtree changed.
    fn matrix_node(
        &self,
        ctx: &mut dyn EvalContext,
        definitions: &[Definition<'a>],
        node: &Arc<DataViewMatrixNode>,
    ) -> Option<Arc<DataViewMatrixNode>> {
        let objects = node.identity.as_ref().and_then(|identity| {
            let matching = Self::scoped(definitions, &[identity]);
            if matching.is_empty() {
                return None;
            }
            evaluate_data_view_objects(ctx, self.descriptors, matching)
        });
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| self.matrix_node(ctx, definitions, child))
            .collect();
        if objects.is_none() && children.iter().all(Option::is_none) {
            return None;
        }

        let mut copy = (**node).clone();
        if objects.is_some() {
            copy.objects = objects;
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

    fn apply_tree(
        &self,
        data_view: &mut DataView,
        colors: &mut ColorAllocatorCache,
        definitions: &[Definition<'a>],
    ) {
        let Some(tree) = data_view.tree.as_ref() else {
            return;
        };
        let root = {
            let resources = EvalResources::new(&data_view.metadata, colors, self.null_color);
            let mut ctx = StaticEvalContext::new(resources);
            self.tree_node(&mut ctx, definitions, &tree.root)
        };
        if let (Some(root), Some(tree)) = (root, data_view.tree.as_mut()) {
            trace!("tree objects");
            Arc::make_mut(tree).root = root;
        }
    }

    fn tree_node(
        &self,
        ctx: &mut dyn EvalContext,
        definitions: &[Definition<'a>],
        node: &Arc<DataViewTreeNode>,
    ) -> Option<Arc<DataViewTreeNode>> {
        let objects = node.identity.as_ref().and_then(|identity| {
            let matching = Self::scoped(definitions, &[identity]);
            if matching.is_empty() {
                return None;
            }
            evaluate_data_view_objects(ctx, self.descriptors, matching)
        });
        let children: Vec<_> = node
            .children()
            .iter()
            .map(|child| self.tree_node(ctx, definitions, child))
            .collect();
        if objects.is_none() && children.iter().all(Option::is_none) {
            return None;
        }

        let mut copy = (**node).clone();
        if objects.is_some() {
            copy.objects = objects;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_view::{
        DataViewCategorical, DataViewCategoryColumn, DataViewMetadata, DataViewRoleWildcard,
        DataViewScopeWildcard, DataViewTable, DataViewValueColumn, DataViewValueColumns, Fill,
    };
    use crate::objects::{
        DataRepetitionSelector, DataViewObjectPropertyDefinition, DataViewObjectPropertyDescriptor,
    };
    use crate::sqexpr::{SQExprBuilder, SQExprRef};
    use crate::types::{PropertyTypeDescriptor, StructuralType, ValueType, ValueTypeDescriptor};

    fn field() -> SQExprRef {
        SQExprBuilder::column_ref(SQExprBuilder::entity("s", "Sales", None), "Region")
    }

    fn identity(value: &str) -> DataViewScopeIdentity {
        DataViewScopeIdentity::from_field_value(&field(), &value.into(), ValueType::text())
    }

    fn descriptors() -> DataViewObjectDescriptors {
        DataViewObjectDescriptors::default()
            .with_property(
                "dataPoint",
                "fill",
                DataViewObjectPropertyDescriptor::structural(StructuralType::Fill),
            )
            .with_property(
                "general",
                "show",
                DataViewObjectPropertyDescriptor::new(PropertyTypeDescriptor::Value(
                    ValueTypeDescriptor::boolean(),
                )),
            )
    }

    fn fill(color: &str) -> DataViewObjectPropertyDefinition {
        DataViewObjectPropertyDefinition::solid_fill(SQExprBuilder::text(color))
    }

    fn view() -> DataView {
        let region = Arc::new(
            DataViewMetadataColumn::new("Region")
                .with_index(0)
                .with_query_name("Sales.Region")
                .with_role("Category"),
        );
        let amount = Arc::new(
            DataViewMetadataColumn::new("Amount")
                .with_index(1)
                .with_query_name("Sum(Sales.Amount)")
                .with_role("Y")
                .measure(),
        );
        DataView::new(DataViewMetadata {
            columns: vec![region.clone(), amount.clone()],
            objects: None,
        })
        .with_categorical(DataViewCategorical {
            categories: Some(vec![DataViewCategoryColumn::new(
                region,
                vec!["East".into(), "West".into()],
            )
            .with_identity(vec![identity("East"), identity("West")], vec![field()])]),
            values: Some(DataViewValueColumns::ungrouped(vec![DataViewValueColumn::new(
                amount,
                vec![1.into(), 2.into()],
            )])),
        })
    }

    fn apply(data_view: &mut DataView, definitions: &DataViewObjectDefinitions) {
        let descriptors = descriptors();
        let application = ObjectApplication {
            descriptors: &descriptors,
            definitions,
            null_color: "#000000",
        };
        application.apply(data_view, &mut ColorAllocatorCache::new());
    }

    #[test]
    fn test_metadata_and_column_objects() {
        let mut definitions = DataViewObjectDefinitions::new();
        definitions.insert(
            "general".to_string(),
            vec![DataViewObjectDefinition::new(None)
                .with_property("show", DataViewObjectPropertyDefinition::Value(true.into()))],
        );
        definitions.insert(
            "dataPoint".to_string(),
            vec![DataViewObjectDefinition::new(Some(Selector::for_metadata("Sum(Sales.Amount)")))
                .with_property("fill", fill("#ff0000"))],
        );

        let mut data_view = view();
        apply(&mut data_view, &definitions);

        let metadata = &data_view.metadata;
        assert_eq!(metadata.objects.as_ref().unwrap().value("general", "show"), Some(&true.into()));
        let amount = &metadata.columns[1];
        assert!(amount.objects.is_some());
        // The value column shares the rewritten metadata column.
        let categorical = data_view.categorical.as_ref().unwrap();
        let source = &categorical.values.as_ref().unwrap().columns().next().unwrap().source;
        assert!(Arc::ptr_eq(amount, source));
        assert!(metadata.columns[0].objects.is_none());
    }

    #[test]
    fn test_category_row_and_value_point_objects() {
        let mut definitions = DataViewObjectDefinitions::new();
        definitions.insert(
            "dataPoint".to_string(),
            vec![
                DataViewObjectDefinition::new(Some(Selector::with_data(vec![
                    DataRepetitionSelector::Identity(identity("West")),
                ])))
                .with_property("fill", fill("#00ff00")),
                DataViewObjectDefinition::new(Some(Selector::with_data(vec![
                    DataRepetitionSelector::ScopeWildcard(DataViewScopeWildcard::new(vec![field()])),
                    DataRepetitionSelector::RoleWildcard(DataViewRoleWildcard::new(vec!["Y".to_string()])),
                ])))
                .with_property("fill", fill("#0000ff")),
            ],
        );

        let mut data_view = view();
        apply(&mut data_view, &definitions);

        let categorical = data_view.categorical.as_ref().unwrap();
        let rows = categorical.categories.as_ref().unwrap()[0].objects.as_ref().unwrap();
        assert!(rows[0].is_empty());
        assert_eq!(
            rows[1].property("dataPoint", "fill").and_then(|p| p.as_fill()),
            Some(&Fill::solid("#00ff00"))
        );

        let column = categorical.values.as_ref().unwrap().columns().next().unwrap();
        let points = column.objects.as_ref().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points[0].property("dataPoint", "fill").and_then(|p| p.as_fill()),
            Some(&Fill::solid("#0000ff"))
        );
    }

    #[test]
    fn test_table_row_objects() {
        let name = Arc::new(DataViewMetadataColumn::new("Region").with_index(0));
        let mut data_view = DataView::new(DataViewMetadata {
            columns: vec![name.clone()],
            objects: None,
        })
        .with_table(
            DataViewTable::new(vec![name], vec![vec!["East".into()], vec!["West".into()]])
                .with_identity(vec![identity("East"), identity("West")], vec![field()]),
        );
        let mut definitions = DataViewObjectDefinitions::new();
        definitions.insert(
            "dataPoint".to_string(),
            vec![DataViewObjectDefinition::new(Some(Selector::with_data(vec![
                DataRepetitionSelector::Identity(identity("East")),
            ])))
            .with_property("fill", fill("#123456"))],
        );
        apply(&mut data_view, &definitions);

        let row_objects = data_view.table.as_ref().unwrap().row_objects.as_ref().unwrap();
        assert!(!row_objects[0].is_empty());
        assert!(row_objects[1].is_empty());
    }

    #[test]
    fn test_no_matching_definitions_leave_view_shared() {
        let mut definitions = DataViewObjectDefinitions::new();
        definitions.insert(
            "dataPoint".to_string(),
            vec![DataViewObjectDefinition::new(Some(Selector::with_data(vec![
                DataRepetitionSelector::Identity(identity("North")),
            ])))
            .with_property("fill", fill("#123456"))],
        );
        let original = view();
        let mut data_view = original.clone();
        apply(&mut data_view, &definitions);
        assert!(Arc::ptr_eq(
            original.categorical.as_ref().unwrap(),
            data_view.categorical.as_ref().unwrap()
        ));
    }
}
