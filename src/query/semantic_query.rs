//! Immutable semantic query.

use serde::{Deserialize, Serialize};

use super::semantic_filter::SemanticFilter;
use super::{rebase_expr, trim_from, NamedSQExpr, SQFilter, SQFrom, SQSortDefinition};
use crate::data_view::SortDirection;
use crate::sqexpr::utils::replace_entity_variable;
use crate::sqexpr::{SQExpr, SQExprRef};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticQuery {
    from: SQFrom,
    #[serde(default)]
    select: Vec<NamedSQExpr>,
    #[serde(default, rename = "where")]
    where_items: Vec<SQFilter>,
    #[serde(default)]
    order_by: Vec<SQSortDefinition>,
    #[serde(default)]
    group_by: Vec<NamedSQExpr>,
}

impl SemanticQuery {
    /// Build a query. Expressions must already be bound to `from`; unused
    /// variables are dropped.
    pub fn create(
        from: SQFrom,
        where_items: Vec<SQFilter>,
        order_by: Vec<SQSortDefinition>,
        select: Vec<NamedSQExpr>,
        group_by: Vec<NamedSQExpr>,
    ) -> Self {
        Self::create_with_trimmed_from(from, where_items, order_by, select, group_by)
    }

    pub fn create_with_trimmed_from(
        from: SQFrom,
        where_items: Vec<SQFilter>,
        order_by: Vec<SQSortDefinition>,
        select: Vec<NamedSQExpr>,
        group_by: Vec<NamedSQExpr>,
    ) -> Self {
        let mut query = Self {
            from,
            select,
            where_items,
            order_by,
            group_by,
        };
        query.from = trim_from(&query.from, query.all_exprs());
        query
    }

    pub fn from(&self) -> &SQFrom {
        &self.from
    }

    pub fn selects(&self) -> &[NamedSQExpr] {
        &self.select
    }

    pub fn where_items(&self) -> &[SQFilter] {
        &self.where_items
    }

    pub fn order_by_items(&self) -> &[SQSortDefinition] {
        &self.order_by
    }

    pub fn group_by_items(&self) -> &[NamedSQExpr] {
        &self.group_by
    }

    pub fn select_by_name(&self, name: &str) -> Option<&NamedSQExpr> {
        self.select.iter().find(|s| s.name == name)
    }

    /// Replace the select list.
    pub fn select(&self, exprs: Vec<NamedSQExpr>) -> Self {
        let mut from = self.from.clone();
        let select = rebase_named(&mut from, exprs);
        self.derive(from, |q| q.select = select)
    }

    /// Append a select, naming it `name` or after the referenced property.
    /// Taken names get `1`, `2`, ... appended.
    pub fn add_select(&self, expr: SQExprRef, name: Option<&str>) -> Self {
        let mut from = self.from.clone();
        let expr = rebase_expr(&mut from, &expr);
        let base = name
            .map(str::to_string)
            .unwrap_or_else(|| default_select_name(&expr));
        let name = unique_name(&base, |n| self.select.iter().any(|s| s.name == n));

        let mut select = self.select.clone();
        select.push(NamedSQExpr::new(name, expr));
        self.derive(from, |q| q.select = select)
    }

    pub fn remove_select(&self, name: &str) -> Self {
        let select = self
            .select
            .iter()
            .filter(|s| s.name != name)
            .cloned()
            .collect();
        self.derive(self.from.clone(), |q| q.select = select)
    }

    pub fn order_by(&self, sorts: Vec<SQSortDefinition>) -> Self {
        let mut from = self.from.clone();
        let order_by = sorts
            .into_iter()
            .map(|s| SQSortDefinition {
                expr: rebase_expr(&mut from, &s.expr),
                direction: s.direction,
            })
            .collect();
        self.derive(from, |q| q.order_by = order_by)
    }

    /// Convenience: order by one expression.
    pub fn order_by_expr(&self, expr: SQExprRef, direction: SortDirection) -> Self {
        self.order_by(vec![SQSortDefinition { expr, direction }])
    }

    pub fn group_by(&self, exprs: Vec<NamedSQExpr>) -> Self {
        let mut from = self.from.clone();
        let group_by = rebase_named(&mut from, exprs);
        self.derive(from, |q| q.group_by = group_by)
    }

    /// Replace the `where` clauses with a filter's, rebasing its entities
    /// onto this query's `from`.
    pub fn where_(&self, filter: &SemanticFilter) -> Self {
        let mut from = self.from.clone();
        let where_items = rebase_filter(&mut from, filter);
        self.derive(from, |q| q.where_items = where_items)
    }

    /// Append a filter's `where` clauses.
    pub fn add_where(&self, filter: &SemanticFilter) -> Self {
        let mut from = self.from.clone();
        let mut where_items = self.where_items.clone();
        where_items.extend(rebase_filter(&mut from, filter));
        self.derive(from, |q| q.where_items = where_items)
    }

    fn derive(&self, from: SQFrom, edit: impl FnOnce(&mut SemanticQuery)) -> Self {
        let mut query = self.clone();
        query.from = from;
        edit(&mut query);
        Self::create_with_trimmed_from(
            query.from,
            query.where_items,
            query.order_by,
            query.select,
            query.group_by,
        )
    }

    pub(crate) fn all_exprs(&self) -> impl Iterator<Item = &SQExprRef> {
        self.select
            .iter()
            .map(|s| &s.expr)
            .chain(self.where_items.iter().flat_map(|w| w.exprs()))
            .chain(self.order_by.iter().map(|o| &o.expr))
            .chain(self.group_by.iter().map(|g| &g.expr))
    }
}

fn rebase_named(from: &mut SQFrom, exprs: Vec<NamedSQExpr>) -> Vec<NamedSQExpr> {
    exprs
        .into_iter()
        .map(|n| NamedSQExpr::new(n.name, rebase_expr(from, &n.expr)))
        .collect()
}

/// The filter's clauses with its variables renamed into `from`.
pub(crate) fn rebase_filter(from: &mut SQFrom, filter: &SemanticFilter) -> Vec<SQFilter> {
    let mut renames = std::collections::HashMap::new();
    for (key, source) in filter.from().iter() {
        let variable = from.ensure_entity(&source.schema, &source.entity, Some(key));
        if variable != key {
            renames.insert(key.to_string(), variable);
        }
    }
    filter
        .where_items()
        .iter()
        .map(|w| w.map_exprs(|e| replace_entity_variable(e, &renames)))
        .collect()
}

fn default_select_name(expr: &SQExprRef) -> String {
    match expr.as_ref() {
        SQExpr::ColumnRef(p) | SQExpr::MeasureRef(p) => p.reference.clone(),
        SQExpr::Aggregation(a) => format!("{:?}({})", a.func, default_select_name(&a.arg)),
        SQExpr::HierarchyLevel(l) => l.level.clone(),
        _ => "select".to_string(),
    }
}

fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}{}", base, i))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
