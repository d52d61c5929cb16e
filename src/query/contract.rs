//! Query contract: the wire form of queries and filters.
//!
//! In the contract, `from` is a list of named entity sources and every
//! entity node carries only its source variable:
//!
//! ```json
//! {"from": [{"name": "s", "schema": "model", "entity": "Sales"}],
//!  "select": [{"name": "Amount", "expr": {"kind": "ColumnRef", "ref": "Amount",
//!              "source": {"kind": "Entity", "variable": "s"}}}]}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NamedSQExpr, SQFilter, SQFrom, SQFromEntitySource, SQSortDefinition};
use super::{SemanticFilter, SemanticQuery};
use crate::error::{EngineError, Result};
use crate::sqexpr::{rewrite_children, SQExpr, SQExprBuilder, SQExprRef, SQExprRewriter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySource {
    pub name: String,
    pub schema: String,
    pub entity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    pub from: Vec<EntitySource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<NamedSQExpr>,
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_items: Vec<SQFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SQSortDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<NamedSQExpr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub from: Vec<EntitySource>,
    #[serde(rename = "where")]
    pub where_items: Vec<SQFilter>,
}

impl QueryDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::json("query definition", e))
    }
}

impl FilterDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::json("filter definition", e))
    }
}

impl SemanticQuery {
    pub fn to_query_definition(&self) -> QueryDefinition {
        QueryDefinition {
            from: sources_of(self.from()),
            select: self.selects().iter().map(to_source_named).collect(),
            where_items: self.where_items().iter().map(to_source_filter).collect(),
            order_by: self
                .order_by_items()
                .iter()
                .map(|o| SQSortDefinition {
                    expr: to_source_ref(&o.expr),
                    direction: o.direction,
                })
                .collect(),
            group_by: self.group_by_items().iter().map(to_source_named).collect(),
        }
    }

    pub fn from_query_definition(definition: &QueryDefinition) -> Result<Self> {
        let from = from_sources(&definition.from);
        let select = resolve_named(&from, &definition.select)?;
        let where_items = resolve_filters(&from, &definition.where_items)?;
        let order_by = definition
            .order_by
            .iter()
            .map(|o| {
                Ok(SQSortDefinition {
                    expr: resolve_source_ref(&from, &o.expr)?,
                    direction: o.direction,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let group_by = resolve_named(&from, &definition.group_by)?;
        Ok(SemanticQuery::create(from, where_items, order_by, select, group_by))
    }
}

impl SemanticFilter {
    pub fn to_filter_definition(&self) -> FilterDefinition {
        FilterDefinition {
            from: sources_of(self.from()),
            where_items: self.where_items().iter().map(to_source_filter).collect(),
        }
    }

    pub fn from_filter_definition(definition: &FilterDefinition) -> Result<Self> {
        let from = from_sources(&definition.from);
        let where_items = resolve_filters(&from, &definition.where_items)?;
        Ok(SemanticFilter::new(from, where_items))
    }
}

// =============================================================================
// Conversion helpers
// =============================================================================

fn sources_of(from: &SQFrom) -> Vec<EntitySource> {
    from.iter()
        .map(|(name, source)| EntitySource {
            name: name.to_string(),
            schema: source.schema.clone(),
            entity: source.entity.clone(),
        })
        .collect()
}

fn from_sources(sources: &[EntitySource]) -> SQFrom {
    let mut from = SQFrom::new();
    for source in sources {
        from.insert(
            source.name.clone(),
            SQFromEntitySource::new(&source.schema, &source.entity),
        );
    }
    from
}

fn to_source_named(named: &NamedSQExpr) -> NamedSQExpr {
    NamedSQExpr::new(named.name.clone(), to_source_ref(&named.expr))
}

fn to_source_filter(filter: &SQFilter) -> SQFilter {
    filter.map_exprs(to_source_ref)
}

fn resolve_named(from: &SQFrom, items: &[NamedSQExpr]) -> Result<Vec<NamedSQExpr>> {
    items
        .iter()
        .map(|n| Ok(NamedSQExpr::new(n.name.clone(), resolve_source_ref(from, &n.expr)?)))
        .collect()
}

fn resolve_filters(from: &SQFrom, items: &[SQFilter]) -> Result<Vec<SQFilter>> {
    items
        .iter()
        .map(|w| {
            let target = match &w.target {
                Some(target) => Some(
                    target
                        .iter()
                        .map(|t| resolve_source_ref(from, t))
                        .collect::<Result<Vec<_>>>()?,
                ),
                None => None,
            };
            Ok(SQFilter {
                target,
                condition: resolve_source_ref(from, &w.condition)?,
            })
        })
        .collect()
}

/// Strip schema and entity names, keeping only variables.
struct ToSourceRef;

impl SQExprRewriter for ToSourceRef {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        match expr.as_ref() {
            SQExpr::Entity(e) => SQExprBuilder::entity("", "", e.variable.as_deref()),
            _ => rewrite_children(self, expr),
        }
    }
}

fn to_source_ref(expr: &SQExprRef) -> SQExprRef {
    ToSourceRef.rewrite(expr)
}

/// Fill in schema and entity names from `from`. The first unresolvable
/// entity is recorded and the rest of the tree is left alone.
struct FromSourceRef<'a> {
    from: &'a SQFrom,
    error: Option<EngineError>,
}

impl SQExprRewriter for FromSourceRef<'_> {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        if self.error.is_some() {
            return Arc::clone(expr);
        }
        match expr.as_ref() {
            SQExpr::Entity(e) => {
                let Some(variable) = e.variable.as_deref() else {
                    self.error = Some(EngineError::MissingSourceVariable {
                        entity: e.entity.clone(),
                    });
                    return Arc::clone(expr);
                };
                match self.from.entity(variable) {
                    Some(source) => {
                        SQExprBuilder::entity(&source.schema, &source.entity, Some(variable))
                    }
                    None => {
                        self.error = Some(EngineError::UnknownSourceVariable(variable.to_string()));
                        Arc::clone(expr)
                    }
                }
            }
            _ => rewrite_children(self, expr),
        }
    }
}

fn resolve_source_ref(from: &SQFrom, expr: &SQExprRef) -> Result<SQExprRef> {
    let mut resolver = FromSourceRef { from, error: None };
    let resolved = resolver.rewrite(expr);
    match resolver.error {
        Some(error) => Err(error),
        None => Ok(resolved),
    }
}
