//! Semantic queries and filters.
//!
//! [`SemanticQuery`] and [`SemanticFilter`] are immutable: every mutator
//! returns a new value. Expressions inside them keep full entity references
//! (schema and entity name) plus the variable bound in the owning
//! [`SQFrom`]; each edit rebases new expressions onto that `from` and then
//! trims variables nothing references any more.

pub mod contract;
pub mod from;
pub mod semantic_filter;
pub mod semantic_query;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data_view::SortDirection;
use crate::sqexpr::utils::gather_entity_variables;
use crate::sqexpr::{rewrite_children, SQExpr, SQExprBuilder, SQExprRef, SQExprRewriter};

pub use contract::{EntitySource, FilterDefinition, QueryDefinition};
pub use from::{SQFrom, SQFromEntitySource};
pub use semantic_filter::SemanticFilter;
pub use semantic_query::SemanticQuery;

/// A named select or group-by item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSQExpr {
    pub name: String,
    pub expr: SQExprRef,
}

impl NamedSQExpr {
    pub fn new(name: impl Into<String>, expr: SQExprRef) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// A `where` clause. `target` restricts the condition to some fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SQFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<SQExprRef>>,
    pub condition: SQExprRef,
}

impl SQFilter {
    pub fn new(condition: SQExprRef) -> Self {
        Self {
            target: None,
            condition,
        }
    }

    fn map_exprs(&self, mut f: impl FnMut(&SQExprRef) -> SQExprRef) -> Self {
        Self {
            target: self.target.as_ref().map(|t| t.iter().map(&mut f).collect()),
            condition: f(&self.condition),
        }
    }

    fn exprs(&self) -> impl Iterator<Item = &SQExprRef> {
        self.target
            .iter()
            .flatten()
            .chain(std::iter::once(&self.condition))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SQSortDefinition {
    pub expr: SQExprRef,
    pub direction: SortDirection,
}

// =============================================================================
// Rebasing
// =============================================================================

/// Binds every entity under an expression to a variable of `from`, adding
/// entities that are missing and renaming variables that collide.
struct SourceRebaser<'a> {
    from: &'a mut SQFrom,
}

impl SQExprRewriter for SourceRebaser<'_> {
    fn rewrite(&mut self, expr: &SQExprRef) -> SQExprRef {
        if let SQExpr::Entity(entity) = expr.as_ref() {
            let variable =
                self.from
                    .ensure_entity(&entity.schema, &entity.entity, entity.variable.as_deref());
            if entity.variable.as_deref() == Some(variable.as_str()) {
                return Arc::clone(expr);
            }
            return SQExprBuilder::entity(&entity.schema, &entity.entity, Some(&variable));
        }
        rewrite_children(self, expr)
    }
}

/// Rebase `expr` onto `from`; see [`SourceRebaser`].
pub(crate) fn rebase_expr(from: &mut SQFrom, expr: &SQExprRef) -> SQExprRef {
    SourceRebaser { from }.rewrite(expr)
}

/// Drop `from` variables that no expression references.
pub(crate) fn trim_from<'a>(from: &SQFrom, exprs: impl IntoIterator<Item = &'a SQExprRef>) -> SQFrom {
    let used: BTreeSet<String> = exprs
        .into_iter()
        .flat_map(gather_entity_variables)
        .collect();
    let mut trimmed = from.clone();
    trimmed.retain(|key| used.contains(key));
    trimmed
}
