//! Query projections per role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transform::options::DataViewTransforms;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProjection {
    pub query_ref: String,
}

impl QueryProjection {
    pub fn new(query_ref: impl Into<String>) -> Self {
        Self {
            query_ref: query_ref.into(),
        }
    }
}

/// Projections bound to one role, in display order. A drillable role lists
/// the projections currently drilled into as `active_projection_refs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProjectionCollection {
    pub items: Vec<QueryProjection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_projection_refs: Option<Vec<String>>,
}

impl QueryProjectionCollection {
    pub fn new(items: Vec<QueryProjection>) -> Self {
        Self {
            items,
            active_projection_refs: None,
        }
    }

    pub fn with_active(mut self, refs: Vec<String>) -> Self {
        self.active_projection_refs = Some(refs);
        self
    }

    pub fn is_drillable(&self) -> bool {
        self.active_projection_refs
            .as_ref()
            .is_some_and(|refs| !refs.is_empty())
    }

    /// The projections in effect: the active ones for a drilled role,
    /// otherwise all of them.
    pub fn active(&self) -> Vec<&QueryProjection> {
        match &self.active_projection_refs {
            Some(refs) if !refs.is_empty() => self
                .items
                .iter()
                .filter(|p| refs.contains(&p.query_ref))
                .collect(),
            _ => self.items.iter().collect(),
        }
    }
}

pub type QueryProjectionsByRole = BTreeMap<String, QueryProjectionCollection>;

/// Build role projections from select transforms. Items follow the role's
/// `ordering` when one is given, select order otherwise; `active_items`
/// become the active projection refs.
pub fn projections_from_selects(transforms: &DataViewTransforms) -> QueryProjectionsByRole {
    let mut by_role: BTreeMap<String, Vec<(usize, QueryProjection)>> = BTreeMap::new();
    for (index, select) in transforms.indexed_selects() {
        let Some(query_name) = &select.query_name else {
            continue;
        };
        for (role, bound) in &select.roles {
            if *bound {
                by_role
                    .entry(role.clone())
                    .or_default()
                    .push((index, QueryProjection::new(query_name.clone())));
            }
        }
    }

    let roles = transforms.roles.as_ref();
    by_role
        .into_iter()
        .map(|(role, mut items)| {
            if let Some(ordering) = roles.and_then(|r| r.ordering.get(&role)) {
                let position = |index: usize| ordering.iter().position(|&o| o == index).unwrap_or(usize::MAX);
                items.sort_by_key(|(index, _)| position(*index));
            }
            let mut collection =
                QueryProjectionCollection::new(items.into_iter().map(|(_, p)| p).collect());
            if let Some(active) = roles.and_then(|r| r.active_items.get(&role)) {
                collection = collection.with_active(active.clone());
            }
            (role, collection)
        })
        .collect()
}

/// Number of projections in effect across `roles`.
pub fn count_roles(roles: &[&str], projections: &QueryProjectionsByRole) -> usize {
    roles
        .iter()
        .filter_map(|role| projections.get(*role))
        .map(|collection| collection.active().len())
        .sum()
}
