//! Selectors: which scopes an object definition applies to.

use serde::{Deserialize, Serialize};

use crate::data_view::{
    DataViewMetadataColumn, DataViewRoleWildcard, DataViewScopeIdentity, DataViewScopeWildcard,
};

/// One item of a selector's `data` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataRepetitionSelector {
    Identity(DataViewScopeIdentity),
    ScopeWildcard(DataViewScopeWildcard),
    RoleWildcard(DataViewRoleWildcard),
}

impl DataRepetitionSelector {
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, DataRepetitionSelector::Identity(_))
    }

    /// Whether this item covers `identity`.
    fn covers(&self, identity: &DataViewScopeIdentity) -> bool {
        match self {
            DataRepetitionSelector::Identity(i) => i == identity,
            DataRepetitionSelector::ScopeWildcard(w) => w.matches(identity),
            DataRepetitionSelector::RoleWildcard(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<DataRepetitionSelector>>,
    /// Query name of the column the selector targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Instance id; evaluated values land in the object's `instances`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Selector {
    pub fn with_data(data: Vec<DataRepetitionSelector>) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn for_metadata(query_name: impl Into<String>) -> Self {
        Self {
            metadata: Some(query_name.into()),
            ..Default::default()
        }
    }

    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    fn data_items(&self) -> &[DataRepetitionSelector] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Whether the selector has data items.
    pub fn has_data(&self) -> bool {
        !self.data_items().is_empty()
    }

    /// Any `data` item is a scope or role wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.data_items().iter().any(DataRepetitionSelector::is_wildcard)
    }

    pub fn has_role_wildcard(&self) -> bool {
        self.data_items()
            .iter()
            .any(|d| matches!(d, DataRepetitionSelector::RoleWildcard(_)))
    }

    /// Applies to the DataView as a whole.
    pub fn is_metadata_level(&self) -> bool {
        !self.has_data() && self.metadata.is_none()
    }

    /// Applies to one metadata column.
    pub fn matches_column(&self, column: &DataViewMetadataColumn) -> bool {
        !self.has_data()
            && self.metadata.is_some()
            && self.metadata.as_deref() == column.query_name.as_deref()
    }

    /// Whether the selector addresses the data scope named by `identities`
    /// (for value points, `column` is the value column's source).
    ///
    /// Every data item must match: identities by equality, scope wildcards
    /// by identity field set, role wildcards by the column's roles. Every
    /// scope identity must in turn be covered by an identity or scope
    /// wildcard item.
    pub fn matches_scope(
        &self,
        identities: &[&DataViewScopeIdentity],
        column: Option<&DataViewMetadataColumn>,
    ) -> bool {
        let items = self.data_items();
        if items.is_empty() {
            return false;
        }
        if let Some(query_name) = &self.metadata {
            if column.and_then(|c| c.query_name.as_deref()) != Some(query_name.as_str()) {
                return false;
            }
        }

        let items_match = items.iter().all(|item| match item {
            DataRepetitionSelector::RoleWildcard(w) => {
                column.is_some_and(|c| w.roles.iter().any(|r| c.has_role(r)))
            }
            _ => identities.iter().any(|identity| item.covers(identity)),
        });
        items_match
            && identities
                .iter()
                .all(|identity| items.iter().any(|item| item.covers(identity)))
    }
}
