//! Read-only conceptual schema.
//!
//! The schema provider itself lives outside this crate; these types are the
//! lookup surface the expression engine needs (entity, property, hierarchy
//! and level resolution plus a few capabilities).

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// Set of conceptual schemas addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FederatedConceptualSchema {
    pub schemas: Vec<ConceptualSchema>,
}

impl FederatedConceptualSchema {
    pub fn new(schemas: Vec<ConceptualSchema>) -> Self {
        Self { schemas }
    }

    pub fn schema(&self, name: &str) -> Option<&ConceptualSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn entity(&self, schema: &str, entity: &str) -> Option<&ConceptualEntity> {
        self.schema(schema)?.entities.with_name(entity)
    }

    pub fn find_property(
        &self,
        schema: &str,
        entity: &str,
        property: &str,
    ) -> Option<&ConceptualProperty> {
        self.entity(schema, entity)?.property(property)
    }

    pub fn find_hierarchy(
        &self,
        schema: &str,
        entity: &str,
        hierarchy: &str,
    ) -> Option<&ConceptualHierarchy> {
        self.entity(schema, entity)?.hierarchy(hierarchy)
    }

    pub fn find_hierarchy_level(
        &self,
        schema: &str,
        entity: &str,
        hierarchy: &str,
        level: &str,
    ) -> Option<&ConceptualHierarchyLevel> {
        self.find_hierarchy(schema, entity, hierarchy)?
            .levels
            .iter()
            .find(|l| l.name == level)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptualSchema {
    pub name: String,
    #[serde(default)]
    pub entities: ConceptualEntities,
    #[serde(default)]
    pub capabilities: ConceptualCapabilities,
}

/// Capabilities advertised by the schema's data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptualCapabilities {
    pub supports_median: bool,
    pub supports_percentile: bool,
    pub supports_scoped_eval: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptualEntities(pub Vec<ConceptualEntity>);

impl ConceptualEntities {
    pub fn with_name(&self, name: &str) -> Option<&ConceptualEntity> {
        self.0.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptualEntity {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<ConceptualProperty>,
    #[serde(default)]
    pub hierarchies: Vec<ConceptualHierarchy>,
}

impl ConceptualEntity {
    pub fn property(&self, name: &str) -> Option<&ConceptualProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn hierarchy(&self, name: &str) -> Option<&ConceptualHierarchy> {
        self.hierarchies.iter().find(|h| h.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptualPropertyKind {
    Column,
    Measure,
    Kpi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptualProperty {
    pub name: String,
    pub kind: ConceptualPropertyKind,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ConceptualColumn>,
}

impl ConceptualProperty {
    pub fn column(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: ConceptualPropertyKind::Column,
            value_type,
            format: None,
            column: Some(ConceptualColumn::default()),
        }
    }

    pub fn measure(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: ConceptualPropertyKind::Measure,
            value_type,
            format: None,
            column: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn is_measure(&self) -> bool {
        matches!(
            self.kind,
            ConceptualPropertyKind::Measure | ConceptualPropertyKind::Kpi
        )
    }

    pub fn id_on_entity_key(&self) -> bool {
        self.column.as_ref().is_some_and(|c| c.id_on_entity_key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptualColumn {
    pub default_aggregate: Option<ConceptualDefaultAggregate>,
    /// The column is the identity (key) of its entity.
    pub id_on_entity_key: bool,
    pub variations: Vec<ConceptualVariationSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptualDefaultAggregate {
    Default,
    None,
    Sum,
    Count,
    Min,
    Max,
    Average,
    DistinctCount,
}

/// A variation source: a column whose values navigate to another entity
/// (typically a date table) exposing its own hierarchies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptualVariationSource {
    pub name: String,
    pub target_entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hierarchy: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptualHierarchy {
    pub name: String,
    #[serde(default)]
    pub levels: Vec<ConceptualHierarchyLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptualHierarchyLevel {
    pub name: String,
    /// Name of the column property on the same entity.
    pub column: String,
}
