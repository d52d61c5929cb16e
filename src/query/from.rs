//! `SQFrom`: the variable table of a query or filter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The entity a `from` variable stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SQFromEntitySource {
    pub schema: String,
    pub entity: String,
}

impl SQFromEntitySource {
    pub fn new(schema: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            entity: entity.into(),
        }
    }
}

/// Insertion-ordered map of variable name to entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SQFrom {
    entities: IndexMap<String, SQFromEntitySource>,
}

impl SQFrom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn entity(&self, key: &str) -> Option<&SQFromEntitySource> {
        self.entities.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SQFromEntitySource)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Variable already bound to `schema.entity`, if any.
    pub fn find_variable(&self, schema: &str, entity: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|(_, source)| source.schema == schema && source.entity == entity)
            .map(|(key, _)| key.as_str())
    }

    /// Variable for `schema.entity`, adding one when the entity is new.
    ///
    /// A new entity takes `desired_variable` when given and free, otherwise
    /// the lower-cased first letter of the entity name (after its last `.`);
    /// taken names get `2`, `3`, ... appended.
    pub fn ensure_entity(
        &mut self,
        schema: &str,
        entity: &str,
        desired_variable: Option<&str>,
    ) -> String {
        if let Some(existing) = self.find_variable(schema, entity) {
            return existing.to_string();
        }

        let base = desired_variable
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_variable_name(entity));
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.entities.contains_key(&candidate) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }

        self.entities
            .insert(candidate.clone(), SQFromEntitySource::new(schema, entity));
        candidate
    }

    /// Insert under an explicit variable, replacing any previous binding.
    pub fn insert(&mut self, variable: impl Into<String>, source: SQFromEntitySource) {
        self.entities.insert(variable.into(), source);
    }

    /// Keep only the variables for which `keep` holds, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entities.retain(|key, _| keep(key));
    }
}

fn default_variable_name(entity: &str) -> String {
    let short = entity.rsplit('.').next().unwrap_or(entity);
    short
        .chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_else(|| "e".to_string())
}
