//! Object descriptors: the objects and properties a visual declares.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PropertyTypeDescriptor, StructuralType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataViewObjectDescriptors(pub BTreeMap<String, DataViewObjectDescriptor>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewObjectDescriptor {
    #[serde(default)]
    pub properties: BTreeMap<String, DataViewObjectPropertyDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataViewObjectPropertyDescriptor {
    #[serde(rename = "type")]
    pub property_type: PropertyTypeDescriptor,
}

impl DataViewObjectPropertyDescriptor {
    pub fn new(property_type: PropertyTypeDescriptor) -> Self {
        Self { property_type }
    }

    pub fn structural(structural: StructuralType) -> Self {
        Self::new(PropertyTypeDescriptor::Structural(structural))
    }
}

/// `(object, property)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewObjectPropertyIdentifier {
    pub object_name: String,
    pub property_name: String,
}

impl DataViewObjectDescriptors {
    pub fn object(&self, object_name: &str) -> Option<&DataViewObjectDescriptor> {
        self.0.get(object_name)
    }

    pub fn property(
        &self,
        object_name: &str,
        property_name: &str,
    ) -> Option<&DataViewObjectPropertyDescriptor> {
        self.0.get(object_name)?.properties.get(property_name)
    }

    /// Builder helper used by hosts and tests.
    pub fn with_property(
        mut self,
        object_name: &str,
        property_name: &str,
        descriptor: DataViewObjectPropertyDescriptor,
    ) -> Self {
        self.0
            .entry(object_name.to_string())
            .or_default()
            .properties
            .insert(property_name.to_string(), descriptor);
        self
    }

    /// The first property typed as a format string.
    pub fn find_format_string(&self) -> Option<DataViewObjectPropertyIdentifier> {
        self.find_property(|p| {
            p.property_type
                .value()
                .is_some_and(|v| v.is_format_string())
        })
    }

    /// The first property typed as a filter.
    pub fn find_filter_output(&self) -> Option<DataViewObjectPropertyIdentifier> {
        self.find_property(|p| p.property_type.structural() == Some(StructuralType::Filter))
    }

    fn find_property(
        &self,
        mut predicate: impl FnMut(&DataViewObjectPropertyDescriptor) -> bool,
    ) -> Option<DataViewObjectPropertyIdentifier> {
        self.0.iter().find_map(|(object_name, object)| {
            object
                .properties
                .iter()
                .find(|(_, p)| predicate(*p))
                .map(|(property_name, _)| DataViewObjectPropertyIdentifier {
                    object_name: object_name.clone(),
                    property_name: property_name.clone(),
                })
        })
    }
}
