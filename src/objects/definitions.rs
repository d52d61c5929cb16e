//! Object definitions: authored style properties with their selectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::selector::Selector;
use crate::data_view::objects::Paragraphs;
use crate::sqexpr::{FillRuleDefinition, SQExprRef};
use crate::types::DataValue;

/// `objectName -> definitions`, in authoring order.
pub type DataViewObjectDefinitions = BTreeMap<String, Vec<DataViewObjectDefinition>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewObjectDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    #[serde(default)]
    pub properties: BTreeMap<String, DataViewObjectPropertyDefinition>,
}

impl DataViewObjectDefinition {
    pub fn new(selector: Option<Selector>) -> Self {
        Self {
            selector,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(
        mut self,
        property_name: impl Into<String>,
        definition: DataViewObjectPropertyDefinition,
    ) -> Self {
        self.properties.insert(property_name.into(), definition);
        self
    }

    /// No selector, or one that applies to the whole DataView.
    pub fn is_metadata_level(&self) -> bool {
        self.selector.as_ref().map_or(true, Selector::is_metadata_level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidFillDefinition {
    pub color: SQExprRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillDefinition {
    pub solid: SolidFillDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDefinition {
    pub name: SQExprRef,
    pub url: SQExprRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<SQExprRef>,
}

/// An authored property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataViewObjectPropertyDefinition {
    Value(DataValue),
    /// An expression; `FillRule` expressions evaluate to a color.
    Expr(SQExprRef),
    Fill(FillDefinition),
    FillRule(FillRuleDefinition),
    Image(ImageDefinition),
    Paragraphs(Paragraphs),
}

impl DataViewObjectPropertyDefinition {
    pub fn solid_fill(color: SQExprRef) -> Self {
        DataViewObjectPropertyDefinition::Fill(FillDefinition {
            solid: SolidFillDefinition { color },
        })
    }

    /// The value when known without any evaluation context: literals and
    /// constant expressions.
    pub fn static_value(&self) -> Option<DataValue> {
        match self {
            DataViewObjectPropertyDefinition::Value(v) => Some(v.clone()),
            DataViewObjectPropertyDefinition::Expr(e) => e.as_constant().map(|c| c.value.clone()),
            _ => None,
        }
    }
}

/// Static value of a metadata-level property, if defined.
pub fn static_property_value(
    definitions: &DataViewObjectDefinitions,
    object_name: &str,
    property_name: &str,
) -> Option<DataValue> {
    definitions
        .get(object_name)?
        .iter()
        .filter(|d| d.is_metadata_level())
        .find_map(|d| d.properties.get(property_name)?.static_value())
}
