//! Evaluated style objects attached to DataView scopes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sqexpr::fill_rule::EvaluatedFillRule;
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

/// `objectName -> object`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataViewObjects(pub BTreeMap<String, DataViewObject>);

/// Evaluated properties of one object, plus per-id instances for objects
/// addressed through `id` selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewObject {
    #[serde(default)]
    pub properties: BTreeMap<String, DataViewPropertyValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub instances: BTreeMap<String, BTreeMap<String, DataViewPropertyValue>>,
}

impl DataViewObjects {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn object(&self, object_name: &str) -> Option<&DataViewObject> {
        self.0.get(object_name)
    }

    pub fn property(&self, object_name: &str, property_name: &str) -> Option<&DataViewPropertyValue> {
        self.0.get(object_name)?.properties.get(property_name)
    }

    /// Plain value of a property, if it evaluated to one.
    pub fn value(&self, object_name: &str, property_name: &str) -> Option<&DataValue> {
        self.property(object_name, property_name)?.as_value()
    }

    pub fn set_property(
        &mut self,
        object_name: &str,
        property_name: &str,
        value: DataViewPropertyValue,
    ) {
        self.0
            .entry(object_name.to_string())
            .or_default()
            .properties
            .insert(property_name.to_string(), value);
    }

    pub fn set_instance_property(
        &mut self,
        object_name: &str,
        id: &str,
        property_name: &str,
        value: DataViewPropertyValue,
    ) {
        self.0
            .entry(object_name.to_string())
            .or_default()
            .instances
            .entry(id.to_string())
            .or_default()
            .insert(property_name.to_string(), value);
    }
}

// =============================================================================
// Property values
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidColor {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub solid: SolidColor,
}

impl Fill {
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            solid: SolidColor {
                color: color.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageValue {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<String>,
}

/// Text of a run: a literal, or an expression still to be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextRunValue {
    Literal(String),
    Expr { expr: SQExprRef },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub value: TextRunValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub text_style: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub text_runs: Vec<TextRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_text_alignment: Option<String>,
}

pub type Paragraphs = Arc<Vec<Paragraph>>;

/// A concrete property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataViewPropertyValue {
    Value(DataValue),
    /// Definitions of expression-typed properties, passed through unevaluated.
    Expr(SQExprRef),
    Fill(Fill),
    FillRule(EvaluatedFillRule),
    Image(ImageValue),
    Paragraphs(Paragraphs),
}

impl DataViewPropertyValue {
    pub fn as_value(&self) -> Option<&DataValue> {
        match self {
            DataViewPropertyValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fill(&self) -> Option<&Fill> {
        match self {
            DataViewPropertyValue::Fill(f) => Some(f),
            _ => None,
        }
    }
}

impl From<DataValue> for DataViewPropertyValue {
    fn from(value: DataValue) -> Self {
        DataViewPropertyValue::Value(value)
    }
}
