//! Wire descriptors for value types and structural (object-property) types.

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Flag-style description of a value type, as it appears in role and
/// object-property declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueTypeDescriptor {
    #[serde(skip_serializing_if = "is_false")]
    pub text: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub numeric: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub integer: bool,
    #[serde(rename = "bool", skip_serializing_if = "is_false")]
    pub boolean: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub date_time: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub duration: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub binary: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub none: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalTypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geography: Option<GeographyTypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misc: Option<MiscellaneousTypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FormattingTypeDescriptor>,
    #[serde(skip_serializing_if = "is_false")]
    pub enumeration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripting: Option<ScriptTypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<OperationalTypeDescriptor>,
    /// Raw extended-type bits, used for types with no dedicated flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_type: Option<u32>,
}

impl ValueTypeDescriptor {
    pub fn text() -> Self {
        Self {
            text: true,
            ..Default::default()
        }
    }

    pub fn numeric() -> Self {
        Self {
            numeric: true,
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Default::default()
        }
    }

    pub fn boolean() -> Self {
        Self {
            boolean: true,
            ..Default::default()
        }
    }

    pub fn date_time() -> Self {
        Self {
            date_time: true,
            ..Default::default()
        }
    }

    pub fn format_string() -> Self {
        Self {
            formatting: Some(FormattingTypeDescriptor {
                format_string: true,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn color() -> Self {
        Self {
            formatting: Some(FormattingTypeDescriptor {
                color: true,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn is_format_string(&self) -> bool {
        self.formatting.as_ref().is_some_and(|f| f.format_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemporalTypeDescriptor {
    pub year: bool,
    pub month: bool,
    pub padded_date_table_date: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeographyTypeDescriptor {
    pub address: bool,
    pub city: bool,
    pub continent: bool,
    pub country: bool,
    pub county: bool,
    pub region: bool,
    pub postal_code: bool,
    pub state_or_province: bool,
    pub place: bool,
    pub latitude: bool,
    pub longitude: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiscellaneousTypeDescriptor {
    pub image: bool,
    pub image_url: bool,
    pub web_url: bool,
    pub barcode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingTypeDescriptor {
    pub color: bool,
    pub format_string: bool,
    pub alignment: bool,
    pub label_display_units: bool,
    pub font_size: bool,
    pub label_density: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptTypeDescriptor {
    pub source: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationalTypeDescriptor {
    pub search_enabled: bool,
}

// =============================================================================
// Structural types
// =============================================================================

/// Object-property types that are not plain values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructuralType {
    Fill,
    FillRule,
    Image,
    Paragraphs,
    /// Consumed later as an expression (e.g. a filter); never evaluated.
    Expression,
    Filter,
}

impl StructuralType {
    /// Whether definitions of this type are returned verbatim.
    pub fn is_expression(&self) -> bool {
        matches!(self, StructuralType::Expression | StructuralType::Filter)
    }
}

/// Declared type of an object property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyTypeDescriptor {
    Value(ValueTypeDescriptor),
    Structural(StructuralType),
}

impl PropertyTypeDescriptor {
    pub fn structural(&self) -> Option<StructuralType> {
        match self {
            PropertyTypeDescriptor::Structural(s) => Some(*s),
            PropertyTypeDescriptor::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&ValueTypeDescriptor> {
        match self {
            PropertyTypeDescriptor::Value(v) => Some(v),
            PropertyTypeDescriptor::Structural(_) => None,
        }
    }
}
