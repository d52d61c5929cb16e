//! The value-type lattice used to classify columns, constants and properties.
//!
//! A [`ValueType`] wraps an [`ExtendedType`] bit pattern:
//!
//! ```text
//!  31            16 15          8 7            0
//! ┌────────────────┬─────────────┬──────────────┐
//! │ category code  │ type flags  │ primitive    │
//! └────────────────┴─────────────┴──────────────┘
//! ```
//!
//! The low byte is the [`PrimitiveType`], the flag byte marks the families
//! (numeric, temporal, geography, ...), and the upper half carries the
//! extended category (years, city, color, ...).

use serde::{Deserialize, Serialize};

use super::descriptor::{
    FormattingTypeDescriptor, GeographyTypeDescriptor, MiscellaneousTypeDescriptor,
    OperationalTypeDescriptor, ScriptTypeDescriptor, TemporalTypeDescriptor, ValueTypeDescriptor,
};

// =============================================================================
// Primitive Types
// =============================================================================

/// Storage-level type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Null,
    Text,
    Decimal,
    Double,
    Integer,
    Boolean,
    Date,
    DateTime,
    DateTimeZone,
    Time,
    Duration,
    Binary,
    None,
}

impl PrimitiveType {
    /// Numeric code stored in the low byte of an [`ExtendedType`].
    pub const fn code(self) -> u32 {
        match self {
            PrimitiveType::Null => 0,
            PrimitiveType::Text => 1,
            PrimitiveType::Decimal => 2,
            PrimitiveType::Double => 3,
            PrimitiveType::Integer => 4,
            PrimitiveType::Boolean => 5,
            PrimitiveType::Date => 6,
            PrimitiveType::DateTime => 7,
            PrimitiveType::DateTimeZone => 8,
            PrimitiveType::Time => 9,
            PrimitiveType::Duration => 10,
            PrimitiveType::Binary => 11,
            PrimitiveType::None => 12,
        }
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => PrimitiveType::Null,
            1 => PrimitiveType::Text,
            2 => PrimitiveType::Decimal,
            3 => PrimitiveType::Double,
            4 => PrimitiveType::Integer,
            5 => PrimitiveType::Boolean,
            6 => PrimitiveType::Date,
            7 => PrimitiveType::DateTime,
            8 => PrimitiveType::DateTimeZone,
            9 => PrimitiveType::Time,
            10 => PrimitiveType::Duration,
            11 => PrimitiveType::Binary,
            12 => PrimitiveType::None,
            _ => return None,
        })
    }
}

// =============================================================================
// Extended Types
// =============================================================================

/// Bit pattern combining a primitive type, family flags and a category code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtendedType(u32);

const PRIMITIVE_MASK: u32 = 0xFF;
const CATEGORY_SHIFT: u32 = 16;

const fn category(code: u32) -> u32 {
    code << CATEGORY_SHIFT
}

impl ExtendedType {
    // Family flags
    pub const NUMERIC_FLAG: u32 = 1 << 8;
    pub const TEMPORAL_FLAG: u32 = 1 << 9;
    pub const GEOGRAPHY_FLAG: u32 = 1 << 10;
    pub const MISCELLANEOUS_FLAG: u32 = 1 << 11;
    pub const FORMATTING_FLAG: u32 = 1 << 12;
    pub const SCRIPTING_FLAG: u32 = 1 << 13;

    // Primitive types
    pub const NULL: Self = Self(0);
    pub const TEXT: Self = Self(1);
    pub const DECIMAL: Self = Self(Self::NUMERIC_FLAG | 2);
    pub const DOUBLE: Self = Self(Self::NUMERIC_FLAG | 3);
    pub const INTEGER: Self = Self(Self::NUMERIC_FLAG | 4);
    pub const BOOLEAN: Self = Self(5);
    pub const DATE: Self = Self(Self::TEMPORAL_FLAG | 6);
    pub const DATE_TIME: Self = Self(Self::TEMPORAL_FLAG | 7);
    pub const DATE_TIME_ZONE: Self = Self(Self::TEMPORAL_FLAG | 8);
    pub const TIME: Self = Self(Self::TEMPORAL_FLAG | 9);
    pub const DURATION: Self = Self(10);
    pub const BINARY: Self = Self(11);
    pub const NONE: Self = Self(12);

    // Temporal
    pub const YEARS_INTEGER: Self = Self(Self::INTEGER.0 | Self::TEMPORAL_FLAG | category(1));
    pub const YEARS_TEXT: Self = Self(Self::TEXT.0 | Self::TEMPORAL_FLAG | category(1));
    pub const MONTHS_INTEGER: Self = Self(Self::INTEGER.0 | Self::TEMPORAL_FLAG | category(2));
    pub const MONTHS_TEXT: Self = Self(Self::TEXT.0 | Self::TEMPORAL_FLAG | category(2));
    pub const DAY_OF_MONTH_INTEGER: Self =
        Self(Self::INTEGER.0 | Self::TEMPORAL_FLAG | category(3));
    pub const PADDED_DATE_TABLE_DATES: Self = Self(Self::DATE_TIME.0 | category(4));
    pub const QUARTERS_INTEGER: Self = Self(Self::INTEGER.0 | Self::TEMPORAL_FLAG | category(5));

    // Geography
    pub const ADDRESS: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(100));
    pub const CITY: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(101));
    pub const CONTINENT: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(102));
    pub const COUNTRY: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(103));
    pub const COUNTY: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(104));
    pub const REGION: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(105));
    pub const POSTAL_CODE: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(106));
    pub const STATE_OR_PROVINCE: Self =
        Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(107));
    pub const PLACE: Self = Self(Self::TEXT.0 | Self::GEOGRAPHY_FLAG | category(108));
    pub const LATITUDE: Self = Self(Self::DOUBLE.0 | Self::GEOGRAPHY_FLAG | category(109));
    pub const LONGITUDE: Self = Self(Self::DOUBLE.0 | Self::GEOGRAPHY_FLAG | category(110));

    // Miscellaneous
    pub const IMAGE: Self = Self(Self::BINARY.0 | Self::MISCELLANEOUS_FLAG | category(200));
    pub const IMAGE_URL: Self = Self(Self::TEXT.0 | Self::MISCELLANEOUS_FLAG | category(201));
    pub const WEB_URL: Self = Self(Self::TEXT.0 | Self::MISCELLANEOUS_FLAG | category(202));
    pub const BARCODE: Self = Self(Self::TEXT.0 | Self::MISCELLANEOUS_FLAG | category(203));

    // Formatting
    pub const COLOR: Self = Self(Self::TEXT.0 | Self::FORMATTING_FLAG | category(300));
    pub const FORMAT_STRING: Self = Self(Self::TEXT.0 | Self::FORMATTING_FLAG | category(301));
    pub const ALIGNMENT: Self = Self(Self::TEXT.0 | Self::FORMATTING_FLAG | category(306));
    pub const LABEL_DISPLAY_UNITS: Self =
        Self(Self::TEXT.0 | Self::FORMATTING_FLAG | category(307));
    pub const FONT_SIZE: Self = Self(Self::DOUBLE.0 | Self::FORMATTING_FLAG | category(308));
    pub const LABEL_DENSITY: Self = Self(Self::DOUBLE.0 | Self::FORMATTING_FLAG | category(309));

    // Enumeration, scripting, operations
    pub const ENUMERATION: Self = Self(Self::TEXT.0 | category(400));
    pub const SCRIPT_SOURCE: Self = Self(Self::TEXT.0 | Self::SCRIPTING_FLAG | category(500));
    pub const SEARCH_ENABLED: Self = Self(Self::BOOLEAN.0 | category(600));

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn has_flag(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub const fn category_code(self) -> u32 {
        self.0 >> CATEGORY_SHIFT
    }

    /// The primitive type in the low byte; unknown codes read as `Null`.
    pub fn primitive_type(self) -> PrimitiveType {
        PrimitiveType::from_code(self.0 & PRIMITIVE_MASK).unwrap_or(PrimitiveType::Null)
    }
}

// =============================================================================
// Category views
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalCategory {
    Years,
    Months,
    DayOfMonth,
    PaddedDateTableDates,
    Quarters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeographyCategory {
    Address,
    City,
    Continent,
    Country,
    County,
    Region,
    PostalCode,
    StateOrProvince,
    Place,
    Latitude,
    Longitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiscellaneousCategory {
    Image,
    ImageUrl,
    WebUrl,
    Barcode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormattingCategory {
    Color,
    FormatString,
    Alignment,
    LabelDisplayUnits,
    FontSize,
    LabelDensity,
}

// =============================================================================
// ValueType
// =============================================================================

/// Classification of a value: a primitive type plus optional extended category.
///
/// Value types are plain `Copy` values, so no process-wide type cache is
/// needed: two value types are equal iff their extended bit patterns are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ValueTypeDescriptor", into = "ValueTypeDescriptor")]
pub struct ValueType {
    extended: ExtendedType,
}

impl ValueType {
    pub const fn from_extended_type(extended: ExtendedType) -> Self {
        Self { extended }
    }

    pub fn from_primitive_type(primitive: PrimitiveType) -> Self {
        let extended = match primitive {
            PrimitiveType::Null => ExtendedType::NULL,
            PrimitiveType::Text => ExtendedType::TEXT,
            PrimitiveType::Decimal => ExtendedType::DECIMAL,
            PrimitiveType::Double => ExtendedType::DOUBLE,
            PrimitiveType::Integer => ExtendedType::INTEGER,
            PrimitiveType::Boolean => ExtendedType::BOOLEAN,
            PrimitiveType::Date => ExtendedType::DATE,
            PrimitiveType::DateTime => ExtendedType::DATE_TIME,
            PrimitiveType::DateTimeZone => ExtendedType::DATE_TIME_ZONE,
            PrimitiveType::Time => ExtendedType::TIME,
            PrimitiveType::Duration => ExtendedType::DURATION,
            PrimitiveType::Binary => ExtendedType::BINARY,
            PrimitiveType::None => ExtendedType::NONE,
        };
        Self::from_extended_type(extended)
    }

    pub fn text() -> Self {
        Self::from_extended_type(ExtendedType::TEXT)
    }

    pub fn integer() -> Self {
        Self::from_extended_type(ExtendedType::INTEGER)
    }

    pub fn double() -> Self {
        Self::from_extended_type(ExtendedType::DOUBLE)
    }

    pub fn decimal() -> Self {
        Self::from_extended_type(ExtendedType::DECIMAL)
    }

    pub fn boolean() -> Self {
        Self::from_extended_type(ExtendedType::BOOLEAN)
    }

    pub fn date_time() -> Self {
        Self::from_extended_type(ExtendedType::DATE_TIME)
    }

    pub fn null() -> Self {
        Self::from_extended_type(ExtendedType::NULL)
    }

    /// Resolve a descriptor, checking the simple flags first, then the
    /// extended families, then an explicit extended type.
    pub fn from_descriptor(descriptor: &ValueTypeDescriptor) -> Self {
        if descriptor.text {
            return Self::from_extended_type(ExtendedType::TEXT);
        }
        if descriptor.integer {
            return Self::from_extended_type(ExtendedType::INTEGER);
        }
        if descriptor.numeric {
            return Self::from_extended_type(ExtendedType::DOUBLE);
        }
        if descriptor.boolean {
            return Self::from_extended_type(ExtendedType::BOOLEAN);
        }
        if descriptor.date_time {
            return Self::from_extended_type(ExtendedType::DATE_TIME);
        }
        if descriptor.duration {
            return Self::from_extended_type(ExtendedType::DURATION);
        }
        if descriptor.binary {
            return Self::from_extended_type(ExtendedType::BINARY);
        }
        if descriptor.none {
            return Self::from_extended_type(ExtendedType::NONE);
        }

        if let Some(scripting) = &descriptor.scripting {
            if scripting.source {
                return Self::from_extended_type(ExtendedType::SCRIPT_SOURCE);
            }
        }
        if descriptor.enumeration {
            return Self::from_extended_type(ExtendedType::ENUMERATION);
        }
        if let Some(temporal) = &descriptor.temporal {
            if temporal.year {
                return Self::from_extended_type(ExtendedType::YEARS_INTEGER);
            }
            if temporal.month {
                return Self::from_extended_type(ExtendedType::MONTHS_INTEGER);
            }
            if temporal.padded_date_table_date {
                return Self::from_extended_type(ExtendedType::PADDED_DATE_TABLE_DATES);
            }
        }
        if let Some(geo) = &descriptor.geography {
            let extended = if geo.address {
                Some(ExtendedType::ADDRESS)
            } else if geo.city {
                Some(ExtendedType::CITY)
            } else if geo.continent {
                Some(ExtendedType::CONTINENT)
            } else if geo.country {
                Some(ExtendedType::COUNTRY)
            } else if geo.county {
                Some(ExtendedType::COUNTY)
            } else if geo.region {
                Some(ExtendedType::REGION)
            } else if geo.postal_code {
                Some(ExtendedType::POSTAL_CODE)
            } else if geo.state_or_province {
                Some(ExtendedType::STATE_OR_PROVINCE)
            } else if geo.place {
                Some(ExtendedType::PLACE)
            } else if geo.latitude {
                Some(ExtendedType::LATITUDE)
            } else if geo.longitude {
                Some(ExtendedType::LONGITUDE)
            } else {
                None
            };
            if let Some(extended) = extended {
                return Self::from_extended_type(extended);
            }
        }
        if let Some(misc) = &descriptor.misc {
            let extended = if misc.image {
                Some(ExtendedType::IMAGE)
            } else if misc.image_url {
                Some(ExtendedType::IMAGE_URL)
            } else if misc.web_url {
                Some(ExtendedType::WEB_URL)
            } else if misc.barcode {
                Some(ExtendedType::BARCODE)
            } else {
                None
            };
            if let Some(extended) = extended {
                return Self::from_extended_type(extended);
            }
        }
        if let Some(formatting) = &descriptor.formatting {
            let extended = if formatting.color {
                Some(ExtendedType::COLOR)
            } else if formatting.format_string {
                Some(ExtendedType::FORMAT_STRING)
            } else if formatting.alignment {
                Some(ExtendedType::ALIGNMENT)
            } else if formatting.label_display_units {
                Some(ExtendedType::LABEL_DISPLAY_UNITS)
            } else if formatting.font_size {
                Some(ExtendedType::FONT_SIZE)
            } else if formatting.label_density {
                Some(ExtendedType::LABEL_DENSITY)
            } else {
                None
            };
            if let Some(extended) = extended {
                return Self::from_extended_type(extended);
            }
        }
        if let Some(bits) = descriptor.extended_type {
            return Self::from_extended_type(ExtendedType::from_bits(bits));
        }
        if let Some(operations) = &descriptor.operations {
            if operations.search_enabled {
                return Self::from_extended_type(ExtendedType::SEARCH_ENABLED);
            }
        }

        Self::null()
    }

    /// Descriptor that resolves back to exactly this value type.
    pub fn to_descriptor(&self) -> ValueTypeDescriptor {
        let mut descriptor = ValueTypeDescriptor::default();
        match self.extended {
            ExtendedType::TEXT => descriptor.text = true,
            ExtendedType::INTEGER => descriptor.integer = true,
            ExtendedType::DOUBLE => descriptor.numeric = true,
            ExtendedType::BOOLEAN => descriptor.boolean = true,
            ExtendedType::DATE_TIME => descriptor.date_time = true,
            ExtendedType::DURATION => descriptor.duration = true,
            ExtendedType::BINARY => descriptor.binary = true,
            ExtendedType::NONE => descriptor.none = true,
            ExtendedType::COLOR => {
                descriptor.formatting = Some(FormattingTypeDescriptor {
                    color: true,
                    ..Default::default()
                })
            }
            ExtendedType::FORMAT_STRING => {
                descriptor.formatting = Some(FormattingTypeDescriptor {
                    format_string: true,
                    ..Default::default()
                })
            }
            ExtendedType::YEARS_INTEGER => {
                descriptor.temporal = Some(TemporalTypeDescriptor {
                    year: true,
                    ..Default::default()
                })
            }
            ExtendedType::MONTHS_INTEGER => {
                descriptor.temporal = Some(TemporalTypeDescriptor {
                    month: true,
                    ..Default::default()
                })
            }
            ExtendedType::IMAGE_URL => {
                descriptor.misc = Some(MiscellaneousTypeDescriptor {
                    image_url: true,
                    ..Default::default()
                })
            }
            ExtendedType::WEB_URL => {
                descriptor.misc = Some(MiscellaneousTypeDescriptor {
                    web_url: true,
                    ..Default::default()
                })
            }
            ExtendedType::SCRIPT_SOURCE => {
                descriptor.scripting = Some(ScriptTypeDescriptor { source: true })
            }
            ExtendedType::SEARCH_ENABLED => {
                descriptor.operations = Some(OperationalTypeDescriptor {
                    search_enabled: true,
                })
            }
            ExtendedType::ENUMERATION => descriptor.enumeration = true,
            ExtendedType::LATITUDE => {
                descriptor.geography = Some(GeographyTypeDescriptor {
                    latitude: true,
                    ..Default::default()
                })
            }
            ExtendedType::LONGITUDE => {
                descriptor.geography = Some(GeographyTypeDescriptor {
                    longitude: true,
                    ..Default::default()
                })
            }
            other => descriptor.extended_type = Some(other.bits()),
        }
        descriptor
    }

    pub fn extended_type(&self) -> ExtendedType {
        self.extended
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.extended.primitive_type()
    }

    pub fn is_null(&self) -> bool {
        self.primitive_type() == PrimitiveType::Null
    }

    pub fn is_text(&self) -> bool {
        self.primitive_type() == PrimitiveType::Text
    }

    /// Any numeric primitive (decimal, double, integer).
    pub fn is_numeric(&self) -> bool {
        self.extended.has_flag(ExtendedType::NUMERIC_FLAG)
    }

    pub fn is_integer(&self) -> bool {
        self.primitive_type() == PrimitiveType::Integer
    }

    pub fn is_bool(&self) -> bool {
        self.primitive_type() == PrimitiveType::Boolean
    }

    pub fn is_date_time(&self) -> bool {
        matches!(
            self.primitive_type(),
            PrimitiveType::Date | PrimitiveType::DateTime | PrimitiveType::DateTimeZone
        )
    }

    pub fn is_duration(&self) -> bool {
        self.primitive_type() == PrimitiveType::Duration
    }

    pub fn is_binary(&self) -> bool {
        self.primitive_type() == PrimitiveType::Binary
    }

    pub fn is_none(&self) -> bool {
        self.primitive_type() == PrimitiveType::None
    }

    pub fn is_enumeration(&self) -> bool {
        self.extended.category_code() == ExtendedType::ENUMERATION.category_code()
    }

    pub fn temporal(&self) -> Option<TemporalCategory> {
        if !self.extended.has_flag(ExtendedType::TEMPORAL_FLAG)
            && self.extended != ExtendedType::PADDED_DATE_TABLE_DATES
        {
            return None;
        }
        match self.extended.category_code() {
            1 => Some(TemporalCategory::Years),
            2 => Some(TemporalCategory::Months),
            3 => Some(TemporalCategory::DayOfMonth),
            4 => Some(TemporalCategory::PaddedDateTableDates),
            5 => Some(TemporalCategory::Quarters),
            _ => None,
        }
    }

    pub fn geography(&self) -> Option<GeographyCategory> {
        if !self.extended.has_flag(ExtendedType::GEOGRAPHY_FLAG) {
            return None;
        }
        match self.extended.category_code() {
            100 => Some(GeographyCategory::Address),
            101 => Some(GeographyCategory::City),
            102 => Some(GeographyCategory::Continent),
            103 => Some(GeographyCategory::Country),
            104 => Some(GeographyCategory::County),
            105 => Some(GeographyCategory::Region),
            106 => Some(GeographyCategory::PostalCode),
            107 => Some(GeographyCategory::StateOrProvince),
            108 => Some(GeographyCategory::Place),
            109 => Some(GeographyCategory::Latitude),
            110 => Some(GeographyCategory::Longitude),
            _ => None,
        }
    }

    pub fn misc(&self) -> Option<MiscellaneousCategory> {
        if !self.extended.has_flag(ExtendedType::MISCELLANEOUS_FLAG) {
            return None;
        }
        match self.extended.category_code() {
            200 => Some(MiscellaneousCategory::Image),
            201 => Some(MiscellaneousCategory::ImageUrl),
            202 => Some(MiscellaneousCategory::WebUrl),
            203 => Some(MiscellaneousCategory::Barcode),
            _ => None,
        }
    }

    pub fn formatting(&self) -> Option<FormattingCategory> {
        if !self.extended.has_flag(ExtendedType::FORMATTING_FLAG) {
            return None;
        }
        match self.extended.category_code() {
            300 => Some(FormattingCategory::Color),
            301 => Some(FormattingCategory::FormatString),
            306 => Some(FormattingCategory::Alignment),
            307 => Some(FormattingCategory::LabelDisplayUnits),
            308 => Some(FormattingCategory::FontSize),
            309 => Some(FormattingCategory::LabelDensity),
            _ => None,
        }
    }

    /// Whether a value of type `other` can be stored where `self` is expected.
    pub fn is_compatible_from(&self, other: &ValueType) -> bool {
        let other_primitive = other.primitive_type();
        self == other
            || self.primitive_type() == other_primitive
            || other_primitive == PrimitiveType::Null
    }
}

impl From<ValueTypeDescriptor> for ValueType {
    fn from(descriptor: ValueTypeDescriptor) -> Self {
        ValueType::from_descriptor(&descriptor)
    }
}

impl From<ValueType> for ValueTypeDescriptor {
    fn from(value_type: ValueType) -> Self {
        value_type.to_descriptor()
    }
}
