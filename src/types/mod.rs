//! Value classification: primitive/extended types, descriptors and runtime values.

pub mod descriptor;
pub mod primitive_value;
pub mod value_type;

pub use descriptor::{
    FormattingTypeDescriptor, GeographyTypeDescriptor, MiscellaneousTypeDescriptor,
    OperationalTypeDescriptor, PropertyTypeDescriptor, ScriptTypeDescriptor, StructuralType,
    TemporalTypeDescriptor, ValueTypeDescriptor,
};
pub use primitive_value::{DataValue, DateTimeValue};
pub use value_type::{
    ExtendedType, FormattingCategory, GeographyCategory, MiscellaneousCategory, PrimitiveType,
    TemporalCategory, ValueType,
};
