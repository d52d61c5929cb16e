//! Style objects: descriptors, authored definitions, selectors and their
//! evaluation into [`crate::data_view::DataViewObjects`].

pub mod color;
pub mod definitions;
pub mod descriptors;
pub mod eval_context;
pub mod evaluator;
pub mod selector;

pub use color::{GradientColorAllocator, Rgb};
pub use definitions::{
    static_property_value, DataViewObjectDefinition, DataViewObjectDefinitions,
    DataViewObjectPropertyDefinition, FillDefinition, ImageDefinition, SolidFillDefinition,
};
pub use descriptors::{
    DataViewObjectDescriptor, DataViewObjectDescriptors, DataViewObjectPropertyDescriptor,
    DataViewObjectPropertyIdentifier,
};
pub use eval_context::{
    CategoricalEvalContext, EvalContext, EvalResources, MatrixEvalContext, StaticEvalContext,
    TableEvalContext,
};
pub use evaluator::{evaluate_data_view_objects, evaluate_expr, evaluate_property};
pub use selector::{DataRepetitionSelector, Selector};
