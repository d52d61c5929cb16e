//! Object-property evaluation.
//!
//! Turns authored [`DataViewObjectPropertyDefinition`]s into concrete
//! [`DataViewPropertyValue`]s within an [`EvalContext`]. Descriptors decide
//! which objects and properties are evaluated at all, and how a value is
//! shaped (a text color under a `Fill` descriptor becomes a solid fill).

use std::sync::Arc;

use tracing::trace;

use super::definitions::{DataViewObjectDefinition, DataViewObjectPropertyDefinition};
use super::descriptors::{DataViewObjectDescriptors, DataViewObjectPropertyDescriptor};
use super::eval_context::EvalContext;
use crate::data_view::objects::{
    DataViewObjects, DataViewPropertyValue, Fill, ImageValue, Paragraph, Paragraphs, TextRun,
    TextRunValue,
};
use crate::format::{DefaultValueFormatter, ValueFormatter};
use crate::sqexpr::{SQExpr, SQExprRef};
use crate::types::{DataValue, StructuralType};

/// Value of an expression in `ctx`. Fill-rule expressions evaluate their
/// input and map it through the rule's gradient to a `#rrggbb` color.
pub fn evaluate_expr(ctx: &mut dyn EvalContext, expr: &SQExprRef) -> Option<DataValue> {
    match expr.as_ref() {
        SQExpr::FillRule(fill_rule) => {
            let input = ctx.get_expr_value(&fill_rule.input)?;
            let allocator = ctx.color_allocator(expr)?;
            allocator.color(&input).map(DataValue::Text)
        }
        _ => ctx.get_expr_value(expr),
    }
}

pub fn evaluate_property(
    ctx: &mut dyn EvalContext,
    descriptor: &DataViewObjectPropertyDescriptor,
    definition: &DataViewObjectPropertyDefinition,
) -> Option<DataViewPropertyValue> {
    // Expression- and filter-typed properties are consumed as expressions.
    if descriptor
        .property_type
        .structural()
        .is_some_and(|s| s.is_expression())
    {
        return match definition {
            DataViewObjectPropertyDefinition::Expr(expr) => {
                Some(DataViewPropertyValue::Expr(Arc::clone(expr)))
            }
            other => other.static_value().map(DataViewPropertyValue::Value),
        };
    }

    match definition {
        DataViewObjectPropertyDefinition::Value(value) => {
            Some(DataViewPropertyValue::Value(value.clone()))
        }
        DataViewObjectPropertyDefinition::Expr(expr) => {
            let value = evaluate_expr(ctx, expr)?;
            let is_fill = descriptor.property_type.structural() == Some(StructuralType::Fill);
            match value {
                DataValue::Text(color) if is_fill => Some(DataViewPropertyValue::Fill(Fill::solid(color))),
                value => Some(DataViewPropertyValue::Value(value)),
            }
        }
        DataViewObjectPropertyDefinition::Fill(fill) => {
            let color = evaluate_expr(ctx, &fill.solid.color)?;
            let color = color.as_str()?.to_string();
            Some(DataViewPropertyValue::Fill(Fill::solid(color)))
        }
        DataViewObjectPropertyDefinition::FillRule(rule) => {
            let ctx: &dyn EvalContext = ctx;
            let evaluated = rule
                .try_map(
                    |c| text_of(ctx, c).ok_or(()),
                    |v| ctx.get_expr_value(v).and_then(|v| v.as_f64()).ok_or(()),
                    |s| text_of(ctx, s).ok_or(()),
                )
                .ok()?;
            Some(DataViewPropertyValue::FillRule(evaluated))
        }
        DataViewObjectPropertyDefinition::Image(image) => {
            let name = text_of(ctx, &image.name)?;
            let url = text_of(ctx, &image.url)?;
            let scaling = image.scaling.as_ref().and_then(|s| text_of(ctx, s));
            Some(DataViewPropertyValue::Image(ImageValue { name, url, scaling }))
        }
        DataViewObjectPropertyDefinition::Paragraphs(paragraphs) => {
            Some(DataViewPropertyValue::Paragraphs(evaluate_paragraphs(ctx, paragraphs)))
        }
    }
}

fn text_of(ctx: &dyn EvalContext, expr: &SQExprRef) -> Option<String> {
    match ctx.get_expr_value(expr)? {
        DataValue::Text(s) => Some(s),
        _ => None,
    }
}

/// Replace expression runs with their formatted values. Paragraphs without
/// expression runs are returned as the same `Arc`.
fn evaluate_paragraphs(ctx: &mut dyn EvalContext, paragraphs: &Paragraphs) -> Paragraphs {
    let has_exprs = paragraphs
        .iter()
        .flat_map(|p| &p.text_runs)
        .any(|run| matches!(run.value, TextRunValue::Expr { .. }));
    if !has_exprs {
        return Arc::clone(paragraphs);
    }

    let formatter = DefaultValueFormatter;
    let evaluated = paragraphs
        .iter()
        .map(|paragraph| Paragraph {
            text_runs: paragraph
                .text_runs
                .iter()
                .map(|run| match &run.value {
                    TextRunValue::Literal(_) => run.clone(),
                    TextRunValue::Expr { expr } => {
                        let value = evaluate_expr(ctx, expr).unwrap_or_default();
                        TextRun {
                            value: TextRunValue::Literal(formatter.format(&value, None)),
                            ..run.clone()
                        }
                    }
                })
                .collect(),
            horizontal_text_alignment: paragraph.horizontal_text_alignment.clone(),
        })
        .collect();
    Arc::new(evaluated)
}

/// Evaluate `(object name, definition)` pairs into [`DataViewObjects`].
///
/// Objects and properties without a descriptor are skipped. Definitions
/// whose selector carries an `id` write to that instance; later definitions
/// override earlier ones. Returns `None` when nothing was produced.
pub fn evaluate_data_view_objects<'d>(
    ctx: &mut dyn EvalContext,
    descriptors: &DataViewObjectDescriptors,
    definitions: impl IntoIterator<Item = (&'d str, &'d DataViewObjectDefinition)>,
) -> Option<DataViewObjects> {
    let mut objects = DataViewObjects::default();

    for (object_name, definition) in definitions {
        let Some(object_descriptor) = descriptors.object(object_name) else {
            trace!(object = object_name, "no descriptor for object; skipped");
            continue;
        };
        let instance_id = definition.selector.as_ref().and_then(|s| s.id.as_deref());

        for (property_name, property_definition) in &definition.properties {
            let Some(property_descriptor) = object_descriptor.properties.get(property_name) else {
                continue;
            };
            let Some(value) = evaluate_property(ctx, property_descriptor, property_definition)
            else {
                continue;
            };
            match instance_id {
                Some(id) => objects.set_instance_property(object_name, id, property_name, value),
                None => objects.set_property(object_name, property_name, value),
            }
        }
    }

    (!objects.is_empty()).then_some(objects)
}
