//! # DataView
//!
//! Semantic query expressions and the reshaping of query results into the
//! DataViews a visual consumes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQExpr (semantic query expression AST)            │
//! │  (builder, visitors, rewriters, equality, serializer)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SemanticQuery / SemanticFilter (immutable)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [host executes the query]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Prototype DataView                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [analysis + transform + objects]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Visual DataViews (one per split, + regression)    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and single threaded. Expression trees and
//! DataView parts are shared through `Arc`; transforms copy only what they
//! change.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod data_view;
pub mod error;
pub mod format;
pub mod objects;
pub mod query;
pub mod schema;
pub mod sqexpr;
pub mod transform;
pub mod types;

pub use error::{EngineError, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::analysis::{
        choose_data_view_mappings, supports, validate_and_reshape, DataViewCategoricalMapping,
        DataViewMapping, DataViewMatrixMapping, DataViewRoleMapping, RoleCondition,
        VisualDataRole, VisualDataRoleKind,
    };
    pub use crate::config::Settings;
    pub use crate::data_view::{
        DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMatrix, DataViewMetadata,
        DataViewMetadataColumn, DataViewObjects, DataViewScopeIdentity, DataViewTable,
        DataViewValueColumn, DataViewValueColumns,
    };
    pub use crate::objects::{
        DataViewObjectDefinition, DataViewObjectDefinitions, DataViewObjectDescriptors, Selector,
    };
    pub use crate::query::{SemanticFilter, SemanticQuery};
    pub use crate::sqexpr::{SQExpr, SQExprBuilder, SQExprRef, SQExprRewriter, SQExprVisitor};
    pub use crate::transform::{
        DataViewSelectTransform, DataViewTransform, DataViewTransformApplyOptions,
        DataViewTransforms,
    };
    pub use crate::types::{DataValue, ValueType};
}

pub use data_view::DataView;
pub use sqexpr::{SQExpr, SQExprBuilder, SQExprRef};
pub use transform::DataViewTransform;
