//! DataView transform pipeline.
//!
//! Turns the query's prototype DataView into the DataViews a visual
//! consumes. For every split of the query:
//!
//! 1. select transforms rename, retype and filter the columns;
//! 2. a category-and-series row matrix is unpivoted into a categorical,
//!    and a series-bound single category is pivoted (or self-cross-joined);
//! 3. matrix composite levels and table columns follow projection order,
//!    and a rows-as-columns matrix is pivoted;
//! 4. multi-column categories capped at one column are concatenated;
//! 5. values of the wrong runtime type for their role are nulled;
//! 6. object definitions are evaluated into every scope.
//!
//! Regression DataViews are appended last. Nothing reachable from the
//! prototype is mutated.

pub mod options;

mod concatenate;
mod matrix_pivot;
mod matrix_unpivot;
mod normalize;
mod objects;
mod pivot;
mod projection_order;
mod regression;
mod selects;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::analysis::{
    choose_data_view_mappings, projections_from_selects, role_kinds_from_metadata,
    DataViewCategoricalMapping, DataViewMapping,
};
use crate::cache::ColorAllocatorCache;
use crate::config::Settings;
use crate::data_view::{DataView, DataViewMetadata};
use crate::format::{DefaultValueFormatter, ValueFormatter};
use crate::objects::{DataViewObjectDefinitions, DataViewObjectDescriptors};

use concatenate::Concatenation;
use normalize::Normalizer;
use objects::ObjectApplication;

pub use options::{
    DataViewRoleTransform, DataViewSelectTransform, DataViewSplitTransform,
    DataViewTransformApplyOptions, DataViewTransforms,
};
pub use pivot::unpivot_categorical;
pub use regression::RegressionLine;

/// Runs the pipeline with the configured separator, regression default and
/// null color, formatting concatenated values with `formatter`.
#[derive(Clone)]
pub struct DataViewTransform {
    settings: Settings,
    formatter: Arc<dyn ValueFormatter>,
}

impl fmt::Debug for DataViewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataViewTransform")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for DataViewTransform {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl DataViewTransform {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            formatter: Arc::new(DefaultValueFormatter),
        }
    }

    pub fn with_formatter(mut self, formatter: impl ValueFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn apply(&self, options: DataViewTransformApplyOptions) -> Vec<DataView> {
        let DataViewTransformApplyOptions {
            prototype,
            object_descriptors,
            data_view_mappings,
            transforms,
            data_roles,
        } = options;
        let mut colors = ColorAllocatorCache::new();

        let Some(prototype) = prototype else {
            let definitions = transforms.as_ref().and_then(|t| t.objects.as_ref());
            return self.objects_only(&object_descriptors, definitions, &mut colors);
        };
        let Some(transforms) = transforms else {
            debug!("no transforms; returning the prototype");
            return vec![prototype];
        };

        let projections = projections_from_selects(&transforms);
        let role_kinds = role_kinds_from_metadata(
            &selects::apply_selects(&prototype, &transforms, None).metadata,
        );
        let chosen = choose_data_view_mappings(
            &projections,
            &data_view_mappings,
            &role_kinds,
            &object_descriptors,
            transforms.objects.as_ref(),
        )
        .supported_mappings;
        let categorical_mapping = single_categorical(&chosen);

        let ordering = transforms
            .roles
            .as_ref()
            .map(|r| &r.ordering)
            .filter(|o| !o.is_empty());
        let matrix_mapping = chosen.iter().find_map(|m| m.matrix.as_ref());
        let concatenation = Concatenation {
            separator: &self.settings.transform.concatenation_separator,
            formatter: self.formatter.as_ref(),
            ordering,
        };
        let normalizer = Normalizer::new(&data_roles);
        let object_application = transforms.objects.as_ref().map(|definitions| ObjectApplication {
            descriptors: &object_descriptors,
            definitions,
            null_color: &self.settings.objects.null_color,
        });

        let splits: Vec<_> = match transforms.splits.as_deref() {
            Some(splits) if !splits.is_empty() => splits.iter().map(Some).collect(),
            _ => vec![None],
        };
        let mut results = Vec::with_capacity(splits.len());
        for split in splits {
            let mut data_view = selects::apply_selects(&prototype, &transforms, split);

            if let Some(mapping) = categorical_mapping {
                if let Some(unpivoted) = matrix_unpivot::unpivot_matrix(&data_view, mapping) {
                    data_view = unpivoted;
                }
                pivot::pivot_if_necessary(&mut data_view, mapping);
            }
            if let Some(matrix) = data_view.matrix.as_mut() {
                if let Some(ordering) = ordering {
                    projection_order::reorder_matrix(Arc::make_mut(matrix), ordering);
                }
                if matrix_mapping.is_some_and(|m| matrix_pivot::should_pivot(matrix, m)) {
                    matrix_pivot::pivot_matrix(Arc::make_mut(matrix));
                }
            }
            if let (Some(table), Some(ordering)) = (data_view.table.as_mut(), ordering) {
                projection_order::reorder_table(Arc::make_mut(table), ordering);
            }
            for mapping in &chosen {
                concatenation.apply(&mut data_view, mapping);
            }
            normalizer.apply(&mut data_view);
            if let Some(application) = &object_application {
                application.apply(&mut data_view, &mut colors);
            }
            results.push(data_view);
        }

        if let Some(usage) = chosen.iter().find_map(DataViewMapping::regression) {
            let combine_series = usage
                .combine_series
                .unwrap_or(self.settings.transform.regression_combine_series);
            let lines: Vec<_> = results
                .iter()
                .filter_map(|data_view| regression::regression_data_view(data_view, usage, combine_series))
                .collect();
            results.extend(lines);
        }

        debug!(data_views = results.len(), mappings = chosen.len(), "applied transforms");
        results
    }

    /// No query result: at most one empty DataView carrying the DataView
    /// level objects.
    fn objects_only(
        &self,
        descriptors: &DataViewObjectDescriptors,
        definitions: Option<&DataViewObjectDefinitions>,
        colors: &mut ColorAllocatorCache,
    ) -> Vec<DataView> {
        let Some(definitions) = definitions else {
            return Vec::new();
        };
        let mut data_view = DataView::new(DataViewMetadata::default());
        ObjectApplication {
            descriptors,
            definitions,
            null_color: &self.settings.objects.null_color,
        }
        .apply(&mut data_view, colors);
        vec![data_view]
    }
}

/// The categorical mapping, when exactly one mapping was chosen and it is
/// categorical.
fn single_categorical(chosen: &[DataViewMapping]) -> Option<&DataViewCategoricalMapping> {
    match chosen {
        [mapping] => mapping.categorical.as_ref(),
        _ => None,
    }
}
