//! Linear regression lines.
//!
//! For a mapping with `usage.regression`, the x and y columns of a visual
//! DataView are fitted with least squares and the line is emitted as a new
//! categorical DataView holding two points: the line evaluated at the
//! smallest and largest observed x.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::DataViewRegressionUsage;
use crate::data_view::{
    DataView, DataViewCategorical, DataViewCategoryColumn, DataViewMetadata,
    DataViewMetadataColumn, DataViewScopeIdentity, DataViewValueColumn, DataViewValueColumnGroup,
    DataViewValueColumns,
};
use crate::sqexpr::SQExprRef;
use crate::types::DataValue;

/// `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    pub slope: f64,
    pub intercept: f64,
}

impl RegressionLine {
    /// Least-squares fit. `None` with fewer than two points or when every x
    /// is the same.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
            let dx = x - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        });
        if variance == 0.0 {
            return None;
        }
        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: y_mean - x_mean * slope,
        })
    }

    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One line to fit: the y column it comes from and its points.
struct Series {
    source: Arc<DataViewMetadataColumn>,
    identity: Option<DataViewScopeIdentity>,
    name: Option<DataValue>,
    points: Vec<(f64, f64)>,
}

/// Regression DataView for `data_view`, or `None` when it has no x and y
/// columns or no line can be fitted.
pub(crate) fn regression_data_view(
    data_view: &DataView,
    usage: &DataViewRegressionUsage,
    combine_series: bool,
) -> Option<DataView> {
    let categorical = data_view.categorical.as_ref()?;
    let values = categorical.values.as_ref()?;
    let x_roles = usage.x.roles();
    let y_roles = usage.y.roles();
    let has_role = |column: &DataViewMetadataColumn, roles: &[&str]| roles.iter().any(|r| column.has_role(r));

    let x_category = categorical
        .categories
        .iter()
        .flatten()
        .find(|c| has_role(&c.source, &x_roles));
    let x_source = match x_category {
        Some(category) => Arc::clone(&category.source),
        None => Arc::clone(&values.columns().find(|c| has_role(&c.source, &x_roles))?.source),
    };

    let mut series: Vec<Series> = Vec::new();
    for group in &values.groups {
        let x_values: &[DataValue] = match x_category {
            Some(category) => &category.values,
            None => &group.values.iter().find(|c| has_role(&c.source, &x_roles))?.values,
        };
        for column in group.values.iter().filter(|c| has_role(&c.source, &y_roles)) {
            let points = numeric_points(x_values, &column.values);
            let existing = combine_series
                .then(|| series.iter_mut().find(|s| s.source.same_select(&column.source)))
                .flatten();
            match existing {
                Some(line) => line.points.extend(points),
                None => series.push(Series {
                    source: Arc::clone(&column.source),
                    identity: (!combine_series).then(|| group.identity.clone()).flatten(),
                    name: (!combine_series).then(|| group.name.clone()).flatten(),
                    points,
                }),
            }
        }
    }

    let fitted: Vec<(Series, RegressionLine)> = series
        .into_iter()
        .filter_map(|s| {
            let line = RegressionLine::fit(&s.points)?;
            Some((s, line))
        })
        .collect();
    let (x_min, x_max) = fitted
        .iter()
        .flat_map(|(s, _)| s.points.iter().map(|(x, _)| *x))
        .fold(None, |range: Option<(f64, f64)>, x| match range {
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            None => Some((x, x)),
        })?;
    debug!(lines = fitted.len(), x_min, x_max, "derived regression lines");

    build_data_view(x_source, &fitted, (x_min, x_max), values, combine_series)
}

fn numeric_points(x_values: &[DataValue], y_values: &[DataValue]) -> Vec<(f64, f64)> {
    x_values
        .iter()
        .zip(y_values)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

fn build_data_view(
    x_source: Arc<DataViewMetadataColumn>,
    fitted: &[(Series, RegressionLine)],
    (x_min, x_max): (f64, f64),
    values: &DataViewValueColumns,
    combine_series: bool,
) -> Option<DataView> {
    if fitted.is_empty() {
        return None;
    }

    let mut groups: Vec<DataViewValueColumnGroup> = Vec::new();
    let mut metadata_columns = vec![Arc::clone(&x_source)];
    for (series, line) in fitted {
        let mut source = (*series.source).clone();
        source.display_name = format!("{} (regression)", series.source.display_name);
        let source = Arc::new(source);
        metadata_columns.push(Arc::clone(&source));

        let mut column = DataViewValueColumn::new(
            source,
            vec![line.y_at(x_min).into(), line.y_at(x_max).into()],
        );
        column.identity = series.identity.clone();
        match groups.last_mut() {
            Some(group) if group.identity == series.identity => group.values.push(column),
            _ => groups.push(DataViewValueColumnGroup {
                identity: series.identity.clone(),
                name: series.name.clone(),
                values: vec![column],
                objects: None,
            }),
        }
    }

    let (series_source, identity_fields): (_, Option<Vec<SQExprRef>>) = if combine_series {
        (None, None)
    } else {
        (values.source.clone(), values.identity_fields.clone())
    };
    let categorical = DataViewCategorical {
        categories: Some(vec![DataViewCategoryColumn::new(
            x_source,
            vec![x_min.into(), x_max.into()],
        )]),
        values: Some(DataViewValueColumns {
            groups,
            source: series_source,
            identity_fields,
        }),
    };
    Some(
        DataView::new(DataViewMetadata {
            columns: metadata_columns,
            objects: None,
        })
        .with_categorical(categorical),
    )
}
