//! Gradient fill rules.
//!
//! The same shape is used twice: as a definition whose stops are
//! expressions, and as an evaluated rule whose stops are concrete colors and
//! numbers. [`FillRule`] is generic over the three slot types.

use serde::{Deserialize, Serialize};

use super::SQExprRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "C: Deserialize<'de>, V: Deserialize<'de>"))]
pub struct RuleColorStop<C, V> {
    pub color: C,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
}

/// How null inputs are colored: by a strategy name (`"asZero"` or
/// `"specificColor"`) and an optional color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "S: Deserialize<'de>, C: Deserialize<'de>"))]
pub struct NullColoringStrategy<S, C> {
    pub strategy: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<C>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "C: Deserialize<'de>, V: Deserialize<'de>, S: Deserialize<'de>"))]
pub struct LinearGradient2<C, V, S> {
    pub min: RuleColorStop<C, V>,
    pub max: RuleColorStop<C, V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_coloring_strategy: Option<NullColoringStrategy<S, C>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "C: Deserialize<'de>, V: Deserialize<'de>, S: Deserialize<'de>"))]
pub struct LinearGradient3<C, V, S> {
    pub min: RuleColorStop<C, V>,
    pub mid: RuleColorStop<C, V>,
    pub max: RuleColorStop<C, V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_coloring_strategy: Option<NullColoringStrategy<S, C>>,
}

/// A two- or three-stop linear gradient. Exactly one variant is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "C: Deserialize<'de>, V: Deserialize<'de>, S: Deserialize<'de>"))]
pub struct FillRule<C, V, S> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_gradient2: Option<LinearGradient2<C, V, S>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_gradient3: Option<LinearGradient3<C, V, S>>,
}

/// Fill rule whose stops are still expressions.
pub type FillRuleDefinition = FillRule<SQExprRef, SQExprRef, SQExprRef>;

/// Fill rule with concrete `#rrggbb` colors and numeric stop values.
pub type EvaluatedFillRule = FillRule<String, f64, String>;

impl<C, V, S> FillRule<C, V, S> {
    pub fn two_stop(min: RuleColorStop<C, V>, max: RuleColorStop<C, V>) -> Self {
        Self {
            linear_gradient2: Some(LinearGradient2 {
                min,
                max,
                null_coloring_strategy: None,
            }),
            linear_gradient3: None,
        }
    }

    pub fn three_stop(
        min: RuleColorStop<C, V>,
        mid: RuleColorStop<C, V>,
        max: RuleColorStop<C, V>,
    ) -> Self {
        Self {
            linear_gradient2: None,
            linear_gradient3: Some(LinearGradient3 {
                min,
                mid,
                max,
                null_coloring_strategy: None,
            }),
        }
    }

    pub fn with_null_coloring(mut self, strategy: NullColoringStrategy<S, C>) -> Self {
        if let Some(gradient) = self.linear_gradient2.as_mut() {
            gradient.null_coloring_strategy = Some(strategy);
        } else if let Some(gradient) = self.linear_gradient3.as_mut() {
            gradient.null_coloring_strategy = Some(strategy);
        }
        self
    }

    pub fn null_coloring_strategy(&self) -> Option<&NullColoringStrategy<S, C>> {
        if let Some(gradient) = &self.linear_gradient2 {
            return gradient.null_coloring_strategy.as_ref();
        }
        self.linear_gradient3
            .as_ref()
            .and_then(|g| g.null_coloring_strategy.as_ref())
    }

    /// Stops from lowest to highest.
    pub fn stops(&self) -> Vec<&RuleColorStop<C, V>> {
        if let Some(g) = &self.linear_gradient2 {
            return vec![&g.min, &g.max];
        }
        if let Some(g) = &self.linear_gradient3 {
            return vec![&g.min, &g.mid, &g.max];
        }
        Vec::new()
    }

    /// Convert every slot, failing on the first conversion error.
    pub fn try_map<C2, V2, S2, E>(
        &self,
        mut color: impl FnMut(&C) -> Result<C2, E>,
        mut value: impl FnMut(&V) -> Result<V2, E>,
        mut strategy: impl FnMut(&S) -> Result<S2, E>,
    ) -> Result<FillRule<C2, V2, S2>, E> {
        let mut stop = |s: &RuleColorStop<C, V>| -> Result<RuleColorStop<C2, V2>, E> {
            Ok(RuleColorStop {
                color: color(&s.color)?,
                value: s.value.as_ref().map(&mut value).transpose()?,
            })
        };
        let linear_gradient2 = match &self.linear_gradient2 {
            Some(g) => Some(LinearGradient2 {
                min: stop(&g.min)?,
                max: stop(&g.max)?,
                null_coloring_strategy: None,
            }),
            None => None,
        };
        let linear_gradient3 = match &self.linear_gradient3 {
            Some(g) => Some(LinearGradient3 {
                min: stop(&g.min)?,
                mid: stop(&g.mid)?,
                max: stop(&g.max)?,
                null_coloring_strategy: None,
            }),
            None => None,
        };

        let null_coloring = match self.null_coloring_strategy() {
            Some(n) => Some(NullColoringStrategy {
                strategy: strategy(&n.strategy)?,
                color: n.color.as_ref().map(&mut color).transpose()?,
            }),
            None => None,
        };

        let rule = FillRule {
            linear_gradient2,
            linear_gradient3,
        };
        Ok(match null_coloring {
            Some(n) => rule.with_null_coloring(n),
            None => rule,
        })
    }
}

impl FillRuleDefinition {
    /// Every expression slot in stop order, followed by the null-coloring slots.
    pub fn exprs(&self) -> Vec<&SQExprRef> {
        let mut out = Vec::new();
        for stop in self.stops() {
            out.push(&stop.color);
            if let Some(value) = &stop.value {
                out.push(value);
            }
        }
        if let Some(n) = self.null_coloring_strategy() {
            out.push(&n.strategy);
            if let Some(color) = &n.color {
                out.push(color);
            }
        }
        out
    }
}
