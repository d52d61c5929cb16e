//! Gradient color allocation for fill rules.

use crate::sqexpr::fill_rule::EvaluatedFillRule;
use crate::types::DataValue;

/// Null-coloring strategy names.
pub const NULL_STRATEGY_AS_ZERO: &str = "asZero";
pub const NULL_STRATEGY_SPECIFIC_COLOR: &str = "specificColor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` or `#rgb`.
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self {
                r: channel(hex.get(0..2)?)?,
                g: channel(hex.get(2..4)?)?,
                b: channel(hex.get(4..6)?)?,
            }),
            3 => {
                let short = |i: usize| channel(hex.get(i..i + 1)?).map(|c| c * 17);
                Some(Self {
                    r: short(0)?,
                    g: short(1)?,
                    b: short(2)?,
                })
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NullColoring {
    AsZero,
    Color(Rgb),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GradientStop {
    value: f64,
    color: Rgb,
}

/// Maps numbers onto a two- or three-stop linear gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientColorAllocator {
    stops: Vec<GradientStop>,
    null_coloring: Option<NullColoring>,
}

impl GradientColorAllocator {
    /// Build an allocator from an evaluated rule.
    ///
    /// Stops without an explicit value take theirs from `range`: the lowest
    /// stop from its minimum, the highest from its maximum, and a middle stop
    /// from the midpoint. Returns `None` when a stop value cannot be resolved
    /// or a color does not parse.
    pub fn new(
        rule: &EvaluatedFillRule,
        range: Option<(f64, f64)>,
        default_null_color: &str,
    ) -> Option<Self> {
        let stops = rule.stops();
        if stops.len() < 2 {
            return None;
        }
        let last = stops.len() - 1;
        let min = stops[0].value.or(range.map(|r| r.0))?;
        let max = stops[last].value.or(range.map(|r| r.1))?;

        let mut resolved = Vec::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            let value = if i == 0 {
                min
            } else if i == last {
                max
            } else {
                stop.value.unwrap_or((min + max) / 2.0)
            };
            resolved.push(GradientStop {
                value,
                color: Rgb::parse(&stop.color)?,
            });
        }

        let null_coloring = match rule.null_coloring_strategy() {
            Some(n) if n.strategy == NULL_STRATEGY_AS_ZERO => Some(NullColoring::AsZero),
            Some(n) if n.strategy == NULL_STRATEGY_SPECIFIC_COLOR => {
                let color = n.color.as_deref().unwrap_or(default_null_color);
                Rgb::parse(color).map(NullColoring::Color)
            }
            _ => None,
        };

        Some(Self {
            stops: resolved,
            null_coloring,
        })
    }

    /// Color for a cell value. Null follows the null-coloring strategy;
    /// other non-numeric values get no color.
    pub fn color(&self, value: &DataValue) -> Option<String> {
        match value {
            DataValue::Number(n) => Some(self.color_for(*n).to_hex()),
            DataValue::Null => match self.null_coloring? {
                NullColoring::AsZero => Some(self.color_for(0.0).to_hex()),
                NullColoring::Color(c) => Some(c.to_hex()),
            },
            _ => None,
        }
    }

    fn color_for(&self, value: f64) -> Rgb {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if value <= first.value {
            return first.color;
        }
        if value >= last.value {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            if value <= high.value {
                let span = high.value - low.value;
                let t = if span > 0.0 { (value - low.value) / span } else { 0.0 };
                return low.color.lerp(high.color, t);
            }
        }
        last.color
    }
}
