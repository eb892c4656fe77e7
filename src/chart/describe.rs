//! Plain-text chart summaries.

use super::{ChartData, ChartKind};

/// Basic statistics over a non-empty value list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Index of the first maximum.
    pub argmax: usize,
    /// Index of the first minimum.
    pub argmin: usize,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut argmax = 0;
        let mut argmin = 0;
        for (i, v) in values.iter().enumerate() {
            if *v > values[argmax] {
                argmax = i;
            }
            if *v < values[argmin] {
                argmin = i;
            }
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count: values.len(),
            min: values[argmin],
            max: values[argmax],
            // Scale before summing so large finite inputs cannot overflow.
            mean: values.iter().map(|v| v / values.len() as f64).sum(),
            median,
            argmax,
            argmin,
        })
    }
}

/// Magnitude from which numbers switch to exponent notation.
const EXPONENT_FROM: f64 = 1e15;

/// Whole numbers print without a fraction (`30`), others as-is (`12.5`).
fn plain(v: f64) -> String {
    if v.abs() >= EXPONENT_FROM {
        format!("{:.3e}", v)
    } else if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// One decimal place, or exponent notation for huge magnitudes.
fn one_decimal(v: f64) -> String {
    if v.abs() >= EXPONENT_FROM {
        format!("{:.3e}", v)
    } else {
        format!("{:.1}", v)
    }
}

pub fn describe_bar_chart(data: &ChartData) -> String {
    let Some(s) = Summary::of(&data.values) else {
        return "Empty chart - no data provided.".to_string();
    };
    let label = |i: usize| data.categories.get(i).map(String::as_str).unwrap_or("?");
    format!(
        "Bar chart showing {} categories with values ranging from {} to {}. \
         Average value: {}. Highest: {} ({}). Lowest: {} ({}).",
        data.categories.len(),
        plain(s.min),
        plain(s.max),
        one_decimal(s.mean),
        label(s.argmax),
        plain(s.max),
        label(s.argmin),
        plain(s.min),
    )
}

pub fn describe_chart(kind: ChartKind, values: &[f64]) -> String {
    match Summary::of(values) {
        Some(s) => format!(
            "{} chart with {} data points. Range: {} to {}. Mean: {}, Median: {}.",
            kind.label(),
            s.count,
            one_decimal(s.min),
            one_decimal(s.max),
            one_decimal(s.mean),
            one_decimal(s.median)
        ),
        None => "Empty chart - no data provided.".to_string(),
    }
}
