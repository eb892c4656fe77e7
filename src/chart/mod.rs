//! # Chart Renderer
//!
//! Turns category/value pairs into a base64-encoded PNG plus a plain-text
//! summary computed from the data. Missing data is replaced by randomised
//! sample data so callers always get a usable chart.
//!
//! Rendering is CPU-bound; async callers should run it on
//! `tokio::task::spawn_blocking`.

mod describe;
mod draw;
mod sample;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::Result;

pub use describe::{describe_bar_chart, describe_chart, Summary};

pub const DEFAULT_TITLE: &str = "Sample Data Analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::Histogram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
        }
    }

    /// Capitalised name used at the start of descriptions.
    fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar",
            ChartKind::Line => "Line",
            ChartKind::Scatter => "Scatter",
            ChartKind::Pie => "Pie",
            ChartKind::Histogram => "Histogram",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart type: {0}")]
pub struct UnknownChartKind(pub String);

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

/// Parallel category labels and values. Both vectors have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    /// Fills whichever side is missing: numbered labels for bare values,
    /// random values for bare labels. `None` when both are absent.
    pub fn from_parts(categories: Option<Vec<String>>, values: Option<Vec<f64>>) -> Option<Self> {
        match (categories, values) {
            (Some(categories), Some(values)) => Some(Self { categories, values }),
            (None, Some(values)) => Some(Self {
                categories: (1..=values.len()).map(|i| i.to_string()).collect(),
                values,
            }),
            (Some(categories), None) => Some(Self {
                values: sample::random_values(categories.len(), 10, 100),
                categories,
            }),
            (None, None) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    /// PNG bytes, base64 (standard alphabet).
    pub image_base64: String,
    pub description: String,
}

/// Bar chart; sample data (`Group A`..`Group E`, values in [10, 100)) when nothing is given.
pub fn render_bar_chart(
    title: &str,
    categories: Option<Vec<String>>,
    values: Option<Vec<f64>>,
) -> Result<RenderedChart> {
    let data = ChartData::from_parts(categories, values).unwrap_or_else(sample::bar_data);
    debug!(title, points = data.len(), "Rendering bar chart");
    let image_base64 = draw::render_png(ChartKind::Bar, title, &data)?;
    Ok(RenderedChart {
        image_base64,
        description: describe_bar_chart(&data),
    })
}

/// Any chart kind. Bars go through [`render_bar_chart`]; the others fall back
/// to `Sample 1`..`Sample 5` with values in [20, 100).
pub fn render_chart(kind: ChartKind, title: &str, data: Option<ChartData>) -> Result<RenderedChart> {
    if kind == ChartKind::Bar {
        let (categories, values) = match data {
            Some(d) => (Some(d.categories), Some(d.values)),
            None => (None, None),
        };
        return render_bar_chart(title, categories, values);
    }

    let data = data.unwrap_or_else(sample::custom_data);
    debug!(title, kind = %kind, points = data.len(), "Rendering chart");
    let image_base64 = draw::render_png(kind, title, &data)?;
    Ok(RenderedChart {
        image_base64,
        description: describe_chart(kind, &data.values),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn data(categories: &[&str], values: &[f64]) -> ChartData {
        ChartData {
            categories: categories.iter().map(|s| s.to_string()).collect(),
            values: values.to_vec(),
        }
    }

    fn decode_png(chart: &RenderedChart) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(&chart.image_base64)
            .unwrap()
    }

    #[test]
    fn test_chart_kind_parse() {
        assert_eq!("histogram".parse::<ChartKind>().unwrap(), ChartKind::Histogram);
        assert!("radar".parse::<ChartKind>().is_err());
        assert_eq!(ChartKind::Scatter.to_string(), "scatter");
    }

    #[test]
    fn test_bar_chart_description_and_png() {
        let chart = render_bar_chart(
            "Plant Growth",
            Some(vec!["A".into(), "B".into(), "C".into()]),
            Some(vec![10.0, 20.0, 30.0]),
        )
        .unwrap();
        assert!(chart.description.contains("Average value: 20.0."));
        assert!(chart.description.contains("Highest: C (30)"));
        assert!(chart.description.contains("Lowest: A (10)"));

        let png = decode_png(&chart);
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_bar_chart_sample_data() {
        let chart = render_bar_chart(DEFAULT_TITLE, None, None).unwrap();
        assert!(chart
            .description
            .starts_with("Bar chart showing 5 categories with values ranging from"));
    }

    #[test]
    fn test_every_kind_renders() {
        let d = data(&["a", "b", "c", "d"], &[3.0, 7.5, 1.0, 12.0]);
        for kind in ChartKind::ALL {
            let chart = render_chart(kind, "Every Kind", Some(d.clone())).unwrap();
            assert!(!chart.image_base64.is_empty(), "{kind} produced no image");
        }
    }

    #[test]
    fn test_custom_chart_sample_data() {
        let chart = render_chart(ChartKind::Line, "Trend", None).unwrap();
        assert!(chart.description.starts_with("Line chart with 5 data points."));
    }

    #[test]
    fn test_from_parts_fills_missing_side() {
        let numbered = ChartData::from_parts(None, Some(vec![1.0, 2.0])).unwrap();
        assert_eq!(numbered.categories, vec!["1", "2"]);

        let randomised = ChartData::from_parts(Some(vec!["x".into(), "y".into()]), None).unwrap();
        assert_eq!(randomised.len(), 2);
        assert!(randomised.values.iter().all(|v| (10.0..100.0).contains(v)));

        assert!(ChartData::from_parts(None, None).is_none());
    }

    #[test]
    fn test_title_is_embedded_in_png() {
        let chart = render_chart(ChartKind::Pie, "Energy Mix", Some(data(&["s", "w"], &[1.0, 3.0])))
            .unwrap();
        let png = decode_png(&chart);
        let needle = b"Energy Mix";
        assert!(png.windows(needle.len()).any(|w| w == needle));
    }
}
