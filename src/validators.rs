//! Input sanitisation for query and body parameters.
//!
//! All functions are pure and fail with [`Error::Validation`] before any
//! external call is made.

use crate::chart::ChartKind;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>{}]").unwrap());

pub const DEFAULT_GRADE: &str = "9-12";
pub const VALID_GRADES: [&str; 5] = ["K-5", "6-8", "9-12", "college", "graduate"];

const MAX_TEXT_LENGTH: usize = 200;
const MAX_MESSAGE_LENGTH: usize = 1000;

fn sanitize(text: &str) -> String {
    UNSAFE_CHARS.replace_all(text, "").into_owned()
}

fn check_length(field: &str, label: &str, text: &str, min: usize, max: usize) -> Result<()> {
    let len = text.chars().count();
    if len > max {
        return Err(Error::validation_with_value(
            format!("{label} too long (max {max} characters)"),
            field,
            len,
        ));
    }
    if len < min {
        return Err(Error::validation_with_value(
            format!("{label} too short (min {min} characters)"),
            field,
            len,
        ));
    }
    Ok(())
}

/// Trim, bound to 2..=200 characters and strip markup characters.
pub fn validate_topic(topic: &str) -> Result<String> {
    if topic.is_empty() {
        return Err(Error::validation("Topic cannot be empty", "topic"));
    }
    let topic = topic.trim();
    check_length("topic", "Topic", topic, 2, MAX_TEXT_LENGTH)?;
    Ok(sanitize(topic))
}

/// Normalise a grade to one of [`VALID_GRADES`]; numeric grades 1-12 map to their band.
pub fn validate_grade(grade: &str) -> Result<String> {
    let grade = grade.trim();
    if grade.is_empty() {
        return Ok(DEFAULT_GRADE.to_string());
    }
    if VALID_GRADES.contains(&grade) {
        return Ok(grade.to_string());
    }

    let band = match grade.parse::<i64>() {
        Ok(1..=5) => "K-5",
        Ok(6..=8) => "6-8",
        Ok(9..=12) => "9-12",
        _ => {
            return Err(Error::validation_with_value(
                format!("Invalid grade: {grade}. Use K-5, 6-8, 9-12, college, or graduate"),
                "grade",
                grade,
            ))
        }
    };
    Ok(band.to_string())
}

pub fn validate_chart_type(chart_type: &str) -> Result<ChartKind> {
    let normalized = chart_type.trim().to_lowercase();
    normalized.parse::<ChartKind>().map_err(|_| {
        Error::validation_with_value(
            format!(
                "Invalid chart type: {normalized}. Must be one of {}",
                ChartKind::ALL
                    .iter()
                    .map(ChartKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            "chart_type",
            &normalized,
        )
    })
}

/// Trim, bound to 3..=200 characters and strip markup characters.
pub fn validate_title(title: &str) -> Result<String> {
    if title.is_empty() {
        return Err(Error::validation("Title cannot be empty", "title"));
    }
    let title = title.trim();
    check_length("title", "Title", title, 3, MAX_TEXT_LENGTH)?;
    Ok(sanitize(title))
}

/// Bounds for [`validate_list_input`].
#[derive(Debug, Clone, Copy)]
pub struct ListBounds {
    pub min_items: usize,
    pub max_items: usize,
    pub allow_empty: bool,
}

impl Default for ListBounds {
    fn default() -> Self {
        Self {
            min_items: 1,
            max_items: 100,
            allow_empty: true,
        }
    }
}

impl ListBounds {
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn required(mut self) -> Self {
        self.allow_empty = false;
        self
    }
}

/// Split a comma-separated list, dropping blank items.
///
/// Returns `Ok(None)` for missing or empty input when `allow_empty` is set.
pub fn validate_list_input(
    input: Option<&str>,
    field: &str,
    bounds: ListBounds,
) -> Result<Option<Vec<String>>> {
    let input = match input {
        Some(s) if !s.is_empty() => s,
        _ if bounds.allow_empty => return Ok(None),
        _ => return Err(Error::validation(format!("{field} cannot be empty"), field)),
    };

    let items: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.len() < bounds.min_items {
        return Err(Error::validation_with_value(
            format!("{field} must have at least {} items", bounds.min_items),
            field,
            items.len(),
        ));
    }
    if items.len() > bounds.max_items {
        return Err(Error::validation_with_value(
            format!("{field} cannot have more than {} items", bounds.max_items),
            field,
            items.len(),
        ));
    }
    Ok(Some(items))
}

/// Parse a comma-separated list of numbers.
pub fn validate_numeric_list(
    input: Option<&str>,
    field: &str,
    bounds: ListBounds,
) -> Result<Option<Vec<f64>>> {
    let Some(items) = validate_list_input(input, field, bounds)? else {
        return Ok(None);
    };
    items
        .iter()
        .map(|item| {
            item.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    Error::validation_with_value(
                        "Values must be numeric (comma-separated numbers)",
                        field,
                        item,
                    )
                })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Chat messages must carry 2..=1000 characters.
pub fn validate_message(message: &str) -> Result<String> {
    let trimmed_len = message.trim().chars().count();
    if trimmed_len < 2 {
        return Err(Error::validation_with_value(
            "Message too short (minimum 2 characters)",
            "message",
            trimmed_len,
        ));
    }
    let len = message.chars().count();
    if len > MAX_MESSAGE_LENGTH {
        return Err(Error::validation_with_value(
            format!("Message too long (maximum {MAX_MESSAGE_LENGTH} characters)"),
            "message",
            len,
        ));
    }
    Ok(message.to_string())
}
