//! Turning provider output into a [`ProjectIdea`].

use serde_json::{Map, Value};

use crate::types::ProjectIdea;

/// Result of parsing a provider's answer to the idea prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum IdeaOutcome {
    /// The provider answered with a JSON object carrying at least an `idea`.
    Structured(ProjectIdea),
    /// Anything else; the text becomes the idea body and the rest is templated.
    RawText { text: String, topic: String },
}

impl IdeaOutcome {
    pub fn parse(raw: &str, topic: &str) -> Self {
        let body = strip_code_fence(raw);
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => match structured(&map, topic) {
                Some(idea) => IdeaOutcome::Structured(idea),
                None => IdeaOutcome::raw(raw, topic),
            },
            _ => IdeaOutcome::raw(raw, topic),
        }
    }

    fn raw(text: &str, topic: &str) -> Self {
        IdeaOutcome::RawText {
            text: text.trim().to_string(),
            topic: topic.to_string(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, IdeaOutcome::Structured(_))
    }

    pub fn into_idea(self) -> ProjectIdea {
        match self {
            IdeaOutcome::Structured(idea) => idea,
            IdeaOutcome::RawText { text, topic } => ProjectIdea {
                title: default_title(&topic),
                idea: text,
                hypothesis: default_hypothesis(&topic),
                materials: Some(vec!["Basic materials for the experiment".to_string()]),
                procedure: Some("Follow the scientific method".to_string()),
                analysis: Some("Record observations and draw conclusions".to_string()),
            },
        }
    }
}

fn default_title(topic: &str) -> String {
    format!("{} Science Project", topic)
}

fn default_hypothesis(topic: &str) -> String {
    format!(
        "If we study {}, then we can learn about scientific principles.",
        topic
    )
}

/// Accepts bodies wrapped in ```` ```json ```` fences.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let lines: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

fn list_field(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match map.get(key)? {
        Value::Array(items) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            (!list.is_empty()).then_some(list)
        }
        Value::String(s) if !s.trim().is_empty() => Some(
            s.split(|c| c == ',' || c == '\n')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

fn structured(map: &Map<String, Value>, topic: &str) -> Option<ProjectIdea> {
    let idea = text_field(map, "idea")?;
    Some(ProjectIdea {
        title: text_field(map, "title").unwrap_or_else(|| default_title(topic)),
        idea,
        hypothesis: text_field(map, "hypothesis").unwrap_or_else(|| default_hypothesis(topic)),
        materials: list_field(map, "materials"),
        procedure: text_field(map, "procedure"),
        analysis: text_field(map, "analysis"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_json() {
        let raw = r#"{
            "title": "Bean Race",
            "idea": "Compare bean growth under LED colours.",
            "hypothesis": "If beans get blue light, then they grow fastest.",
            "materials": ["beans", "LEDs"],
            "procedure": ["Plant", "Measure daily"]
        }"#;
        let outcome = IdeaOutcome::parse(raw, "plants");
        assert!(outcome.is_structured());
        let idea = outcome.into_idea();
        assert_eq!(idea.title, "Bean Race");
        assert_eq!(idea.materials.unwrap(), vec!["beans", "LEDs"]);
        assert_eq!(idea.procedure.as_deref(), Some("Plant\nMeasure daily"));
        assert!(idea.analysis.is_none());
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"title\": \"T\", \"idea\": \"I\", \"hypothesis\": \"H\"}\n```";
        let idea = IdeaOutcome::parse(raw, "magnets").into_idea();
        assert_eq!(idea.title, "T");
        assert_eq!(idea.hypothesis, "H");
    }

    #[test]
    fn test_raw_text_is_templated() {
        let outcome = IdeaOutcome::parse("Build a small wind turbine.", "energy");
        assert!(!outcome.is_structured());
        let idea = outcome.into_idea();
        assert_eq!(idea.title, "energy Science Project");
        assert_eq!(idea.idea, "Build a small wind turbine.");
        assert_eq!(
            idea.hypothesis,
            "If we study energy, then we can learn about scientific principles."
        );
        assert_eq!(idea.procedure.as_deref(), Some("Follow the scientific method"));
    }

    #[test]
    fn test_json_without_idea_falls_back_to_raw() {
        let raw = r#"{"title": "Only a title"}"#;
        let idea = IdeaOutcome::parse(raw, "sound").into_idea();
        assert_eq!(idea.idea, raw);
        assert_eq!(idea.title, "sound Science Project");
    }

    #[test]
    fn test_missing_hypothesis_is_templated() {
        let raw = r#"{"title": "Echoes", "idea": "Measure echo delay.", "materials": "tape, stopwatch"}"#;
        let idea = IdeaOutcome::parse(raw, "sound").into_idea();
        assert_eq!(idea.title, "Echoes");
        assert!(idea.hypothesis.starts_with("If we study sound"));
        assert_eq!(idea.materials.unwrap(), vec!["tape", "stopwatch"]);
    }
}
