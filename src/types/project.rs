//! Project records as stored in the `projects` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED_PROJECT: &str = "Untitled Project";

/// A generated project idea, independent of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectIdea {
    pub title: String,
    pub idea: String,
    pub hypothesis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub idea: String,
    pub hypothesis: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub materials: Option<Vec<String>>,
    #[serde(default)]
    pub procedure: Option<String>,
    /// Base64-encoded chart image.
    #[serde(default)]
    pub graph_data: Option<String>,
    /// Markdown report.
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// New record with a fresh v4 id and both timestamps set to `now`.
    pub fn from_idea(
        idea: &ProjectIdea,
        subject: Option<String>,
        grade: Option<String>,
        topic: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: idea.title.clone(),
            idea: idea.idea.clone(),
            hypothesis: idea.hypothesis.clone(),
            subject,
            grade,
            topic,
            materials: idea.materials.clone(),
            procedure: idea.procedure.clone(),
            graph_data: None,
            report: None,
            user_id: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update; `None` fields are left untouched and omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectUpdate {
    pub fn report(report: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            report: Some(report.into()),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, project: &mut Project) {
        if let Some(ref v) = self.title {
            project.title = v.clone();
        }
        if let Some(ref v) = self.idea {
            project.idea = v.clone();
        }
        if let Some(ref v) = self.hypothesis {
            project.hypothesis = v.clone();
        }
        if let Some(ref v) = self.graph_data {
            project.graph_data = Some(v.clone());
        }
        if let Some(ref v) = self.report {
            project.report = Some(v.clone());
        }
        if let Some(v) = self.updated_at {
            project.updated_at = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea() -> ProjectIdea {
        ProjectIdea {
            title: "Light and Growth".into(),
            idea: "Grow beans under coloured filters.".into(),
            hypothesis: "If plants get blue light, then they will grow taller.".into(),
            materials: Some(vec!["beans".into(), "filters".into()]),
            procedure: None,
            analysis: None,
        }
    }

    #[test]
    fn test_from_idea_generates_unique_ids() {
        let now = Utc::now();
        let a = Project::from_idea(&idea(), None, Some("6-8".into()), None, now);
        let b = Project::from_idea(&idea(), None, Some("6-8".into()), None, now);
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, Some(now));
        assert_eq!(a.materials.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_deserialize_row_with_missing_optionals() {
        let row = serde_json::json!({
            "id": "p1",
            "title": "T",
            "idea": "I",
            "hypothesis": "H",
            "created_at": "2024-05-01T12:00:00.123456+00:00"
        });
        let project: Project = serde_json::from_value(row).unwrap();
        assert_eq!(project.id, "p1");
        assert!(project.report.is_none());
        assert!(project.created_at.is_some());
    }

    #[test]
    fn test_update_payload_omits_unset_fields() {
        let update = ProjectUpdate::report("# Report", Utc::now());
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["report"], "# Report");
        assert!(json.get("title").is_none());

        let mut project = Project::from_idea(&idea(), None, None, None, Utc::now());
        update.apply_to(&mut project);
        assert_eq!(project.report.as_deref(), Some("# Report"));
        assert_eq!(project.title, "Light and Growth");
    }
}
