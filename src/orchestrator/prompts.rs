//! Prompt templates for the three generation tasks.

use crate::types::{Message, Prompt};

/// History turns forwarded with a chat message.
pub const CHAT_HISTORY_TURNS: usize = 5;

/// Topic used in the idea prompt when the caller gives none.
pub const DEFAULT_TOPIC: &str = "general science";

const IDEA_SYSTEM: &str = "You are a creative science educator who helps students design interesting and feasible science projects.";

const CHAT_SYSTEM: &str = "You are an enthusiastic science education mentor. Your role is to:
- Explain scientific concepts in simple, age-appropriate terms
- Encourage curiosity and scientific thinking
- Provide practical examples and demonstrations
- Help students understand the \"why\" behind science
- Make science fun and accessible

Always be encouraging, clear, and patient. Use analogies and real-world examples.";

const REPORT_SYSTEM: &str = "You are a professional scientific writer who creates detailed, well-structured research reports.";

pub fn idea_prompt(topic: &str, grade: &str) -> Prompt {
    let user = format!(
        r#"Create a science project idea for a grade {grade} student studying {topic}.

Requirements:
- Age-appropriate for grade {grade}
- Safe and feasible to do at home or school
- Includes a clear, testable hypothesis
- Explains what materials are needed
- Describes the experimental procedure
- Suggests how to analyze results

Format your response as JSON with these fields:
{{
    "title": "Project title",
    "idea": "Detailed project description (2-3 paragraphs)",
    "hypothesis": "Testable hypothesis statement",
    "materials": ["List", "of", "materials"],
    "procedure": "Step-by-step procedure",
    "analysis": "How to analyze results"
}}"#
    );
    Prompt::new(vec![Message::system(IDEA_SYSTEM), Message::user(user)])
        .with_temperature(0.8)
        .json()
}

pub fn chat_prompt(message: &str, context: Option<&str>, history: &[Message]) -> Prompt {
    let user = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(ctx) => format!("Project Context: {}\n\nQuestion: {}", ctx, message),
        None => message.to_string(),
    };

    let skip = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    let mut messages = Vec::with_capacity(CHAT_HISTORY_TURNS + 2);
    messages.push(Message::system(CHAT_SYSTEM));
    messages.extend(history.iter().skip(skip).cloned());
    messages.push(Message::user(user));

    Prompt::new(messages)
        .with_temperature(0.7)
        .with_max_tokens(500)
}

/// Chat question asking for a grade-appropriate explanation of one concept.
pub fn explain_request(concept: &str, grade: &str, project_context: Option<&str>) -> String {
    let mut text = format!(
        "Explain the concept of '{concept}' in simple terms suitable for grade {grade} students."
    );
    if let Some(ctx) = project_context.map(str::trim).filter(|c| !c.is_empty()) {
        text.push_str(&format!(" Relate it to this project context: {ctx}"));
    }
    text
}

pub fn improvement_request(project_idea: &str, hypothesis: &str) -> String {
    format!(
        r#"Review this science project and suggest improvements:

Project Idea: {project_idea}
Hypothesis: {hypothesis}

Provide specific suggestions for:
1. Making the hypothesis more testable
2. Improving the experimental design
3. Adding variables to control
4. Enhancing data collection methods
5. Strengthening the scientific approach

Keep suggestions practical and grade-appropriate."#
    )
}

pub fn report_prompt(idea: &str, hypothesis: &str, graph_description: &str) -> Prompt {
    let user = format!(
        r#"Create a comprehensive science project report in markdown format.

Project Idea: {idea}

Hypothesis: {hypothesis}

Graph Data Description: {graph_description}

Include the following sections:
1. Executive Summary
2. Introduction
3. Hypothesis
4. Methodology
5. Data Analysis (reference the graph)
6. Expected Results
7. Conclusion
8. Future Work

Make it professional and detailed, but accessible for students."#
    );
    Prompt::new(vec![Message::system(REPORT_SYSTEM), Message::user(user)]).with_temperature(0.7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn test_idea_prompt_requests_json() {
        let prompt = idea_prompt("magnetism", "6-8");
        assert!(prompt.json_output);
        assert_eq!(prompt.temperature, Some(0.8));
        let user = prompt.last_user_text().unwrap();
        assert!(user.contains("grade 6-8 student studying magnetism"));
        assert!(user.contains("\"hypothesis\""));
    }

    #[test]
    fn test_chat_prompt_keeps_last_five_turns() {
        let history: Vec<Message> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("q{}", i))
                } else {
                    Message::assistant(format!("a{}", i))
                }
            })
            .collect();
        let prompt = chat_prompt("What is friction?", Some("ramps"), &history);

        // system + 5 history + current
        assert_eq!(prompt.messages.len(), 7);
        assert_eq!(prompt.messages[0].role, MessageRole::System);
        assert_eq!(prompt.messages[1].content, "a3");
        assert_eq!(
            prompt.last_user_text(),
            Some("Project Context: ramps\n\nQuestion: What is friction?")
        );
        assert_eq!(prompt.max_tokens, Some(500));
    }

    #[test]
    fn test_chat_prompt_without_context() {
        let prompt = chat_prompt("Why do leaves change colour?", Some("  "), &[]);
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.last_user_text(), Some("Why do leaves change colour?"));
    }

    #[test]
    fn test_report_prompt_lists_sections() {
        let prompt = report_prompt("idea", "hyp", "Bar chart showing 3 categories");
        let user = prompt.last_user_text().unwrap();
        assert!(user.contains("Graph Data Description: Bar chart showing 3 categories"));
        assert!(user.contains("8. Future Work"));
        assert!(!prompt.json_output);
    }

    #[test]
    fn test_explain_request_adds_context() {
        let plain = explain_request("gravity", "6-8", None);
        assert_eq!(
            plain,
            "Explain the concept of 'gravity' in simple terms suitable for grade 6-8 students."
        );
        let related = explain_request("gravity", "6-8", Some("pendulum timing"));
        assert!(related.ends_with("Relate it to this project context: pendulum timing"));
        assert_eq!(explain_request("gravity", "6-8", Some("  ")), plain);
    }
}
