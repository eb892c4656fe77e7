use thiserror::Error;

/// Structured error context for configuration and runtime failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "PORT", "chart.values")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "settings", "chart_renderer")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the service.
///
/// Each variant maps onto exactly one HTTP status in the server layer, so
/// handlers can use `?` freely and let [`crate::server::ApiError`] decide the
/// response shape.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        value: Option<String>,
    },

    #[error("No AI service configured (neither Gemini nor OpenAI)")]
    NoAiService,

    #[error("{message}")]
    AiService { service: String, message: String },

    #[error("{message}")]
    Database {
        message: String,
        operation: String,
        table: Option<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Input validation failure for a named field.
    pub fn validation(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
            field: Some(field.into()),
            value: None,
        }
    }

    /// Input validation failure that also records the offending value.
    pub fn validation_with_value(
        msg: impl Into<String>,
        field: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Error::Validation {
            message: msg.into(),
            field: Some(field.into()),
            value: Some(value.to_string()),
        }
    }

    pub fn ai_service(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::AiService {
            service: service.into(),
            message: msg.into(),
        }
    }

    pub fn database(
        msg: impl Into<String>,
        operation: impl Into<String>,
        table: Option<&str>,
    ) -> Self {
        Error::Database {
            message: msg.into(),
            operation: operation.into(),
            table: table.map(str::to_string),
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True for failures caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// True when no AI provider could produce a result.
    pub fn is_ai_unavailable(&self) -> bool {
        matches!(self, Error::NoAiService | Error::AiService { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_formatting() {
        let err = Error::configuration_with_context(
            "invalid port",
            ErrorContext::new()
                .with_field_path("PORT")
                .with_details("expected u16, got 'abc'"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid port (field: PORT, details: expected u16, got 'abc')"
        );
        assert_eq!(err.context().unwrap().field_path.as_deref(), Some("PORT"));
    }

    #[test]
    fn test_empty_context_formats_without_suffix() {
        let err = Error::runtime_with_context("boom", ErrorContext::default());
        assert_eq!(err.to_string(), "Runtime error: boom");
    }

    #[test]
    fn test_classification_helpers() {
        assert!(Error::validation("Topic cannot be empty", "topic").is_validation());
        assert!(Error::NoAiService.is_ai_unavailable());
        assert!(Error::ai_service("openai", "timeout").is_ai_unavailable());
        assert!(!Error::NotFound("Project not found".into()).is_ai_unavailable());
    }
}
