use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Pipeline operation that produced the error (e.g., "rewrite", "synthesize", "index").
    pub operation: Option<String>,
    /// Additional context about the error (e.g., expected value, offending input).
    pub details: Option<String>,
    /// Source of the error (e.g., "voice_catalog", "cloud_tts", "content_store").
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
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

/// Unified error type for the echocast pipeline.
/// This aggregates all low-level errors into actionable, high-level categories.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested tone is not in the closed tone set. The only lookup in the
    /// catalog that is strict by contract; voices and styles resolve silently.
    #[error("Invalid tone: '{requested}' is not a supported tone")]
    InvalidTone { requested: String },

    #[error("Invalid input: {message}{}", format_context(.context))]
    InvalidInput {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// A remote service rejected or failed a request. Carries enough detail
    /// for the retry layer to log; never surfaced past a fallback boundary.
    #[error("Service error ({service}): {message}")]
    Service {
        service: String,
        status: Option<u16>,
        message: String,
    },

    /// Total synthesis failure: every engine in the chain failed.
    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Audio processing error: {message}")]
    Audio { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Content store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref operation) = ctx.operation {
        parts.push(format!("operation: {}", operation));
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
    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context.
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new input validation error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new input validation error with structured context.
    pub fn invalid_input_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidInput {
            message: msg.into(),
            context,
        }
    }

    /// Create a new remote service error without an HTTP status (timeouts, transport).
    pub fn service(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Service {
            service: service.into(),
            status: None,
            message: msg.into(),
        }
    }

    /// Create a new remote service error carrying the HTTP status.
    pub fn service_status(service: impl Into<String>, status: u16, msg: impl Into<String>) -> Self {
        Error::Service {
            service: service.into(),
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a new synthesis error.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Error::Synthesis {
            message: msg.into(),
        }
    }

    /// Create a new audio processing error.
    pub fn audio(msg: impl Into<String>) -> Self {
        Error::Audio {
            message: msg.into(),
        }
    }

    /// Extract error context if available.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidInput { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_renders_in_display() {
        let err = Error::configuration_with_context(
            "missing audio directory",
            ErrorContext::new()
                .with_operation("engine_init")
                .with_source("engine_config"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("missing audio directory"));
        assert!(rendered.contains("operation: engine_init"));
        assert!(rendered.contains("source: engine_config"));
    }

    #[test]
    fn invalid_tone_names_the_request() {
        let err = Error::InvalidTone {
            requested: "Sarcastic".to_string(),
        };
        assert!(err.to_string().contains("Sarcastic"));
    }
}
