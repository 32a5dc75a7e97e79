//! # Error Handling
//!
//! This module provides the error type shared by every fallible part of the meme
//! generator: configuration, image decoding, rendering, fonts, speech and the
//! event handlers.
//!
//! ## Architecture
//!
//! - **MemeError**: one variant per failure category, each carrying an [`ErrorContext`]
//! - **ErrorContext**: operation, free-form context, recovery suggestion and severity
//! - **Classification traits**: [`Recoverable`], [`HasSeverity`], [`HasRecoverySuggestion`]
//!
//! The fit calculation itself never fails and has no variant here.
//!
//! ## Usage
//!
//! ```rust
//! use memegen::error::{MemeError, Recoverable};
//!
//! let error = MemeError::render("draw_text", "glyph cache exhausted")
//!     .with_context("drawing top caption")
//!     .with_recovery_suggestion("use a smaller font size");
//!
//! assert_eq!(error.category(), "render");
//! assert!(error.is_recoverable());
//! ```

use std::{error::Error as StdError, fmt, path::PathBuf, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational errors
    Info,
    /// Degraded operation; the app keeps going
    Warning,
    /// The requested operation failed
    Error,
    /// Nothing further can be done in this process
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub operation: Option<String>,
    pub context: Option<String>,
    pub recovery_suggestion: Option<String>,
    pub severity: ErrorSeverity,
    pub recoverable: bool,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            recoverable: false,
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Base error type for the meme generator
#[derive(Debug)]
pub enum MemeError {
    /// Configuration errors (bad file, bad values)
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The selected file could not be opened or decoded
    ImageLoad {
        path: Option<PathBuf>,
        reason: String,
        context: ErrorContext,
    },
    /// Drawing onto the canvas failed
    Render {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// No usable font face
    Font {
        reason: String,
        context: ErrorContext,
    },
    /// Speech backend failures
    Speech {
        backend: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<PathBuf>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
    /// Validation errors
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// An event arrived for a control that is currently disabled
    State {
        current_state: String,
        attempted_operation: String,
        reason: String,
        context: ErrorContext,
    },
}

impl MemeError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an image load error
    pub fn image_load(path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ImageLoad {
            path,
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a rendering error
    pub fn render(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a font error
    pub fn font(reason: impl Into<String>) -> Self {
        Self::Font {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a speech error
    pub fn speech(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Speech {
            backend: backend.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error for a specific file
    pub fn io_at(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a state error
    pub fn state(
        current_state: impl Into<String>,
        attempted_operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::State {
            current_state: current_state.into(),
            attempted_operation: attempted_operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Mark as recoverable
    pub fn recoverable(mut self) -> Self {
        self.context_mut().recoverable = true;
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::ImageLoad { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Font { context, .. } => context,
            Self::Speech { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::State { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::ImageLoad { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Font { context, .. } => context,
            Self::Speech { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::State { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::ImageLoad { .. } => "image_load",
            Self::Render { .. } => "render",
            Self::Font { .. } => "font",
            Self::Speech { .. } => "speech",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
            Self::Validation { .. } => "validation",
            Self::State { .. } => "state",
        }
    }
}

impl fmt::Display for MemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemeError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            MemeError::ImageLoad { path, reason, .. } => match path {
                Some(path) => write!(f, "Failed to load image '{}': {}", path.display(), reason),
                None => write!(f, "Failed to load image: {}", reason),
            },
            MemeError::Render {
                operation, reason, ..
            } => {
                write!(f, "Rendering failed during {}: {}", operation, reason)
            }
            MemeError::Font { reason, .. } => write!(f, "Font unavailable: {}", reason),
            MemeError::Speech {
                backend, reason, ..
            } => {
                write!(f, "Speech error in {}: {}", backend, reason)
            }
            MemeError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation,
                        path.display(),
                        source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            MemeError::External {
                library, source, ..
            } => {
                write!(f, "External library error in {}: {}", library, source)
            }
            MemeError::Validation {
                field,
                constraint,
                value,
                ..
            } => {
                write!(
                    f,
                    "Validation failed for '{}': {} (value: {})",
                    field, constraint, value
                )
            }
            MemeError::State {
                current_state,
                attempted_operation,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Cannot {} while {}: {}",
                    attempted_operation, current_state, reason
                )
            }
        }
    }
}

impl StdError for MemeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type MemeResult<T> = Result<T, MemeError>;

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;

    /// Get recovery strategies for this error
    fn recovery_strategies(&self) -> Vec<RecoveryStrategy>;
}

/// Recovery strategies for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Pick a different input
    ChooseAnother { what: String },
    /// Use a fallback method
    Fallback { description: String },
    /// Ignore the event
    Skip { reason: String },
}

impl Recoverable for MemeError {
    fn is_recoverable(&self) -> bool {
        self.context().recoverable
            || matches!(
                self,
                Self::ImageLoad { .. }
                    | Self::Render { .. }
                    | Self::Speech { .. }
                    | Self::State { .. }
                    | Self::Validation { .. }
            )
    }

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy> {
        match self {
            Self::ImageLoad { .. } => vec![RecoveryStrategy::ChooseAnother {
                what: "image file".to_string(),
            }],
            Self::Font { .. } => vec![RecoveryStrategy::ChooseAnother {
                what: "font file (--font)".to_string(),
            }],
            Self::Speech { .. } => vec![RecoveryStrategy::Fallback {
                description: "Continue without reading captions aloud".to_string(),
            }],
            Self::State { .. } => vec![RecoveryStrategy::Skip {
                reason: "Control is disabled".to_string(),
            }],
            Self::Render { .. } => vec![RecoveryStrategy::Skip {
                reason: "Leave the canvas as it was".to_string(),
            }],
            _ => vec![],
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for MemeError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for MemeError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is fatal (the CLI should exit)
    pub fn is_fatal(error: &MemeError) -> bool {
        matches!(error, MemeError::Config { .. } | MemeError::Font { .. })
            || error.severity() == ErrorSeverity::Fatal
    }

    /// Errors an interactive session reports and then keeps going
    pub fn is_user_error(error: &MemeError) -> bool {
        matches!(
            error,
            MemeError::State { .. } | MemeError::Validation { .. } | MemeError::ImageLoad { .. }
        )
    }
}

impl From<std::io::Error> for MemeError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for MemeError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<image::ImageError> for MemeError {
    fn from(error: image::ImageError) -> Self {
        Self::image_load(None, error.to_string())
    }
}

impl From<meme_fit::cpu::ScaleError> for MemeError {
    fn from(error: meme_fit::cpu::ScaleError) -> Self {
        Self::render("scale_image", error.to_string())
    }
}

impl From<std::num::ParseIntError> for MemeError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::validation("integer", "invalid format", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = MemeError::config("canvas.width", "0", "must be greater than 0");
        assert_eq!(error.category(), "config");
        assert!(!error.is_recoverable());
        assert!(classify::is_fatal(&error));
    }

    #[test]
    fn test_error_with_context() {
        let error = MemeError::speech("espeak-ng", "exited with status 1")
            .with_operation("speak")
            .with_recovery_suggestion("install espeak-ng")
            .with_severity(ErrorSeverity::Warning);

        assert_eq!(error.category(), "speech");
        assert!(error.is_recoverable());
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert_eq!(error.recovery_suggestion(), Some("install espeak-ng"));
        assert_eq!(error.context().operation.as_deref(), Some("speak"));
    }

    #[test]
    fn test_state_error_message() {
        let error = MemeError::state("generated", "generate", "button is disabled");
        assert_eq!(
            error.to_string(),
            "Cannot generate while generated: button is disabled"
        );
        assert!(classify::is_user_error(&error));
        assert_eq!(
            error.recovery_strategies(),
            vec![RecoveryStrategy::Skip {
                reason: "Control is disabled".to_string()
            }]
        );
    }

    #[test]
    fn test_io_source_is_exposed() {
        let error = MemeError::io_at(
            "save",
            "/nope/out.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(error.source().is_some());
        assert!(error.to_string().contains("/nope/out.png"));
    }
}
