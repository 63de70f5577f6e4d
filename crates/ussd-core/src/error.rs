//! Error types for the USSD menu engine.
//!
//! Construction-time failures (`ConfigInvalid`, `MenuLoad`) abort startup.
//! Everything else is a per-request error that ends the session.

use thiserror::Error;

/// Result type alias using the engine error.
pub type Result<T> = std::result::Result<T, Error>;

/// Text shown when pattern traversal yields no node.
pub const UNKNOWN_OPTION_TEXT: &str = "Unknown Option";

/// Text shown when an execute node's method is disabled.
pub const HANDLER_DISABLED_TEXT: &str = "Service is not available at the moment.";

/// Text shown when an execute node's method is not registered.
pub const HANDLER_NOT_FOUND_TEXT: &str = "Service is not defined.";

/// Main error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad configuration value
    #[error("Configuration error: {0}")]
    ConfigInvalid(String),

    /// Missing or invalid menu document
    #[error("Menu load error: {0}")]
    MenuLoad(String),

    /// Key-value store operation failed
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unknown wire-format name
    #[error("Unsupported adaptor: {0}")]
    UnsupportedAdaptor(String),

    /// Inbound payload could not be mapped to a canonical request
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Execute node references a method that is not registered
    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    /// Execute node's method is in the disabled set
    #[error("Handler disabled: {0}")]
    HandlerDisabled(String),

    /// External handler returned an error
    #[error("Handler '{name}' failed: {message}")]
    Handler { name: String, message: String },

    /// Pattern traversal yielded no node
    #[error("Unknown option")]
    UnknownOption,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Terminal text shown to the subscriber for conditions that are not
    /// internal failures.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Error::UnknownOption => Some(UNKNOWN_OPTION_TEXT),
            Error::HandlerDisabled(_) => Some(HANDLER_DISABLED_TEXT),
            Error::HandlerNotFound(_) => Some(HANDLER_NOT_FOUND_TEXT),
            _ => None,
        }
    }

    /// Whether the error ends the session with an explanatory message
    /// instead of the generic error text.
    pub fn is_user_facing(&self) -> bool {
        self.user_message().is_some()
    }

    /// Whether the error can only happen while building the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigInvalid(_) | Error::MenuLoad(_))
    }

    /// Create a handler failure error.
    pub fn handler(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Handler {
            name: name.into(),
            message: message.into(),
        }
    }
}
