//! Error types for the GAME client SDK
//!
//! Every failure surfaced by the SDK is a [`GameError`]. The first five
//! variants form the caller-facing taxonomy (validation, API, authentication,
//! state and configuration failures) and carry enough context for callers to
//! branch on status codes and raw bodies. The remaining variants are protocol
//! or misuse failures raised by the orchestration loop; they are not meant to
//! be recovered from.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GameError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: HashMap<String, String>,
    },
    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        response: Option<Value>,
    },
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
        response: Option<Value>,
    },
    #[error("State error: {0}")]
    State(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Worker not found: {0}")]
    WorkerNotFound(String),
    #[error("Function '{fn_name}' not found in action space of worker '{worker_id}'")]
    FunctionNotFound { worker_id: String, fn_name: String },
    #[error("Arguments do not match function '{fn_name}': {message}")]
    ArgumentMismatch { fn_name: String, message: String },
    #[error("Parsing error: {0}")]
    Parse(String),
}

impl GameError {
    pub fn validation(message: impl Into<String>) -> Self {
        GameError::Validation {
            message: message.into(),
            errors: HashMap::new(),
        }
    }

    /// Validation failure with per-field messages.
    pub fn validation_with_errors(
        message: impl Into<String>,
        errors: HashMap<String, String>,
    ) -> Self {
        GameError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        GameError::Api {
            message: message.into(),
            status_code: None,
            response: None,
        }
    }

    pub fn api_with_status(
        message: impl Into<String>,
        status_code: u16,
        response: Option<Value>,
    ) -> Self {
        GameError::Api {
            message: message.into(),
            status_code: Some(status_code),
            response,
        }
    }

    pub fn authentication(message: impl Into<String>, status_code: Option<u16>) -> Self {
        GameError::Authentication {
            message: message.into(),
            status_code,
            response: None,
        }
    }

    /// HTTP status attached to API and authentication failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GameError::Api { status_code, .. } | GameError::Authentication { status_code, .. } => {
                *status_code
            }
            _ => None,
        }
    }

    /// Decoded response body attached to API and authentication failures.
    pub fn response(&self) -> Option<&Value> {
        match self {
            GameError::Api { response, .. } | GameError::Authentication { response, .. } => {
                response.as_ref()
            }
            _ => None,
        }
    }

    /// Authentication failures are a kind of API failure, so this is true for both.
    pub fn is_api_error(&self) -> bool {
        matches!(self, GameError::Api { .. } | GameError::Authentication { .. })
    }

    pub fn is_authentication_error(&self) -> bool {
        matches!(self, GameError::Authentication { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, GameError::Validation { .. })
    }

    pub fn is_state_error(&self) -> bool {
        matches!(self, GameError::State(_))
    }
}
