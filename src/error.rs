use thiserror::Error;

/// Errors produced by a [`FormBackend`](crate::backend::FormBackend).
///
/// Cloneable so a single deduplicated result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Errors raised while converting an external form definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Form definition must be a JSON object")]
    NotAnObject,

    #[error("Form definition has no `elements`, `pages` or `questions` list")]
    UnknownLayout,

    #[error("Element #{index} is invalid: {message}")]
    InvalidElement { index: usize, message: String },

    #[error("Element #{index} has no name")]
    MissingName { index: usize },

    #[error("Duplicate field name '{0}'")]
    DuplicateName(String),
}

/// Errors surfaced by a [`FormSession`](crate::form::session::FormSession).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("This node does not have a form")]
    NoForm { node_id: String },

    #[error("Failed to load form: {0}")]
    LoadFailed(BackendError),

    #[error("Form is already being submitted")]
    AlreadySubmitting,

    #[error("Execution failed: {0}")]
    Execute(BackendError),
}
