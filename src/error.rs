//! Crate-wide error types.
//!
//! Transport and HTTP failures share [`ApiError`]; input problems caught
//! before a request is built are [`ValidationError`]. Operations that can
//! fail either way return [`Error`].

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(e) => e.status(),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),

    /// The server answered outside the 2xx range.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// A 2xx body that does not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Invalid endpoint {0}")]
    Url(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Title cannot exceed {max} characters")]
    TitleTooLong { max: usize },

    #[error("Details cannot exceed {max} characters")]
    DetailsTooLong { max: usize },

    #[error("Due date cannot be earlier than today")]
    DueDateInPast,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("{field} must be at least {min} characters")]
    NameTooShort { field: &'static str, min: usize },

    #[error("Age must be between {min} and {max}")]
    AgeOutOfRange { min: u32, max: u32 },

    #[error("Password needs at least 8 characters, one uppercase letter, one number and one special character")]
    WeakPassword,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid or missing reset token")]
    MissingResetToken,

    #[error("Unknown task status: {0}")]
    UnknownStatus(String),
}
