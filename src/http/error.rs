//! Errors that carry an HTTP status code.
//!
//! Parse failures, handler failures and response misuse are all expressed as
//! [`HttpError`] variants. The connection worker turns any of them into the
//! status line of the response it writes.

use crate::http::request::Method;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("can not parse HTTP request: {message}")]
    BadRequest {
        message: String,
        starting_line: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("only GET, POST, HEAD are supported, current method is {method}")]
    MethodNotAllowed { method: String, starting_line: String },

    #[error("server supports only HTTP/1.1, request uses {version}")]
    VersionNotSupported { version: String, starting_line: String },

    #[error("handle request {uri} failed: {message}")]
    HandlingFailed {
        uri: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A handler-chosen status, passed through the dispatcher verbatim.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl HttpError {
    pub fn bad_request(message: impl Into<String>, starting_line: Option<&str>) -> Self {
        HttpError::BadRequest {
            message: message.into(),
            starting_line: starting_line.map(str::to_string),
            source: None,
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        HttpError::Status {
            status,
            message: message.into(),
        }
    }

    /// Wraps an untyped handler failure for `uri`.
    pub fn handling_failed(uri: &str, cause: anyhow::Error) -> Self {
        HttpError::HandlingFailed {
            uri: uri.to_string(),
            message: cause.to_string(),
            source: Some(cause.into()),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::BadRequest { .. } => 400,
            HttpError::MethodNotAllowed { .. } => 405,
            HttpError::VersionNotSupported { .. } => 505,
            HttpError::Status { status, .. } => *status,
            HttpError::HandlingFailed { .. }
            | HttpError::InvalidArgument(_)
            | HttpError::Internal { .. } => 500,
        }
    }

    /// Start-line of the request that failed to parse, if one was read.
    pub fn starting_line(&self) -> Option<&str> {
        match self {
            HttpError::BadRequest { starting_line, .. } => starting_line.as_deref(),
            HttpError::MethodNotAllowed { starting_line, .. }
            | HttpError::VersionNotSupported { starting_line, .. } => Some(starting_line),
            _ => None,
        }
    }

    /// Extra headers the response must carry for this error.
    pub fn response_headers(&self) -> Vec<(&'static str, String)> {
        match self {
            HttpError::MethodNotAllowed { .. } => vec![("Allow", Method::allow_header())],
            _ => Vec::new(),
        }
    }
}
