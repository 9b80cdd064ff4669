use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::ErrorDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            400 | 422 => ErrorCode::Validation,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds the error from a response status and its raw body. Bodies that
    /// are not `{detail}` payloads keep the status line as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let code = ErrorCode::from_status(status);
        let message = match serde_json::from_str::<ErrorDetail>(body) {
            Ok(detail) => detail.message(),
            Err(_) if body.trim().is_empty() => format!("request failed with status {status}"),
            Err(_) => body.trim().to_string(),
        };
        Self { code, message }
    }

    pub fn is_conflict(&self) -> bool {
        self.code == ErrorCode::Conflict
    }

    /// A 409 raised because the target name is taken, as opposed to one
    /// raised because the entity is still referenced elsewhere.
    pub fn is_duplicate_name(&self) -> bool {
        let message = self.message.to_ascii_lowercase();
        self.is_conflict()
            && (message.contains("same name") || message.contains("already exists"))
    }

    pub fn is_in_use(&self) -> bool {
        let message = self.message.to_ascii_lowercase();
        self.is_conflict()
            && (message.contains("in use")
                || message.contains("has child elements")
                || message.contains("is a part of")
                || message.contains("referenced"))
    }
}
