use std::fmt;

use serde::Serialize;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str =
    "Please refresh and try again. If the issue persists, please contact support.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("api error {status}: {}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    InvalidInput(String),
}

impl ClientError {
    pub fn api(status: u16, body: &str) -> Self {
        ClientError::Api {
            status,
            error: ApiError::from_response(status, body),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.api_error().map(|e| e.code)
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::NotFound)
    }

    pub fn is_conflict(&self) -> bool {
        self.code() == Some(ErrorCode::Conflict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    CatalogueCategory,
    CatalogueItem,
    Item,
    System,
    Manufacturer,
    Unit,
    UsageStatus,
    SparesDefinition,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::CatalogueCategory => "catalogue category",
            EntityKind::CatalogueItem => "catalogue item",
            EntityKind::Item => "item",
            EntityKind::System => "system",
            EntityKind::Manufacturer => "manufacturer",
            EntityKind::Unit => "unit",
            EntityKind::UsageStatus => "usage status",
            EntityKind::SparesDefinition => "spares definition",
        };
        f.write_str(label)
    }
}

/// Where a failed request should be reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSurface {
    Field {
        field: &'static str,
        message: String,
    },
    Dialog(String),
    Global(String),
}

impl ErrorSurface {
    pub fn message(&self) -> &str {
        match self {
            ErrorSurface::Field { message, .. } => message,
            ErrorSurface::Dialog(message) | ErrorSurface::Global(message) => message,
        }
    }
}

fn name_field(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Unit | EntityKind::UsageStatus => "value",
        _ => "name",
    }
}

/// Maps a failed request onto a form field, the open dialog, or the global
/// error banner.
pub fn surface_for(kind: EntityKind, err: &ClientError) -> ErrorSurface {
    let Some(api) = err.api_error() else {
        return ErrorSurface::Global(GENERIC_ERROR_MESSAGE.to_string());
    };

    match api.code {
        ErrorCode::Conflict if api.is_duplicate_name() => ErrorSurface::Field {
            field: name_field(kind),
            message: format!(
                "A {kind} with the same {} already exists.",
                name_field(kind)
            ),
        },
        ErrorCode::Conflict if api.is_in_use() => ErrorSurface::Dialog(api.message.clone()),
        ErrorCode::Conflict => ErrorSurface::Global(GENERIC_ERROR_MESSAGE.to_string()),
        ErrorCode::NotFound => ErrorSurface::Dialog(format!(
            "The {kind} could not be found. It may have been deleted."
        )),
        ErrorCode::Validation => ErrorSurface::Dialog(api.message.clone()),
        ErrorCode::Unauthorized | ErrorCode::Forbidden => ErrorSurface::Global(api.message.clone()),
        ErrorCode::Internal => ErrorSurface::Global(GENERIC_ERROR_MESSAGE.to_string()),
    }
}
