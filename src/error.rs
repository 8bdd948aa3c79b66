use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Field name to the list of reasons it was rejected.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("conflict")]
    Conflict(FieldErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    #[error("too many attempts, try again later")]
    RateLimited,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation(single(field, reason))
    }

    pub fn conflict(field: &str, reason: impl Into<String>) -> Self {
        Self::Conflict(single(field, reason))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn single(field: &str, reason: impl Into<String>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![reason.into()]);
    errors
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<jiff::Error> for AppError {
    fn from(err: jiff::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errors) in errs.field_errors() {
            let reasons = errors
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("invalid value ({})", e.code),
                })
                .collect();
            fields.insert(field.to_string(), reasons);
        }
        Self::Validation(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(fields) | AppError::Conflict(fields) => {
                json!({ "errors": fields })
            },
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                json!({ "detail": "internal server error" })
            },
            other => json!({ "detail": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
