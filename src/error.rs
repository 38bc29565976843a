//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used at the HTTP
//! boundary. Lower layers have their own error enums (`StoreError`,
//! `AuthError`) which convert into `AppError` through `From`, so handlers can
//! simply use `?`.
//!
//! `AppError` implements `actix_web::error::ResponseError` to turn every error
//! into an HTTP response with a JSON `{"error": ...}` body.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Body sent for every authentication failure, whatever the cause.
pub const UNAUTHENTICATED_MESSAGE: &str = "Please authenticate.";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed (HTTP 401). Carries no detail on purpose: a
    /// missing header, a bad signature, an unknown user and a revoked token
    /// all produce the same response.
    Unauthorized,
    /// Malformed or rejected request (HTTP 400).
    BadRequest(String),
    /// Requested resource was not found (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Store failure (HTTP 500). The detail is logged, not returned.
    DatabaseError(String),
    /// Input validation failed (HTTP 422).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized => UNAUTHENTICATED_MESSAGE.to_string(),
            AppError::DatabaseError(msg) => {
                error!("database error: {}", msg);
                "Database error".to_string()
            }
            AppError::InternalServerError(msg) => {
                error!("internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::ValidationError(msg) => {
                msg.clone()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// `NotFound` from the store becomes a 404, conflicts a 400, anything else a 500.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Conflict(msg) => AppError::BadRequest(msg),
            StoreError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::Unauthenticated => AppError::Unauthorized,
            AuthError::Store(store_error) => store_error.into(),
            AuthError::Signing(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
