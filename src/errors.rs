//! Brand API error types.
//!
//! Every validation failure maps to a 400 response whose JSON body is
//! `{"message": "..."}`, matching what the presentation client expects.
//! The enum implements [`axum::response::IntoResponse`] so handlers can
//! simply return `Err(ApiError::DuplicateBrand { .. })`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Brand API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The create request did not declare the raw-binary sentinel type.
    #[error("content-type must be 'application/octet-stream'")]
    BadContentType,

    /// The brand name was absent or empty.
    #[error("'name' is required")]
    MissingName,

    /// Byte sniffing failed, the payload is not an image, or the
    /// sniff/upload path hit an unexpected failure.  Deliberately
    /// conflated: callers only ever see the generic message.
    #[error("binary data is not a valid image")]
    InvalidBinary,

    /// A brand with the same case-insensitive name already exists.
    #[error("brand {name} already has a logo")]
    DuplicateBrand { name: String },

    /// The requested logo blob does not exist.
    #[error("the requested logo does not exist")]
    LogoNotFound { blob_ref: String },

    /// The gateway shared secret was missing or wrong.
    #[error("a valid x-functions-key header is required")]
    InvalidGatewayKey,

    /// Catch-all for unexpected internal errors.
    #[error("internal error, please try again")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadContentType => StatusCode::BAD_REQUEST,
            ApiError::MissingName => StatusCode::BAD_REQUEST,
            ApiError::InvalidBinary => StatusCode::BAD_REQUEST,
            ApiError::DuplicateBrand { .. } => StatusCode::BAD_REQUEST,
            ApiError::LogoNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidGatewayKey => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();
        let date = httpdate::fmt_http_date(std::time::SystemTime::now());

        if let ApiError::Internal(ref err) = self {
            tracing::error!("internal error serving request {request_id}: {err:#}");
        }

        let body = serde_json::json!({ "message": self.to_string() }).to_string();

        (
            status,
            [
                ("content-type", "application/json".to_string()),
                ("x-request-id", request_id),
                ("date", date),
                ("server", "BrandVault".to_string()),
            ],
            body,
        )
            .into_response()
    }
}
