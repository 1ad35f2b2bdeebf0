//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::OrderError;
use invoice::InvoiceError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed purchaser identity.
    Unauthorized(String),
    /// Checkout, address or order service error.
    Checkout(CheckoutError),
    /// Invoice lookup error.
    Invoice(InvoiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Invoice(err) => invoice_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_) | CheckoutError::EmptyCart => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::UserNotFound(_)
        | CheckoutError::AddressNotFound(_)
        | CheckoutError::OrderNotFound(_)
        | CheckoutError::NoDefaultAddress => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::PermissionDenied(_) => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::Order(OrderError::InvalidStateTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Order(OrderError::InvalidOrderNumber(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::OrderCreationFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        CheckoutError::Store(store_err) => {
            tracing::error!(error = %store_err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

fn invoice_error_to_response(err: InvoiceError) -> (StatusCode, String) {
    match &err {
        InvoiceError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ => {
            tracing::error!(error = %err, "invoice lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        ApiError::Invoice(err)
    }
}
