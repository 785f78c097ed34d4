//! Response status defaulting and body helpers.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Status used when a handler does not pick one: 201 for POST, 204 for DELETE, 200 otherwise.
pub fn default_status_code(method: &Method) -> StatusCode {
    if method == Method::POST {
        StatusCode::CREATED
    } else if method == Method::DELETE {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::OK
    }
}

/// `status` when given, else the default for `method`.
pub fn status_for(method: &Method, status: Option<StatusCode>) -> StatusCode {
    status.unwrap_or_else(|| default_status_code(method))
}

/// JSON response; `status` overrides the per-verb default.
pub fn reply<T: Serialize>(method: &Method, status: Option<StatusCode>, data: T) -> Response {
    (status_for(method, status), Json(data)).into_response()
}

/// Empty response; `status` overrides the per-verb default (204 for DELETE).
pub fn empty(method: &Method, status: Option<StatusCode>) -> Response {
    status_for(method, status).into_response()
}
