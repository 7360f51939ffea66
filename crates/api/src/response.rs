//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Handlers that report
//! an outcome message go through [`crate::context::RequestContext::respond`],
//! which renders [`MessageResponse`] instead.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": T, "message": "..." }` envelope. `message` is omitted when unset.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body for endpoints that only report a count (`read-all`, `unread-count`).
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}
