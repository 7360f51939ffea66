//! Per-request context carrying the caller and the pending response outcome.
//!
//! Handlers that report an outcome message record it with
//! [`RequestContext::set_response`] while they work and finish with
//! [`RequestContext::respond`]. The context lives for one request only, so
//! concurrent requests can never see each other's status or message.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use placement_core::access::Actor;
use placement_core::types::DbId;
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Status and message the request will answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNote {
    pub status: StatusCode,
    pub message: Option<String>,
}

impl Default for ResponseNote {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
        }
    }
}

/// Authenticated caller plus the pending [`ResponseNote`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: AuthUser,
    pub actor: Actor,
    note: ResponseNote,
}

impl RequestContext {
    pub fn new(user: AuthUser) -> Self {
        Self {
            actor: user.actor(),
            user,
            note: ResponseNote::default(),
        }
    }

    pub fn user_id(&self) -> DbId {
        self.user.user_id
    }

    /// Record the status and message to answer with. Later calls win.
    pub fn set_response(&mut self, status: StatusCode, message: impl Into<String>) {
        self.note = ResponseNote {
            status,
            message: Some(message.into()),
        };
    }

    pub fn note(&self) -> &ResponseNote {
        &self.note
    }

    /// Render `data` with the pending status and message.
    pub fn respond<T: Serialize>(self, data: T) -> Response {
        let body = MessageResponse {
            data,
            message: self.note.message,
        };
        (self.note.status, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequestContext::new(user))
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use placement_core::roles::Role;

    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::new(AuthUser {
            user_id: 7,
            role: Role::Agent,
        })
    }

    async fn body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn defaults_to_ok_without_message() {
        let response = ctx().respond(serde_json::json!({ "id": 1 }));
        assert_eq!(response.status(), StatusCode::OK);
        let json = body(response).await;
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn pending_status_and_message_are_rendered() {
        let mut ctx = ctx();
        ctx.set_response(StatusCode::ACCEPTED, "first");
        ctx.set_response(StatusCode::CREATED, "CV created");
        assert_eq!(ctx.note().status, StatusCode::CREATED);

        let response = ctx.respond(42);
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body(response).await;
        assert_eq!(json["data"], 42);
        assert_eq!(json["message"], "CV created");
    }

    #[test]
    fn actor_mirrors_user() {
        let ctx = ctx();
        assert_eq!(ctx.actor, Actor::new(7, Role::Agent));
        assert_eq!(ctx.user_id(), 7);
    }
}
