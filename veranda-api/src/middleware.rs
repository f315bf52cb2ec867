use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

pub const TENANT_KEY_HEADER: &str = "x-veranda-key";

/// Resolves the calling tenant from its API key and stashes it as a request
/// extension. Every route behind this middleware is tenant-scoped; routes
/// without it (health, provider webhooks) never see a tenant.
pub async fn require_tenant(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(key) = req
        .headers()
        .get(TENANT_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.is_empty())
    else {
        return unauthorized("missing tenant api key");
    };

    match state.tenants.find_by_api_key(key).await {
        Ok(Some(tenant)) => {
            req.extensions_mut().insert(tenant);
            next.run(req).await
        }
        Ok(None) => unauthorized("unknown tenant api key"),
        Err(err) => AppError::from_booking(err).into_response(),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "code": "UNAUTHENTICATED",
            "retryable": false,
        })),
    )
        .into_response()
}
