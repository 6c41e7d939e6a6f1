use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` header is not exactly the shared secret.
///
/// Runs before any extractor on the guarded route, so the body is never read
/// for unauthenticated callers.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|key| key == state.config.secret);

    if authorized {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        "🔒 Rejected request to {} with invalid or missing API key",
        req.uri().path()
    );
    Err(AppError::Unauthorized("Invalid or missing API key".to_string()))
}
