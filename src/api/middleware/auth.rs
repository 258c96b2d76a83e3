use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::{api::state::AppState, error::AppError};

/// Lets the request through only with `Authorization: Bearer <admin_token>`.
///
/// With no admin token configured every request is rejected.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .settings
        .auth
        .admin_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::Unauthorized)?;

    if !tokens_match(provided, expected) {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
