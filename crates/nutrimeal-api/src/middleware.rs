use std::convert::Infallible;

use axum::{
    Extension,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use nutrimeal_types::api::Claims;
use nutrimeal_types::models::Role;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthenticated)?;

    let claims = decode_token(&state.jwt_secret, token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthenticated
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn require_role(claims: &Claims, role: Role) -> Result<(), ApiError> {
    if claims.role == role {
        Ok(())
    } else {
        warn!("'{}' denied: needs {} role", claims.username, role);
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}

/// Runs inside `require_auth`, so the claims are already in the extensions.
pub async fn require_admin(
    Extension(claims): Extension<Claims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(&claims, Role::Admin)?;
    Ok(next.run(req).await)
}

/// Claims for routes that work anonymously but personalize for a signed-in
/// caller. A missing or invalid token yields `None`.
pub struct MaybeClaims(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeClaims {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(&parts.headers).and_then(|token| decode_token(&state.jwt_secret, token).ok());
        Ok(MaybeClaims(claims))
    }
}
