//! Middleware for bearer token validation

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::AuthError, state::AuthState};

/// Authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Raw bearer token, kept so it can be revoked on logout
    pub token: String,
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Reject requests without a valid, unrevoked bearer token
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AuthError::Unauthorized("Authorization token missing".to_string()))?;

    let claims = state.jwt_service.validate_token(&token).map_err(|e| {
        warn!("Failed to validate token: {}", e);
        AuthError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let revoked = state
        .jwt_service
        .is_token_revoked(&state.redis_pool, &token)
        .await
        .map_err(|e| {
            error!("Failed to check token revocation: {}", e);
            AuthError::InternalServerError
        })?;

    if revoked {
        return Err(AuthError::Unauthorized("Token has been revoked".to_string()));
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
        email: claims.email,
        token,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
