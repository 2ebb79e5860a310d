//! Authentication routes, mounted under `/api/auth`

use axum::{
    Extension, Json, Router, async_trait,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    error::AuthError,
    middleware::{AuthUser, auth_middleware},
    models::{NewUser, User},
    repositories::user::is_unique_violation,
    state::AuthState,
    validation::{normalize_email, validate_email, validate_password, validate_username},
};

/// Request for user signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response carrying a freshly issued token
#[derive(Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
    pub user: User,
}

/// Create the router for the authentication endpoints
pub fn create_router(state: AuthState) -> Router {
    let protected_routes = Router::new()
        .route("/logout", post(logout))
        .route("/user", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// JSON body whose rejections (bad syntax, wrong content type) are reported
/// as a 400 in the usual error envelope
pub struct AuthJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AuthJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AuthError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

fn required(field: Option<String>, message: &str) -> Result<String, AuthError> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AuthError::BadRequest(message.to_string()))
}

impl SignupRequest {
    /// Check presence and format of every field
    pub fn validate(self) -> Result<NewUser, AuthError> {
        let message = "Username, email and password are required";
        let username = required(self.username, message)?;
        let email = normalize_email(&required(self.email, message)?);
        // Passwords are not trimmed.
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::BadRequest(message.to_string()))?;

        validate_username(&username).map_err(AuthError::BadRequest)?;
        validate_email(&email).map_err(AuthError::BadRequest)?;
        validate_password(&password).map_err(AuthError::BadRequest)?;

        Ok(NewUser {
            username,
            email,
            password,
        })
    }
}

impl LoginRequest {
    /// Return the normalized email and the password
    pub fn validate(self) -> Result<(String, String), AuthError> {
        let message = "Email and password are required";
        let email = normalize_email(&required(self.email, message)?);
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::BadRequest(message.to_string()))?;

        Ok((email, password))
    }
}

/// User signup endpoint
pub async fn signup(
    State(state): State<AuthState>,
    AuthJson(payload): AuthJson<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let new_user = payload.validate()?;
    info!("Signup attempt for user: {}", new_user.username);

    let internal = |e: anyhow::Error| {
        error!("Failed to look up user: {}", e);
        AuthError::InternalServerError
    };

    if state
        .user_repository
        .find_by_username(&new_user.username)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AuthError::BadRequest("Username already exists".to_string()));
    }

    if state
        .user_repository
        .find_by_email(&new_user.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(AuthError::BadRequest(
            "Email is already registered".to_string(),
        ));
    }

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::BadRequest("Username or email already exists".to_string())
            } else {
                error!("Failed to create user: {}", e);
                AuthError::InternalServerError
            }
        })?;

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::InternalServerError
    })?;

    let response = TokenResponse {
        success: true,
        message: "User created successfully".to_string(),
        token,
        expires_in: state.jwt_service.token_expiry(),
        user,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    AuthJson(payload): AuthJson<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let (email, password) = payload.validate()?;
    info!("Login attempt for user: {}", email);

    let limiter_key = format!("login:{}", email);
    if !state.rate_limiter.is_allowed(&limiter_key).await {
        warn!("Login rate limit exceeded for {}", email);
        return Err(AuthError::TooManyRequests);
    }

    let invalid = || AuthError::BadRequest("Invalid credentials".to_string());

    let user = state
        .user_repository
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or_else(invalid)?;

    let valid = state
        .user_repository
        .verify_password(&user, &password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !valid {
        return Err(invalid());
    }

    state.rate_limiter.reset(&limiter_key).await;

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::InternalServerError
    })?;

    let response = TokenResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        expires_in: state.jwt_service.token_expiry(),
        user,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint, revokes the presented token
pub async fn logout(
    State(state): State<AuthState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request for user: {}", user.id);

    let claims = state
        .jwt_service
        .validate_token(&user.token)
        .map_err(|_| AuthError::Unauthorized("Invalid or expired token".to_string()))?;

    state
        .jwt_service
        .revoke_token(&state.redis_pool, &claims, &user.token)
        .await
        .map_err(|e| {
            error!("Failed to revoke token: {}", e);
            AuthError::InternalServerError
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}

/// Return the authenticated user's profile
pub async fn current_user(
    State(state): State<AuthState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .user_repository
        .find_by_id(user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: Option<&str>, email: Option<&str>, password: Option<&str>) -> SignupRequest {
        SignupRequest {
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_signup_requires_all_fields() {
        for request in [
            signup(None, Some("a@b.io"), Some("Filmlover17")),
            signup(Some("maker"), None, Some("Filmlover17")),
            signup(Some("maker"), Some("a@b.io"), None),
            signup(Some("   "), Some("a@b.io"), Some("Filmlover17")),
        ] {
            let err = request.validate().unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_signup_normalizes_fields() {
        let user = signup(Some(" maker "), Some(" Maker@Studio.IO "), Some(" spaced pass "))
            .validate()
            .unwrap();

        assert_eq!(user.username, "maker");
        assert_eq!(user.email, "maker@studio.io");
        assert_eq!(user.password, " spaced pass ");
    }

    #[test]
    fn test_signup_rejects_bad_formats() {
        let err = signup(Some("maker"), Some("not-an-email"), Some("Filmlover17"))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");

        let err = signup(Some("maker"), Some("a@b.io"), Some("short"))
            .validate()
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_login_requires_email_and_password() {
        let err = LoginRequest {
            email: Some("a@b.io".into()),
            password: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Email and password are required");

        let (email, password) = LoginRequest {
            email: Some("A@B.io".into()),
            password: Some("secret-pass".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(email, "a@b.io");
        assert_eq!(password, "secret-pass");
    }
}
