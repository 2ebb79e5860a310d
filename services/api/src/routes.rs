//! API service routes

use axum::{
    Json, Router,
    async_trait,
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

use auth::auth_middleware;

use crate::{
    AppState,
    config::ServerConfig,
    error::{ApiError, internal},
    models::required_id,
};

pub mod asset_menus;
pub mod assets;
pub mod games;
pub mod grids;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .nest("/games", games::router())
        .nest("/assetMenus", asset_menus::router())
        .nest("/assets", assets::router(state.upload_store.max_bytes()))
        .nest("/grids", grids::router())
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(&state.config);
    let auth_routes = auth::routes::create_router(state.auth.clone());

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", protected_routes)
        .with_state(state);

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(app)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = HeaderValue::from_str(&config.cors_origin).unwrap_or_else(|e| {
        warn!("Invalid CORS origin {}: {}", config.cors_origin, e);
        HeaderValue::from_static("http://localhost:3000")
    });

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let cache = state.auth.redis_pool.health_check().await.unwrap_or_else(|e| {
        warn!("Redis health check failed: {:#}", e);
        false
    });

    Json(json!({
        "status": "ok",
        "service": "api-service",
        "database": database,
        "cache": cache
    }))
}

/// JSON body whose rejections use the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// Parse an id taken from the URL path
pub(crate) fn path_id(raw: &str) -> Result<Uuid, ApiError> {
    required_id(Some(raw), "id")
}

/// 404 unless `user_id` owns the game
pub(crate) async fn ensure_game_owned(
    state: &AppState,
    user_id: Uuid,
    game_id: Uuid,
) -> Result<(), ApiError> {
    let owned = state
        .game_repository
        .is_owned_by(user_id, game_id)
        .await
        .map_err(internal("Failed to check game ownership"))?;

    if owned {
        Ok(())
    } else {
        Err(ApiError::not_found("Game not found"))
    }
}
