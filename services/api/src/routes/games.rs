//! Game routes, mounted under `/api/games`

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::info;

use auth::AuthUser;

use crate::{
    AppState,
    error::{ApiError, ApiResult, internal},
    models::game::GameRequest,
    routes::{ApiJson, path_id},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_games).post(create_game))
        .route("/:id", get(get_game).put(update_game).delete(delete_game))
}

fn game_not_found() -> ApiError {
    ApiError::not_found("Game not found")
}

/// List the caller's games
pub async fn list_games(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let games = state
        .game_repository
        .list(user.id)
        .await
        .map_err(internal("Failed to list games"))?;

    Ok(Json(json!({ "success": true, "games": games })))
}

pub async fn create_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<GameRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_game = payload.validate_new()?;

    let game = state
        .game_repository
        .create(user.id, &new_game)
        .await
        .map_err(internal("Failed to create game"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Game created successfully",
            "game": game
        })),
    ))
}

/// A game with its asset menus and grids
pub async fn get_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let game = state
        .game_repository
        .find(user.id, id)
        .await
        .map_err(internal("Failed to load game"))?
        .ok_or_else(game_not_found)?;

    let asset_menus = state
        .asset_menu_repository
        .list_for_game(game.id)
        .await
        .map_err(internal("Failed to load asset menus"))?;

    let grids = state
        .grid_repository
        .list_for_game(game.id)
        .await
        .map_err(internal("Failed to load grids"))?;

    Ok(Json(json!({
        "success": true,
        "game": game,
        "assetMenus": asset_menus,
        "grids": grids
    })))
}

pub async fn update_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<GameRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let changes = payload.validate_changes()?;

    let game = state
        .game_repository
        .update(user.id, id, &changes)
        .await
        .map_err(internal("Failed to update game"))?
        .ok_or_else(game_not_found)?;

    Ok(Json(json!({
        "success": true,
        "message": "Game updated successfully",
        "game": game
    })))
}

/// Delete a game and everything in it, including stored files
pub async fn delete_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let file_paths = state
        .game_repository
        .delete(user.id, id)
        .await
        .map_err(internal("Failed to delete game"))?
        .ok_or_else(game_not_found)?;

    state.upload_store.remove_all(&file_paths).await;
    info!("User {} deleted game {}", user.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Game deleted successfully"
    })))
}
