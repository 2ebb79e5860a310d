//! Grid routes, mounted under `/api/grids`

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use auth::AuthUser;

use crate::{
    AppState,
    error::{ApiError, ApiResult, internal},
    models::{
        GameQuery, PositionInput,
        grid::{CreateGridRequest, Grid, GridChanges, LinkAssetRequest, UpdateGridRequest},
        required_id,
    },
    routes::{ApiJson, ensure_game_owned, path_id},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grids).post(create_grid))
        .route("/:id", put(update_grid).delete(delete_grid))
        .route("/:id/position", put(update_grid_position))
        .route("/:id/assets", post(link_asset))
}

fn grid_not_found() -> ApiError {
    ApiError::not_found("Grid not found")
}

async fn load_grid(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<Grid> {
    state
        .grid_repository
        .find(user_id, id)
        .await
        .map_err(internal("Failed to load grid"))?
        .ok_or_else(grid_not_found)
}

async fn apply_changes(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    changes: &GridChanges,
) -> ApiResult<Grid> {
    state
        .grid_repository
        .update(user_id, id, changes)
        .await
        .map_err(internal("Failed to update grid"))?
        .ok_or_else(grid_not_found)
}

pub async fn create_grid(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateGridRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_grid = payload.validate()?;
    ensure_game_owned(&state, user.id, new_grid.game_id).await?;

    let grid = state
        .grid_repository
        .create(&new_grid)
        .await
        .map_err(internal("Failed to add grid"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Grid created successfully",
            "grid": grid
        })),
    ))
}

/// Grids of a game; an empty list is still a successful fetch
pub async fn list_grids(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GameQuery>,
) -> ApiResult<impl IntoResponse> {
    let game_id = required_id(query.game_id.as_deref(), "gameId")?;
    ensure_game_owned(&state, user.id, game_id).await?;

    let grids = state
        .grid_repository
        .list_for_game(game_id)
        .await
        .map_err(internal("Failed to fetch grids"))?;

    Ok(Json(json!({
        "success": true,
        "grids": grids,
        "gridsFetched": true
    })))
}

pub async fn update_grid(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateGridRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let changes = payload.validate()?;

    let grid = apply_changes(&state, user.id, id, &changes).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Grid updated successfully",
        "grid": grid
    })))
}

pub async fn update_grid_position(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PositionInput>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let changes = GridChanges {
        position: Some(payload.validate()?),
        ..Default::default()
    };

    let grid = apply_changes(&state, user.id, id, &changes).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Position updated successfully",
        "grid": grid
    })))
}

/// Place an asset from the same game onto a grid
pub async fn link_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<LinkAssetRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let asset_id = payload.validate()?;

    let grid = load_grid(&state, user.id, id).await?;

    let asset_game_id = state
        .asset_repository
        .game_id_of(user.id, asset_id)
        .await
        .map_err(internal("Failed to load asset"))?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    if asset_game_id != grid.game_id {
        return Err(ApiError::bad_request(
            "Asset and grid belong to different games",
        ));
    }

    let linked = state
        .grid_repository
        .link_asset(grid.id, asset_id)
        .await
        .map_err(internal("Failed to add asset to grid"))?;

    if !linked {
        return Err(ApiError::Conflict(
            "Asset is already placed on this grid".to_string(),
        ));
    }

    let grid = load_grid(&state, user.id, id).await?;
    info!("Asset {} placed on grid {}", asset_id, grid.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Asset added to grid",
            "grid": grid
        })),
    ))
}

pub async fn delete_grid(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let deleted = state
        .grid_repository
        .delete(user.id, id)
        .await
        .map_err(internal("Failed to delete grid"))?;

    if !deleted {
        return Err(grid_not_found());
    }

    info!("User {} deleted grid {}", user.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Grid deleted successfully"
    })))
}
