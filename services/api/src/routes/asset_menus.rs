//! Asset menu routes, mounted under `/api/assetMenus`

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use auth::AuthUser;

use crate::{
    AppState,
    error::{ApiError, ApiResult, internal},
    layout::{Cell, Position},
    models::{
        GameQuery,
        asset_menu::{
            AssetMenu, AssetMenuChanges, BulkOrderRequest, CreateAssetMenuRequest,
            PositionResponse, UpdateAssetMenuRequest, UpdatePositionRequest, UpdateTitleRequest,
        },
        required_id,
    },
    routes::{ApiJson, ensure_game_owned, path_id},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_asset_menus).post(create_asset_menu))
        .route("/order", put(update_order))
        .route("/:id", put(update_asset_menu).delete(delete_asset_menu))
        .route("/:id/title", put(update_title))
        .route("/:id/position", put(update_position))
}

fn menu_not_found() -> ApiError {
    ApiError::not_found("Asset menu not found")
}

/// Menus of a game, ordered, each with its assets
pub async fn list_asset_menus(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GameQuery>,
) -> ApiResult<impl IntoResponse> {
    let game_id = required_id(query.game_id.as_deref(), "gameId")?;
    ensure_game_owned(&state, user.id, game_id).await?;

    let menus = state
        .asset_menu_repository
        .list_for_game(game_id)
        .await
        .map_err(internal("Failed to fetch asset menus"))?;

    Ok(Json(menus))
}

pub async fn create_asset_menu(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateAssetMenuRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_menu = payload.validate()?;
    ensure_game_owned(&state, user.id, new_menu.game_id).await?;

    let menu = state
        .asset_menu_repository
        .create(&new_menu)
        .await
        .map_err(internal("Failed to create asset menu"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Asset Menu created successfully",
            "assetMenu": menu
        })),
    ))
}

async fn apply_changes(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    changes: &AssetMenuChanges,
) -> ApiResult<AssetMenu> {
    state
        .asset_menu_repository
        .update(user_id, id, changes)
        .await
        .map_err(internal("Failed to update asset menu"))?
        .ok_or_else(menu_not_found)
}

pub async fn update_asset_menu(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateAssetMenuRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let changes = payload.validate()?;

    let menu = apply_changes(&state, user.id, id, &changes).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Asset menu updated successfully",
        "assetMenu": menu
    })))
}

pub async fn update_title(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateTitleRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let changes = AssetMenuChanges {
        title: Some(payload.validate()?),
        ..Default::default()
    };

    let menu = apply_changes(&state, user.id, id, &changes).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Title updated successfully",
        "assetMenu": menu
    })))
}

/// Move a menu, optionally snapping it onto a grid of the same game
pub async fn update_position(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdatePositionRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;
    let (position, grid_id) = payload.validate()?;

    let (position, cell) = match grid_id {
        Some(grid_id) => snap_to_grid(&state, user.id, id, grid_id, position).await?,
        None => (position, None),
    };

    let changes = AssetMenuChanges {
        position: Some(position),
        ..Default::default()
    };
    let menu = apply_changes(&state, user.id, id, &changes).await?;

    debug!(
        "Asset menu {} moved to ({}, {})",
        menu.id, position.top, position.left
    );

    Ok(Json(PositionResponse {
        success: true,
        message: "Position updated successfully".to_string(),
        asset_menu: menu,
        cell,
    }))
}

async fn snap_to_grid(
    state: &AppState,
    user_id: Uuid,
    menu_id: Uuid,
    grid_id: Uuid,
    position: Position,
) -> ApiResult<(Position, Option<Cell>)> {
    let menu = state
        .asset_menu_repository
        .find(user_id, menu_id)
        .await
        .map_err(internal("Failed to load asset menu"))?
        .ok_or_else(menu_not_found)?;

    let grid = state
        .grid_repository
        .find(user_id, grid_id)
        .await
        .map_err(internal("Failed to load grid"))?
        .ok_or_else(|| ApiError::not_found("Grid not found"))?;

    if grid.game_id != menu.game_id {
        return Err(ApiError::bad_request(
            "Grid and asset menu belong to different games",
        ));
    }

    let geometry = grid.geometry();
    let snapped = geometry.snap(position);
    Ok((snapped, geometry.cell_at(snapped)))
}

/// Set the order of several menus at once
pub async fn update_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<BulkOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let items = payload.validate()?;

    let updated = state
        .asset_menu_repository
        .update_order(user.id, &items)
        .await
        .map_err(internal("Failed to update asset menu order"))?;

    if updated == 0 {
        return Err(ApiError::bad_request("No orders were updated"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Asset menu orders updated successfully"
    })))
}

/// Delete a menu with its assets and their stored files
pub async fn delete_asset_menu(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let file_paths = state
        .asset_menu_repository
        .delete(user.id, id)
        .await
        .map_err(internal("Failed to delete asset menu"))?
        .ok_or_else(menu_not_found)?;

    state.upload_store.remove_all(&file_paths).await;
    info!("User {} deleted asset menu {}", user.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Asset menu deleted successfully"
    })))
}
