//! Asset routes, mounted under `/api/assets`

use axum::{
    Extension, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use auth::AuthUser;

use crate::{
    AppState,
    error::{ApiError, ApiResult, internal},
    models::{
        asset::{AssetQuery, NewAsset},
        required_id,
    },
    routes::path_id,
    storage::UploadStore,
};

/// Room for multipart boundaries and the text fields next to the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets))
        .route(
            "/upload",
            post(upload_asset).layer(upload_body_limit(max_upload_bytes)),
        )
        .route("/:id", delete(delete_asset))
        .route("/:id/file", get(download_asset))
}

fn asset_not_found() -> ApiError {
    ApiError::not_found("Asset not found")
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload is too large".to_string())
    } else {
        ApiError::bad_request(e.body_text())
    }
}

struct UploadedFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// A multipart upload that passed the request checks
struct UploadForm {
    asset_menu_id: Uuid,
    file: UploadedFile,
}

fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)
}

/// Read the `assetMenuId` and `file` parts and apply the upload policy
async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    store: &UploadStore,
) -> ApiResult<UploadForm> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut asset_menu_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("assetMenuId") => {
                asset_menu_id = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    name,
                    mime_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => warn!("Ignoring unexpected upload field {:?}", other),
        }
    }

    let asset_menu_id = match asset_menu_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => required_id(Some(raw), "assetMenuId")?,
        _ => return Err(ApiError::bad_request("AssetMenu ID is required")),
    };
    let file = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    store
        .check(&file.mime_type, file.bytes.len())
        .map_err(ApiError::BadRequest)?;

    Ok(UploadForm {
        asset_menu_id,
        file,
    })
}

/// Store an uploaded file and record it in an asset menu
pub async fn upload_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let UploadForm {
        asset_menu_id,
        file,
    } = read_upload_form(multipart, &state.upload_store).await?;

    state
        .asset_menu_repository
        .find(user.id, asset_menu_id)
        .await
        .map_err(internal("Failed to load asset menu"))?
        .ok_or_else(|| ApiError::not_found("AssetMenu not found with the provided ID"))?;

    let stored = state
        .upload_store
        .save(&file.name, &file.bytes)
        .await
        .map_err(internal("Failed to store upload"))?;

    let new_asset = NewAsset {
        asset_menu_id,
        name: file.name,
        mime_type: file.mime_type,
        size: file.bytes.len() as i64,
        file_path: stored.file_path.clone(),
    };

    let asset = match state.asset_repository.create(&new_asset).await {
        Ok(asset) => asset,
        Err(e) => {
            error!("Failed to record asset: {:#}", e);
            state.upload_store.remove_all(&[stored.file_path]).await;
            return Err(ApiError::InternalServerError);
        }
    };

    info!(
        "User {} uploaded asset {} ({} bytes)",
        user.id, asset.id, asset.size
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Asset uploaded successfully",
            "asset": asset
        })),
    ))
}

/// Assets of one menu in upload order
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AssetQuery>,
) -> ApiResult<impl IntoResponse> {
    let asset_menu_id = required_id(query.asset_menu_id.as_deref(), "assetMenuId")?;

    let menu = state
        .asset_menu_repository
        .find(user.id, asset_menu_id)
        .await
        .map_err(internal("Failed to fetch assets"))?
        .ok_or_else(|| ApiError::not_found("Asset menu not found"))?;

    Ok(Json(json!({ "success": true, "assets": menu.assets })))
}

/// Stream back the stored bytes with their recorded MIME type
pub async fn download_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let asset = state
        .asset_repository
        .find(user.id, id)
        .await
        .map_err(internal("Failed to load asset"))?
        .ok_or_else(asset_not_found)?;

    let bytes = state.upload_store.read(&asset.file_path).await.map_err(|e| {
        warn!("Stored file for asset {} is unavailable: {}", asset.id, e);
        ApiError::not_found("File not found")
    })?;

    Ok(([(header::CONTENT_TYPE, asset.mime_type)], bytes))
}

/// Delete an asset, its grid placements and the stored file
pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(&id)?;

    let asset = state
        .asset_repository
        .delete(user.id, id)
        .await
        .map_err(internal("Failed to delete asset"))?
        .ok_or_else(asset_not_found)?;

    state.upload_store.remove_all(&[asset.file_path]).await;
    info!("User {} deleted asset {}", user.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Asset deleted successfully"
    })))
}
