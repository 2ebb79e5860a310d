//! Asset menu models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ApiError,
    layout::{Cell, Position},
    models::{PositionInput, asset::Asset, required_id, required_text},
};

pub const DEFAULT_TITLE: &str = "Untitled";

/// Draggable panel holding assets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMenu {
    pub id: Uuid,
    pub game_id: Uuid,
    pub title: String,
    pub position: Position,
    pub order: Option<i32>,
    pub assets: Vec<Asset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated asset menu creation payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssetMenu {
    pub game_id: Uuid,
    pub title: String,
    pub position: Position,
    pub order: Option<i32>,
}

/// Validated partial asset menu update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMenuChanges {
    pub title: Option<String>,
    pub position: Option<Position>,
    pub order: Option<i32>,
}

impl AssetMenuChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.position.is_none() && self.order.is_none()
    }
}

/// Request body for `POST /api/assetMenus`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetMenuRequest {
    pub game_id: Option<String>,
    pub title: Option<String>,
    pub position: Option<PositionInput>,
    pub order: Option<i32>,
}

impl CreateAssetMenuRequest {
    pub fn validate(&self) -> Result<NewAssetMenu, ApiError> {
        let game_id = required_id(self.game_id.as_deref(), "gameId")?;

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let position = match &self.position {
            Some(position) => position.validate()?,
            None => Position::default(),
        };

        Ok(NewAssetMenu {
            game_id,
            title,
            position,
            order: self.order,
        })
    }
}

/// Request body for `PUT /api/assetMenus/:id`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAssetMenuRequest {
    pub title: Option<String>,
    pub position: Option<PositionInput>,
    pub order: Option<i32>,
}

impl UpdateAssetMenuRequest {
    pub fn validate(&self) -> Result<AssetMenuChanges, ApiError> {
        let changes = AssetMenuChanges {
            title: self
                .title
                .as_deref()
                .map(|t| required_text(Some(t), "Title cannot be empty"))
                .transpose()?,
            position: self.position.as_ref().map(PositionInput::validate).transpose()?,
            order: self.order,
        };

        if changes.is_empty() {
            return Err(ApiError::bad_request(
                "Provide title, position or order to update",
            ));
        }

        Ok(changes)
    }
}

/// Request body for `PUT /api/assetMenus/:id/title`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: Option<String>,
}

impl UpdateTitleRequest {
    pub fn validate(&self) -> Result<String, ApiError> {
        required_text(self.title.as_deref(), "Title cannot be empty")
    }
}

/// Request body for `PUT /api/assetMenus/:id/position`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    pub top: Option<f64>,
    pub left: Option<f64>,
    /// Snap the position to this grid's cells
    pub grid_id: Option<String>,
}

impl UpdatePositionRequest {
    pub fn validate(&self) -> Result<(Position, Option<Uuid>), ApiError> {
        let position = PositionInput {
            top: self.top,
            left: self.left,
        }
        .validate()?;

        let grid_id = match self.grid_id.as_deref() {
            Some(raw) => Some(required_id(Some(raw), "gridId")?),
            None => None,
        };

        Ok((position, grid_id))
    }
}

/// Response for a position update
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "assetMenu")]
    pub asset_menu: AssetMenu,
    /// Grid cell the menu was snapped into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<Cell>,
}

/// Request body for `PUT /api/assetMenus/order`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderRequest {
    pub ordered_data: Option<Value>,
}

impl BulkOrderRequest {
    /// Every item needs a valid `id` and an integer `order`
    pub fn validate(&self) -> Result<Vec<(Uuid, i32)>, ApiError> {
        let items = self
            .ordered_data
            .as_ref()
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::bad_request("orderedData should be an array"))?;

        let mut valid = Vec::with_capacity(items.len());
        let mut invalid = Vec::new();

        for item in items {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok());
            let order = item
                .get("order")
                .and_then(Value::as_i64)
                .and_then(|o| i32::try_from(o).ok());

            match (id, order) {
                (Some(id), Some(order)) => valid.push((id, order)),
                _ => invalid.push(item.clone()),
            }
        }

        if !invalid.is_empty() {
            return Err(ApiError::InvalidItems {
                message: "Each item must have a valid 'id' and 'order'".to_string(),
                items: invalid,
            });
        }

        Ok(valid)
    }
}

/// Give menus without an explicit order their index in the sorted list
pub fn fill_default_order(menus: &mut [AssetMenu]) {
    for (index, menu) in menus.iter_mut().enumerate() {
        if menu.order.is_none() {
            menu.order = Some(index as i32);
        }
    }
}
