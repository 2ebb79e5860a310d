//! Grid models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    layout::{GridGeometry, Position},
    models::{PositionInput, positive_int, required_id},
};

/// Snap grid placed on a game's canvas
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub id: Uuid,
    pub game_id: Uuid,
    pub rows: i32,
    pub columns: i32,
    pub cell_size: i32,
    pub position: Position,
    /// Ids of the assets placed on this grid
    pub assets: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grid {
    pub fn geometry(&self) -> GridGeometry {
        // The schema keeps all three strictly positive.
        GridGeometry::new(
            self.rows.max(1) as u32,
            self.columns.max(1) as u32,
            self.cell_size.max(1) as u32,
            self.position,
        )
    }
}

/// Validated grid creation payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrid {
    pub game_id: Uuid,
    pub rows: i32,
    pub columns: i32,
    pub cell_size: i32,
    pub position: Position,
}

/// Validated partial grid update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridChanges {
    pub rows: Option<i32>,
    pub columns: Option<i32>,
    pub cell_size: Option<i32>,
    pub position: Option<Position>,
}

/// Request body for `POST /api/grids`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGridRequest {
    pub game_id: Option<String>,
    pub rows: Option<f64>,
    pub columns: Option<f64>,
    pub cell_size: Option<f64>,
    pub position: Option<PositionInput>,
}

impl CreateGridRequest {
    pub fn validate(&self) -> Result<NewGrid, ApiError> {
        let game_id = match self.game_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => required_id(Some(raw), "gameId")?,
            _ => return Err(ApiError::bad_request("Game ID is required.")),
        };

        Ok(NewGrid {
            game_id,
            rows: positive_int(self.rows, "Rows")?,
            columns: positive_int(self.columns, "Columns")?,
            cell_size: positive_int(self.cell_size, "Cell size")?,
            position: match &self.position {
                Some(position) => position.validate()?,
                None => Position::default(),
            },
        })
    }
}

/// Request body for `PUT /api/grids/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGridRequest {
    pub rows: Option<f64>,
    pub columns: Option<f64>,
    pub cell_size: Option<f64>,
    pub position: Option<PositionInput>,
}

impl UpdateGridRequest {
    pub fn validate(&self) -> Result<GridChanges, ApiError> {
        if self.rows.is_none()
            && self.columns.is_none()
            && self.cell_size.is_none()
            && self.position.is_none()
        {
            return Err(ApiError::bad_request(
                "Provide rows, columns, cellSize or position to update",
            ));
        }

        Ok(GridChanges {
            rows: self.rows.map(|v| positive_int(Some(v), "Rows")).transpose()?,
            columns: self
                .columns
                .map(|v| positive_int(Some(v), "Columns"))
                .transpose()?,
            cell_size: self
                .cell_size
                .map(|v| positive_int(Some(v), "Cell size"))
                .transpose()?,
            position: self.position.as_ref().map(PositionInput::validate).transpose()?,
        })
    }
}

/// Request body for `POST /api/grids/:id/assets`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAssetRequest {
    pub asset_id: Option<String>,
}

impl LinkAssetRequest {
    pub fn validate(&self) -> Result<Uuid, ApiError> {
        required_id(self.asset_id.as_deref(), "assetId")
    }
}
