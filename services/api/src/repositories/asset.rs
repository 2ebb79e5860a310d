//! Asset repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::asset::{Asset, NewAsset};

const ASSET_COLUMNS: &str =
    "a.id, a.asset_menu_id, a.name, a.mime_type, a.size, a.file_path, a.created_at, a.updated_at";

/// Asset repository
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    /// Create a new asset repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_asset: &NewAsset) -> Result<Asset> {
        let row = sqlx::query(
            r#"
            INSERT INTO assets AS a (asset_menu_id, name, mime_type, size, file_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING a.id, a.asset_menu_id, a.name, a.mime_type, a.size, a.file_path,
                      a.created_at, a.updated_at
            "#,
        )
        .bind(new_asset.asset_menu_id)
        .bind(&new_asset.name)
        .bind(&new_asset.mime_type)
        .bind(new_asset.size)
        .bind(&new_asset.file_path)
        .fetch_one(&self.pool)
        .await?;

        let asset = asset_from_row(&row);
        info!("Created asset {} in menu {}", asset.id, asset.asset_menu_id);
        Ok(asset)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ASSET_COLUMNS}
            FROM assets a
            JOIN asset_menus m ON m.id = a.asset_menu_id
            JOIN games g ON g.id = m.game_id
            WHERE a.id = $1 AND g.user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(asset_from_row))
    }

    /// Game the asset belongs to, if the user owns it
    pub async fn game_id_of(&self, user_id: Uuid, id: Uuid) -> Result<Option<Uuid>> {
        let game_id = sqlx::query_scalar(
            r#"
            SELECT g.id
            FROM assets a
            JOIN asset_menus m ON m.id = a.asset_menu_id
            JOIN games g ON g.id = m.game_id
            WHERE a.id = $1 AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(game_id)
    }

    /// Delete an asset and its grid links, returning the removed row
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            DELETE FROM assets a
            USING asset_menus m, games g
            WHERE a.id = $1
              AND m.id = a.asset_menu_id
              AND g.id = m.game_id
              AND g.user_id = $2
            RETURNING a.id, a.asset_menu_id, a.name, a.mime_type, a.size, a.file_path,
                      a.created_at, a.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(asset_from_row))
    }
}

pub(crate) fn asset_from_row(row: &PgRow) -> Asset {
    let id: Uuid = row.get("id");
    Asset {
        id,
        asset_menu_id: row.get("asset_menu_id"),
        name: row.get("name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        file_path: row.get("file_path"),
        url: Asset::file_url(id),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
