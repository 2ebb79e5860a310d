//! Asset menu repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    layout::Position,
    models::asset_menu::{AssetMenu, AssetMenuChanges, NewAssetMenu, fill_default_order},
    repositories::asset::asset_from_row,
};

/// Asset menu repository
#[derive(Clone)]
pub struct AssetMenuRepository {
    pool: PgPool,
}

impl AssetMenuRepository {
    /// Create a new asset menu repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Menus of a game with their assets, sorted by order (unordered last)
    pub async fn list_for_game(&self, game_id: Uuid) -> Result<Vec<AssetMenu>> {
        let rows = sqlx::query(
            r#"
            SELECT id, game_id, title, position_top, position_left, sort_order,
                   created_at, updated_at
            FROM asset_menus
            WHERE game_id = $1
            ORDER BY sort_order ASC NULLS LAST, created_at ASC, id ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        let mut menus: Vec<AssetMenu> = rows.iter().map(menu_from_row).collect();
        self.attach_assets(&mut menus).await?;
        fill_default_order(&mut menus);

        Ok(menus)
    }

    /// Insert a menu; the caller has checked ownership of the game
    pub async fn create(&self, new_menu: &NewAssetMenu) -> Result<AssetMenu> {
        let row = sqlx::query(
            r#"
            INSERT INTO asset_menus (game_id, title, position_top, position_left, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, game_id, title, position_top, position_left, sort_order,
                      created_at, updated_at
            "#,
        )
        .bind(new_menu.game_id)
        .bind(&new_menu.title)
        .bind(new_menu.position.top)
        .bind(new_menu.position.left)
        .bind(new_menu.order)
        .fetch_one(&self.pool)
        .await?;

        let menu = menu_from_row(&row);
        info!("Created asset menu {} in game {}", menu.id, menu.game_id);
        Ok(menu)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<AssetMenu>> {
        let row = sqlx::query(
            r#"
            SELECT m.id, m.game_id, m.title, m.position_top, m.position_left, m.sort_order,
                   m.created_at, m.updated_at
            FROM asset_menus m
            JOIN games g ON g.id = m.game_id
            WHERE m.id = $1 AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_assets(row.as_ref().map(menu_from_row)).await
    }

    /// Apply the present fields; `None` when the menu is not found
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &AssetMenuChanges,
    ) -> Result<Option<AssetMenu>> {
        let row = sqlx::query(
            r#"
            UPDATE asset_menus m
            SET title = COALESCE($3, m.title),
                position_top = COALESCE($4, m.position_top),
                position_left = COALESCE($5, m.position_left),
                sort_order = COALESCE($6, m.sort_order),
                updated_at = NOW()
            FROM games g
            WHERE m.id = $1 AND g.id = m.game_id AND g.user_id = $2
            RETURNING m.id, m.game_id, m.title, m.position_top, m.position_left, m.sort_order,
                      m.created_at, m.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.title.as_deref())
        .bind(changes.position.map(|p| p.top))
        .bind(changes.position.map(|p| p.left))
        .bind(changes.order)
        .fetch_optional(&self.pool)
        .await?;

        self.with_assets(row.as_ref().map(menu_from_row)).await
    }

    /// Set the order of several menus in one transaction.
    ///
    /// Returns how many menus were updated; ids the user does not own are
    /// skipped.
    pub async fn update_order(&self, user_id: Uuid, items: &[(Uuid, i32)]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for (id, order) in items {
            let result = sqlx::query(
                r#"
                UPDATE asset_menus m
                SET sort_order = $3, updated_at = NOW()
                FROM games g
                WHERE m.id = $1 AND g.id = m.game_id AND g.user_id = $2
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(order)
            .execute(&mut *tx)
            .await?;

            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!("Reordered {} of {} asset menus", updated, items.len());
        Ok(updated)
    }

    /// Delete a menu and its assets.
    ///
    /// Returns the stored file paths of the removed assets, or `None` when
    /// the menu is not found.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        let file_paths: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT a.file_path
            FROM assets a
            JOIN asset_menus m ON m.id = a.asset_menu_id
            JOIN games g ON g.id = m.game_id
            WHERE m.id = $1 AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM asset_menus m
            USING games g
            WHERE m.id = $1 AND g.id = m.game_id AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        info!("Deleted asset menu {} ({} stored files)", id, file_paths.len());
        Ok(Some(file_paths))
    }

    async fn with_assets(&self, menu: Option<AssetMenu>) -> Result<Option<AssetMenu>> {
        match menu {
            Some(menu) => {
                let mut menus = [menu];
                self.attach_assets(&mut menus).await?;
                let [menu] = menus;
                Ok(Some(menu))
            }
            None => Ok(None),
        }
    }

    async fn attach_assets(&self, menus: &mut [AssetMenu]) -> Result<()> {
        if menus.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = menus.iter().map(|m| m.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, asset_menu_id, name, mime_type, size, file_path, created_at, updated_at
            FROM assets
            WHERE asset_menu_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_menu: HashMap<Uuid, Vec<_>> = HashMap::new();
        for asset in rows.iter().map(asset_from_row) {
            by_menu.entry(asset.asset_menu_id).or_default().push(asset);
        }

        for menu in menus.iter_mut() {
            menu.assets = by_menu.remove(&menu.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn menu_from_row(row: &PgRow) -> AssetMenu {
    AssetMenu {
        id: row.get("id"),
        game_id: row.get("game_id"),
        title: row.get("title"),
        position: Position::new(row.get("position_top"), row.get("position_left")),
        order: row.get("sort_order"),
        assets: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
