//! Game repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::game::{Game, GameChanges, NewGame};

/// Game repository
#[derive(Clone)]
pub struct GameRepository {
    pool: PgPool,
}

impl GameRepository {
    /// Create a new game repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All games owned by a user, newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Game>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM games
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(game_from_row).collect())
    }

    pub async fn create(&self, user_id: Uuid, new_game: &NewGame) -> Result<Game> {
        let row = sqlx::query(
            r#"
            INSERT INTO games (user_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, description, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&new_game.name)
        .bind(&new_game.description)
        .fetch_one(&self.pool)
        .await?;

        let game = game_from_row(&row);
        info!("Created game {} for user {}", game.id, user_id);
        Ok(game)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Game>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM games
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(game_from_row))
    }

    /// Whether `user_id` owns the game
    pub async fn is_owned_by(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM games WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }

    /// Apply the present fields; `None` when the game is not found
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &GameChanges,
    ) -> Result<Option<Game>> {
        let row = sqlx::query(
            r#"
            UPDATE games
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(game_from_row))
    }

    /// Delete a game together with its menus, assets and grids.
    ///
    /// Returns the stored file paths of the removed assets, or `None` when
    /// the game is not found.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        let file_paths: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT a.file_path
            FROM assets a
            JOIN asset_menus m ON m.id = a.asset_menu_id
            JOIN games g ON g.id = m.game_id
            WHERE g.id = $1 AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM games WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        info!("Deleted game {} ({} stored files)", id, file_paths.len());
        Ok(Some(file_paths))
    }
}

fn game_from_row(row: &PgRow) -> Game {
    Game {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
