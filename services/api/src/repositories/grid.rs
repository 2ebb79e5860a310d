//! Grid repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::{
    layout::Position,
    models::grid::{Grid, GridChanges, NewGrid},
};

/// Grid repository
#[derive(Clone)]
pub struct GridRepository {
    pool: PgPool,
}

impl GridRepository {
    /// Create a new grid repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a grid; the caller has checked ownership of the game
    pub async fn create(&self, new_grid: &NewGrid) -> Result<Grid> {
        let row = sqlx::query(
            r#"
            INSERT INTO grids (game_id, rows, columns, cell_size, position_top, position_left)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, game_id, rows, columns, cell_size, position_top, position_left,
                      created_at, updated_at
            "#,
        )
        .bind(new_grid.game_id)
        .bind(new_grid.rows)
        .bind(new_grid.columns)
        .bind(new_grid.cell_size)
        .bind(new_grid.position.top)
        .bind(new_grid.position.left)
        .fetch_one(&self.pool)
        .await?;

        let grid = grid_from_row(&row);
        info!(
            "Created {}x{} grid {} in game {}",
            grid.rows, grid.columns, grid.id, grid.game_id
        );
        Ok(grid)
    }

    /// Grids of a game in creation order
    pub async fn list_for_game(&self, game_id: Uuid) -> Result<Vec<Grid>> {
        let rows = sqlx::query(
            r#"
            SELECT id, game_id, rows, columns, cell_size, position_top, position_left,
                   created_at, updated_at
            FROM grids
            WHERE game_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        let mut grids: Vec<Grid> = rows.iter().map(grid_from_row).collect();
        self.attach_assets(&mut grids).await?;
        Ok(grids)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Grid>> {
        let row = sqlx::query(
            r#"
            SELECT gr.id, gr.game_id, gr.rows, gr.columns, gr.cell_size,
                   gr.position_top, gr.position_left, gr.created_at, gr.updated_at
            FROM grids gr
            JOIN games g ON g.id = gr.game_id
            WHERE gr.id = $1 AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        self.with_assets(row.as_ref().map(grid_from_row)).await
    }

    /// Apply the present fields; `None` when the grid is not found
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &GridChanges,
    ) -> Result<Option<Grid>> {
        let row = sqlx::query(
            r#"
            UPDATE grids gr
            SET rows = COALESCE($3, gr.rows),
                columns = COALESCE($4, gr.columns),
                cell_size = COALESCE($5, gr.cell_size),
                position_top = COALESCE($6, gr.position_top),
                position_left = COALESCE($7, gr.position_left),
                updated_at = NOW()
            FROM games g
            WHERE gr.id = $1 AND g.id = gr.game_id AND g.user_id = $2
            RETURNING gr.id, gr.game_id, gr.rows, gr.columns, gr.cell_size,
                      gr.position_top, gr.position_left, gr.created_at, gr.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.rows)
        .bind(changes.columns)
        .bind(changes.cell_size)
        .bind(changes.position.map(|p| p.top))
        .bind(changes.position.map(|p| p.left))
        .fetch_optional(&self.pool)
        .await?;

        self.with_assets(row.as_ref().map(grid_from_row)).await
    }

    /// Place an asset on a grid; `false` when it is already there
    pub async fn link_asset(&self, grid_id: Uuid, asset_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO grid_assets (grid_id, asset_id)
            VALUES ($1, $2)
            ON CONFLICT (grid_id, asset_id) DO NOTHING
            "#,
        )
        .bind(grid_id)
        .bind(asset_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a grid; its asset links go with it
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM grids gr
            USING games g
            WHERE gr.id = $1 AND g.id = gr.game_id AND g.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_assets(&self, grid: Option<Grid>) -> Result<Option<Grid>> {
        match grid {
            Some(grid) => {
                let mut grids = [grid];
                self.attach_assets(&mut grids).await?;
                let [grid] = grids;
                Ok(Some(grid))
            }
            None => Ok(None),
        }
    }

    async fn attach_assets(&self, grids: &mut [Grid]) -> Result<()> {
        if grids.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = grids.iter().map(|g| g.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT grid_id, asset_id
            FROM grid_assets
            WHERE grid_id = ANY($1)
            ORDER BY created_at, asset_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_grid: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in &rows {
            by_grid
                .entry(row.get("grid_id"))
                .or_default()
                .push(row.get("asset_id"));
        }

        for grid in grids.iter_mut() {
            grid.assets = by_grid.remove(&grid.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn grid_from_row(row: &PgRow) -> Grid {
    Grid {
        id: row.get("id"),
        game_id: row.get("game_id"),
        rows: row.get("rows"),
        columns: row.get("columns"),
        cell_size: row.get("cell_size"),
        position: Position::new(row.get("position_top"), row.get("position_left")),
        assets: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
