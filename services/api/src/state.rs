//! Application state shared across handlers

use auth::AuthState;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::ServerConfig,
    repositories::{AssetMenuRepository, AssetRepository, GameRepository, GridRepository},
    storage::UploadStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth: AuthState,
    pub game_repository: GameRepository,
    pub asset_menu_repository: AssetMenuRepository,
    pub asset_repository: AssetRepository,
    pub grid_repository: GridRepository,
    pub upload_store: UploadStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the repositories and upload store on top of one pool
    pub fn new(db_pool: PgPool, auth: AuthState, config: ServerConfig) -> Self {
        Self {
            game_repository: GameRepository::new(db_pool.clone()),
            asset_menu_repository: AssetMenuRepository::new(db_pool.clone()),
            asset_repository: AssetRepository::new(db_pool.clone()),
            grid_repository: GridRepository::new(db_pool.clone()),
            upload_store: UploadStore::new(&config.upload_dir, config.max_upload_bytes),
            config: Arc::new(config),
            auth,
            db_pool,
        }
    }
}
