//! Repositories for database operations
//!
//! Every lookup that takes a `user_id` only sees rows belonging to games
//! owned by that user.

pub mod asset;
pub mod asset_menu;
pub mod game;
pub mod grid;

pub use asset::AssetRepository;
pub use asset_menu::AssetMenuRepository;
pub use game::GameRepository;
pub use grid::GridRepository;
