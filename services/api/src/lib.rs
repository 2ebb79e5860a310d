//! REST API for the game asset organizer
//!
//! Games, asset menus, uploaded assets and snap grids, served next to the
//! authentication routes from the `auth` crate.

pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

pub use state::AppState;
