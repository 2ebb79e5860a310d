//! API models for request and response payloads
//!
//! Request payloads keep every field optional and are checked by their
//! `validate` methods, so missing fields produce the JSON error envelope
//! instead of an extractor rejection.

use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, layout::Position};

pub mod asset;
pub mod asset_menu;
pub mod game;
pub mod grid;

/// `?gameId=` query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuery {
    pub game_id: Option<String>,
}

/// Partial `{top, left}` payload as sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionInput {
    pub top: Option<f64>,
    pub left: Option<f64>,
}

impl PositionInput {
    /// Both coordinates are required and must be finite
    pub fn validate(&self) -> Result<Position, ApiError> {
        let (top, left) = match (self.top, self.left) {
            (Some(top), Some(left)) => (top, left),
            (None, _) => return Err(ApiError::bad_request("top is required")),
            (_, None) => return Err(ApiError::bad_request("left is required")),
        };

        if !top.is_finite() || !left.is_finite() {
            return Err(ApiError::bad_request("top and left must be finite numbers"));
        }

        Ok(Position::new(top, left).normalized())
    }
}

/// Trimmed, non-empty text or a 400 with `message`
pub fn required_text(value: Option<&str>, message: &str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request(message))
}

/// Parse a required id field
pub fn required_id(value: Option<&str>, field: &str) -> Result<Uuid, ApiError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))?;

    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} format", field)))
}

/// A JSON number that is a strictly positive integer fitting in `i32`
pub fn positive_int(value: Option<f64>, label: &str) -> Result<i32, ApiError> {
    match value {
        Some(v) if v.fract() == 0.0 && v >= 1.0 && v <= f64::from(i32::MAX) => Ok(v as i32),
        _ => Err(ApiError::bad_request(format!(
            "{} must be a positive integer.",
            label
        ))),
    }
}
