//! Game models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, models::required_text};

/// Game owned by a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "gameName")]
    pub name: String,
    #[serde(rename = "gameDescription")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated game creation payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub name: String,
    pub description: String,
}

/// Validated partial game update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for `POST /api/games` and `PUT /api/games/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub game_name: Option<String>,
    pub game_description: Option<String>,
}

impl GameRequest {
    pub fn validate_new(&self) -> Result<NewGame, ApiError> {
        let message = "Game name and description are required";
        Ok(NewGame {
            name: required_text(self.game_name.as_deref(), message)?,
            description: required_text(self.game_description.as_deref(), message)?,
        })
    }

    pub fn validate_changes(&self) -> Result<GameChanges, ApiError> {
        if self.game_name.is_none() && self.game_description.is_none() {
            return Err(ApiError::bad_request(
                "Provide gameName or gameDescription to update",
            ));
        }

        Ok(GameChanges {
            name: self
                .game_name
                .as_deref()
                .map(|v| required_text(Some(v), "Game name cannot be empty"))
                .transpose()?,
            description: self
                .game_description
                .as_deref()
                .map(|v| required_text(Some(v), "Game description cannot be empty"))
                .transpose()?,
        })
    }
}
