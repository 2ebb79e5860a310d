//! Asset models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uploaded file attached to an asset menu
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub asset_menu_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
    pub file_path: String,
    /// Where the client downloads the file from
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn file_url(id: Uuid) -> String {
        format!("/api/assets/{}/file", id)
    }
}

/// Validated upload metadata
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub asset_menu_id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub file_path: String,
}

/// `?assetMenuId=` query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuery {
    pub asset_menu_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_serializes_type_and_url() {
        let id = Uuid::new_v4();
        let asset = Asset {
            id,
            asset_menu_id: Uuid::new_v4(),
            name: "hero.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 42,
            file_path: "uploads/assets/x.png".to_string(),
            url: Asset::file_url(id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["type"], "image/png");
        assert_eq!(json["url"], format!("/api/assets/{}/file", id));
        assert!(json.get("assetMenuId").is_some());
        assert!(json.get("mimeType").is_none());
    }
}
