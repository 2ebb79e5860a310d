//! Local disk storage for uploaded asset files

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// MIME types accepted for asset uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "text/plain",
    "application/pdf",
];

/// A file written by [`UploadStore::save`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_name: String,
    /// Path recorded on the asset, relative to the working directory
    pub file_path: String,
}

/// Upload directory plus the upload policy
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check an upload against the MIME allow list and the size limit
    pub fn check(&self, mime_type: &str, size: usize) -> Result<(), String> {
        if !ALLOWED_MIME_TYPES.contains(&mime_type) {
            return Err("Invalid file type".to_string());
        }

        if size > self.max_bytes {
            return Err(format!(
                "File size exceeds the limit of {}",
                human_size(self.max_bytes)
            ));
        }

        Ok(())
    }

    /// Write `bytes` under a fresh unique name keeping the original extension
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile {
            file_path: path.to_string_lossy().replace('\\', "/"),
            file_name,
        })
    }

    /// Read a stored file back
    pub async fn read(&self, file_path: &str) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(self.resolve(file_path)?).await?;
        Ok(bytes)
    }

    /// Delete a stored file; a file that is already gone is not an error
    pub async fn remove(&self, file_path: &str) -> Result<()> {
        match tokio::fs::remove_file(self.resolve(file_path)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stored file {} was already removed", file_path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove several files, logging failures instead of returning them
    pub async fn remove_all(&self, file_paths: &[String]) {
        for file_path in file_paths {
            if let Err(e) = self.remove(file_path).await {
                warn!("Failed to remove stored file {}: {}", file_path, e);
            }
        }
    }

    /// Only the final path component is trusted; files always live in the root.
    fn resolve(&self, file_path: &str) -> Result<PathBuf> {
        let file_name = Path::new(file_path)
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid stored file path: {}", file_path))?;
        Ok(self.root.join(file_name))
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
