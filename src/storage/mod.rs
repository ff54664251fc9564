//! Local-directory object storage for visit photos.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::errors::AppError;

/// Folder photos are grouped under, both on disk and in public URLs.
pub const PHOTO_FOLDER: &str = "farm-photos";

/// Extensions accepted for photo uploads. Anything else could be served as markup.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];

/// A stored object and where clients can fetch it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub path: String,
    pub public_url: String,
}

/// Writes uploads beneath `root` and hands back URLs under `{public_url}/uploads/`.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    root: PathBuf,
    public_url: String,
}

impl ObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a photo, returning its object path and public URL.
    pub async fn upload_photo(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let path = object_path(original_name)?;
        let target = self.root.join(&path);

        let write = async {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, bytes).await
        };

        if let Err(e) = write.await {
            tracing::error!("Failed to store upload {:?}: {}", target, e);
            return Err(AppError::UploadFailed(e.to_string()));
        }

        tracing::info!("Stored photo {} ({} bytes)", path, bytes.len());

        Ok(StoredObject {
            public_url: format!("{}/uploads/{}", self.public_url, path),
            path,
        })
    }
}

/// `farm-photos/{random}_{unix_millis}.{ext}`, keeping the image extension of the uploaded name.
fn object_path(original_name: &str) -> Result<String, AppError> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported photo type; expected one of: {}",
                IMAGE_EXTENSIONS.join(", ")
            ))
        })?;

    let random = uuid::Uuid::new_v4().simple().to_string();

    Ok(format!(
        "{}/{}_{}.{}",
        PHOTO_FOLDER,
        &random[..12],
        Utc::now().timestamp_millis(),
        ext
    ))
}
