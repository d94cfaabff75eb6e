use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use tokio::fs;

use crate::error::ApiError;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
pub const URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Images,
    Videos,
    Pdfs,
}

impl UploadCategory {
    /// Maps an allowed MIME type to its storage category.
    pub fn classify(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/png" | "image/gif" | "image/webp" => Some(Self::Images),
            "video/mp4" | "video/webm" | "video/ogg" => Some(Self::Videos),
            "application/pdf" => Some(Self::Pdfs),
            _ => None,
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Pdfs => "pdfs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    pub url: String,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check_type(&self, content_type: Option<&str>) -> Result<UploadCategory, ApiError> {
        content_type
            .and_then(UploadCategory::classify)
            .ok_or_else(|| ApiError::UploadRejected("File type not allowed".to_string()))
    }

    /// Called with the running total while the body is received.
    pub fn check_size(&self, received: u64) -> Result<(), ApiError> {
        if received > self.max_bytes {
            return Err(ApiError::UploadRejected(format!(
                "File size too large. Maximum size is {}MB",
                self.max_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Writes `data` under `<root>/<category>/` with a collision-resistant name.
    pub async fn save(
        &self,
        category: UploadCategory,
        original_name: Option<&str>,
        data: &[u8],
    ) -> anyhow::Result<StoredUpload> {
        let file_name = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            &uuid::Uuid::new_v4().simple().to_string()[..12],
            sanitize_file_name(original_name.unwrap_or_default())
        );
        let dir = self.root.join(category.dir());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create upload dir: {}", dir.display()))?;

        let path = dir.join(&file_name);
        let tmp_path = dir.join(format!(".{file_name}.tmp"));
        fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("rename tmp to final: {}", path.display()))?;

        tracing::info!(path = %path.display(), bytes = data.len(), "stored upload");
        Ok(StoredUpload {
            url: format!("{URL_PREFIX}/{}/{file_name}", category.dir()),
            path,
        })
    }
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
