use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use tokio::fs;
use uuid::Uuid;

use crate::domain::Language;
use crate::error::{AppError, Result};

/// Where generated audio lives on disk and how it is addressed over HTTP.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative locator: `audio/{year}/{month}/{day}/announcement_{id}_{lang}.wav`.
    pub fn audio_locator(announcement_id: Uuid, language: Language, date: DateTime<Utc>) -> String {
        format!(
            "audio/{:04}/{:02}/{:02}/announcement_{}_{}.wav",
            date.year(),
            date.month(),
            date.day(),
            announcement_id,
            language.code()
        )
    }

    pub fn absolute_path(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }

    pub fn url(&self, locator: &str) -> String {
        format!("{}/{}", self.url_prefix, locator)
    }

    /// Creates the parent directory of `locator` and returns its absolute path.
    pub async fn prepare(&self, locator: &str) -> Result<PathBuf> {
        let path = self.absolute_path(locator);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(format!("Failed to create audio directory: {}", e))
            })?;
        }
        Ok(path)
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, locator: &str) {
        // Only files under audio/ are ours to delete
        if !locator.starts_with("audio/") || locator.contains("..") {
            return;
        }

        let path = self.absolute_path(locator);
        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed audio file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove audio file {}: {}", path.display(), e),
        }
    }
}
