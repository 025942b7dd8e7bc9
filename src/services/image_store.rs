use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Public prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Largest single image accepted.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Stores product images on local disk under generated names.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes and returns the public reference, e.g. `/uploads/<uuid>.png`.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds {} MiB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(original_name));
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating {}", self.root.display()))?;
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "image stored");
        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }

    /// Saves every file or none: on the first failure the files already
    /// written by this call are removed again.
    pub async fn save_all<'a, I>(&self, files: I) -> AppResult<Vec<String>>
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a [u8])>,
    {
        let mut stored = Vec::new();
        for (original_name, bytes) in files {
            match self.save(original_name, bytes).await {
                Ok(reference) => stored.push(reference),
                Err(err) => {
                    self.remove_all(&stored).await;
                    return Err(err);
                }
            }
        }
        Ok(stored)
    }

    pub async fn remove_all(&self, references: &[String]) {
        for reference in references {
            self.remove(reference).await;
        }
    }

    /// Best-effort removal of a previously stored reference.
    pub async fn remove(&self, reference: &str) {
        let Some(file_name) = reference.strip_prefix(&format!("{PUBLIC_PREFIX}/")) else {
            return;
        };
        if file_name.contains('/') || file_name.contains("..") {
            return;
        }
        if let Err(err) = tokio::fs::remove_file(self.root.join(file_name)).await {
            tracing::warn!(error = %err, reference, "image removal failed");
        }
    }
}

fn extension_for(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "bin".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_whitelisted() {
        assert_eq!(extension_for(Some("Shirt.PNG")), "png");
        assert_eq!(extension_for(Some("payload.sh")), "bin");
        assert_eq!(extension_for(None), "bin");
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("image-store-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root);

        let reference = store.save(Some("front.jpg"), b"jpeg-bytes").await.unwrap();
        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with(".jpg"));

        let file = root.join(reference.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(&file).await.unwrap(), b"jpeg-bytes");

        store.remove(&reference).await;
        assert!(!file.exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn failed_batch_leaves_nothing_behind() {
        let root = std::env::temp_dir().join(format!("image-store-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root);
        let oversized = vec![0_u8; MAX_IMAGE_BYTES + 1];

        let files = [
            (Some("front.png"), &b"png-bytes"[..]),
            (Some("back.png"), oversized.as_slice()),
        ];
        let err = store.save_all(files).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut entries = tokio::fs::read_dir(&root).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
