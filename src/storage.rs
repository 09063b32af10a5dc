use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Filesystem-backed store for uploaded avatar files.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Persists the file and returns the stored name.
    async fn save(&self, original_name: &str, body: Bytes) -> anyhow::Result<String>;
    async fn delete(&self, stored_name: &str) -> anyhow::Result<()>;
}

pub struct LocalAvatarStore {
    root: PathBuf,
}

impl LocalAvatarStore {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .context("create upload dir")?;
        Ok(Self { root })
    }
}

#[async_trait]
impl AvatarStore for LocalAvatarStore {
    async fn save(&self, original_name: &str, body: Bytes) -> anyhow::Result<String> {
        // Only the extension survives from the client-supplied name.
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        let stored = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(self.root.join(&stored), &body)
            .await
            .context("write avatar file")?;
        Ok(stored)
    }

    async fn delete(&self, stored_name: &str) -> anyhow::Result<()> {
        tokio::fs::remove_file(self.root.join(stored_name))
            .await
            .context("remove avatar file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_delete_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalAvatarStore::new(dir.path()).await.expect("store");

        let stored = store
            .save("me.png", Bytes::from_static(b"fake image"))
            .await
            .expect("save");
        assert!(stored.ends_with(".png"));
        assert!(dir.path().join(&stored).exists());

        store.delete(&stored).await.expect("delete");
        assert!(!dir.path().join(&stored).exists());
    }

    #[tokio::test]
    async fn suspicious_names_fall_back_to_bin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalAvatarStore::new(dir.path()).await.expect("store");

        let stored = store
            .save("../../../etc/passwd", Bytes::from_static(b"x"))
            .await
            .expect("save");
        // The stored name is a fresh UUID, never the client path.
        assert!(!stored.contains(".."));
        assert!(!stored.contains('/'));
        assert!(dir.path().join(&stored).exists());
    }

    #[tokio::test]
    async fn weird_extension_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalAvatarStore::new(dir.path()).await.expect("store");

        let stored = store
            .save("photo.p;g", Bytes::from_static(b"x"))
            .await
            .expect("save");
        assert!(stored.ends_with(".bin"));
    }
}
