use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub id: String,
    pub url: String,
}

/// On-disk blob store for uploaded media. Files are named by UUID and
/// served read-only under `/assets`.
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub async fn init(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating asset dir {}", dir.display()))?;
        info!("Asset store at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_for(id: &str) -> String {
        format!("/assets/{id}")
    }

    /// Ids must be UUIDs; anything else never touches the filesystem.
    fn path_of(&self, id: &str) -> Option<PathBuf> {
        id.parse::<Uuid>().ok().map(|_| self.dir.join(id))
    }

    pub async fn store(&self, bytes: &[u8]) -> Result<StoredAsset> {
        let id = Uuid::new_v4().to_string();
        let path = self.dir.join(&id);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing asset {id}"))?;
        Ok(StoredAsset {
            url: Self::url_for(&id),
            id,
        })
    }

    pub async fn exists(&self, id: &str) -> bool {
        match self.path_of(id) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Idempotent: deleting a missing or malformed id is a no-op.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let Some(path) = self.path_of(id) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("deleting asset {id}")),
        }
    }
}

/// The blob an asset swap leaves behind, if any. A self-replacement
/// (the new id equals the stored one) keeps the file; deleting it would
/// leave the row pointing at nothing.
pub fn replaced_blob(old: &str, new: &str) -> Option<String> {
    (old != new).then(|| old.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> AssetStore {
        let dir = std::env::temp_dir().join(format!("cliptide-test-{}", Uuid::new_v4()));
        AssetStore::init(&dir).await.expect("asset store")
    }

    #[tokio::test]
    async fn store_then_exists_then_delete() {
        let store = temp_store().await;

        let asset = store.store(b"fake mp4 bytes").await.unwrap();
        assert_eq!(asset.url, format!("/assets/{}", asset.id));
        assert!(store.exists(&asset.id).await);

        store.delete(&asset.id).await.unwrap();
        assert!(!store.exists(&asset.id).await);

        // second delete is a no-op
        store.delete(&asset.id).await.unwrap();
    }

    #[test]
    fn self_replacement_keeps_the_blob() {
        assert_eq!(replaced_blob("old-id", "new-id").as_deref(), Some("old-id"));
        assert!(replaced_blob("same-id", "same-id").is_none());
    }

    #[tokio::test]
    async fn traversal_ids_never_reach_the_filesystem() {
        let store = temp_store().await;
        assert!(!store.exists("../../etc/passwd").await);
        // no error either: malformed ids are simply not assets
        store.delete("../../etc/passwd").await.unwrap();
    }
}
