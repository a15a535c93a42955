use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.full_path(path)).await?;
        Ok(data)
    }

    /// 先寫暫存檔再 rename，中斷時不會留下寫一半的快照
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_path(&full_path);
        // 先前中斷留下的暫存檔
        remove_if_exists(&tmp).await?;

        let written = match tokio::fs::write(&tmp, data).await {
            Ok(()) => tokio::fs::rename(&tmp, &full_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = remove_if_exists(&tmp).await {
                tracing::warn!("⚠️ Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.full_path(path)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(!storage.exists("data/history.json").await.unwrap());
        storage
            .write_file("data/history.json", b"{}")
            .await
            .unwrap();

        assert!(storage.exists("data/history.json").await.unwrap());
        assert_eq!(storage.read_file("data/history.json").await.unwrap(), b"{}");
        assert!(!dir.path().join("data/history.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("history.json", b"old").await.unwrap();
        storage.write_file("history.json", b"new").await.unwrap();

        assert_eq!(storage.read_file("history.json").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_write_clears_stale_temp_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let stale = dir.path().join("history.json.tmp");
        std::fs::write(&stale, b"{\"half\": ").unwrap();

        storage.write_file("history.json", b"{}").await.unwrap();

        assert!(!stale.exists());
        assert_eq!(storage.read_file("history.json").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        // 目標是目錄時 rename 會失敗
        std::fs::create_dir(dir.path().join("history.json")).unwrap();

        let err = storage.write_file("history.json", b"{}").await.unwrap_err();

        assert!(matches!(err, crate::utils::error::ScrapeError::Io(_)));
        assert!(!dir.path().join("history.json.tmp").exists());
        assert!(dir.path().join("history.json").is_dir());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.read_file("missing.json").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::ScrapeError::Io(_)));
    }
}
