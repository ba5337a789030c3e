use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Creates the shared directory when missing and returns its canonical path.
pub async fn setup_storage_dir(dir: &Path) -> Result<PathBuf> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        info!("📁 Storage directory {} not found, creating...", dir.display());
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
    }

    let root = tokio::fs::canonicalize(dir)
        .await
        .with_context(|| format!("Failed to resolve storage directory {}", dir.display()))?;

    let meta = tokio::fs::metadata(&root).await?;
    anyhow::ensure!(meta.is_dir(), "{} is not a directory", root.display());

    info!("✅ Storage directory ready: {}", root.display());
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("public");

        let root = setup_storage_dir(&target).await.unwrap();
        assert!(root.is_absolute());
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_rejects_plain_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(setup_storage_dir(&file).await.is_err());
    }
}
