use crate::services::transfer::TransferError;
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::path_guard::StorageRoot;
use anyhow::{Context, Result};
use async_recursion::async_recursion;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Path(#[from] TransferError),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The shared directory as seen by the listing, download and delete handlers.
pub struct LocalStorage {
    root: StorageRoot,
    locks: KeyedMutex,
}

impl LocalStorage {
    pub fn new(root: StorageRoot, locks: KeyedMutex) -> Self {
        Self { root, locks }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Every regular file below the root, sorted by relative path. Symlinks are skipped.
    pub async fn list(&self) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        walk(&self.root, self.root.path(), &mut entries)
            .await
            .with_context(|| format!("Failed to list {}", self.root.path().display()))?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Resolves `name` to an existing regular file.
    pub async fn stat(&self, name: &str) -> Result<(PathBuf, FileEntry), StorageError> {
        let path = self.root.resolve(name)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(StorageError::NotAFile(name.to_string()));
        }

        let entry = entry_for(&self.root, &path, &meta)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        Ok((path, entry))
    }

    /// Removes a file, waiting for any upload running on the same name.
    pub async fn delete(&self, name: &str) -> Result<FileEntry, StorageError> {
        let (path, entry) = self.stat(name).await?;
        {
            let _guard = self.locks.lock(&entry.path).await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(name.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.locks.cleanup();
        Ok(entry)
    }
}

#[async_recursion]
async fn walk(root: &StorageRoot, dir: &Path, out: &mut Vec<FileEntry>) -> io::Result<()> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(item) = reader.next_entry().await? {
        let path = item.path();
        // Symlinks are not followed, so a link back up the tree cannot loop.
        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if meta.is_dir() {
            walk(root, &path, out).await?;
        } else if meta.is_file() {
            if let Some(entry) = entry_for(root, &path, &meta) {
                out.push(entry);
            }
        }
    }
    Ok(())
}

fn entry_for(root: &StorageRoot, path: &Path, meta: &std::fs::Metadata) -> Option<FileEntry> {
    let relative = root.relative(path)?;
    let name = path.file_name()?.to_string_lossy().into_owned();
    Some(FileEntry {
        name,
        path: relative,
        size: meta.len(),
        modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
    })
}
