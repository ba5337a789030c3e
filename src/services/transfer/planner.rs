use super::error::{ArtifactOp, TransferError};
use std::cmp::Ordering;
use std::io;
use std::path::Path;
use tokio::fs::{self, OpenOptions};

/// Where a session has to start and whether it has to run at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    pub start_offset: u64,
    pub already_complete: bool,
}

/// Decides the resume offset from the bytes already on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResumePlanner;

impl ResumePlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans a session for `path`, creating an empty artifact when none exists.
    ///
    /// `name` only labels a [`TransferError::SizeMismatch`].
    pub async fn plan(
        &self,
        name: &str,
        path: &Path,
        declared_total: u64,
    ) -> Result<ResumePlan, TransferError> {
        // create without truncate keeps an existing artifact intact
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await
            .map_err(TransferError::artifact(ArtifactOp::Create))?;

        let current = fs::metadata(path)
            .await
            .map_err(TransferError::artifact(ArtifactOp::Stat))?
            .len();

        compare(name, current, declared_total)
    }

    /// Same decision as [`plan`](Self::plan) without touching the disk
    /// beyond a stat. A missing artifact plans to offset zero.
    pub async fn probe(
        &self,
        name: &str,
        path: &Path,
        declared_total: u64,
    ) -> Result<ResumePlan, TransferError> {
        let current = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(TransferError::ArtifactIo {
                    op: ArtifactOp::Stat,
                    source: e,
                });
            }
        };

        compare(name, current, declared_total)
    }
}

fn compare(name: &str, current: u64, declared: u64) -> Result<ResumePlan, TransferError> {
    match current.cmp(&declared) {
        Ordering::Less => Ok(ResumePlan {
            start_offset: current,
            already_complete: false,
        }),
        Ordering::Equal => Ok(ResumePlan {
            start_offset: current,
            already_complete: true,
        }),
        Ordering::Greater => Err(TransferError::SizeMismatch {
            name: name.to_string(),
            current,
            declared,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_artifact_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.bin");

        let plan = ResumePlanner::new().plan("new.bin", &path, 10).await.unwrap();
        assert_eq!(
            plan,
            ResumePlan {
                start_offset: 0,
                already_complete: false
            }
        );
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_partial_artifact_resumes_at_its_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("part.bin");
        std::fs::write(&path, vec![7u8; 400]).unwrap();

        let planner = ResumePlanner::new();
        for _ in 0..3 {
            let plan = planner.plan("part.bin", &path, 1000).await.unwrap();
            assert_eq!(plan.start_offset, 400);
            assert!(!plan.already_complete);
        }
        assert_eq!(std::fs::read(&path).unwrap(), vec![7u8; 400]);
    }

    #[tokio::test]
    async fn test_complete_artifact_reports_done() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("done.bin");
        std::fs::write(&path, vec![1u8; 1000]).unwrap();

        let plan = ResumePlanner::new().plan("done.bin", &path, 1000).await.unwrap();
        assert!(plan.already_complete);
        assert_eq!(plan.start_offset, 1000);
    }

    #[tokio::test]
    async fn test_zero_declared_total_is_complete_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");

        let plan = ResumePlanner::new().plan("empty.bin", &path, 0).await.unwrap();
        assert!(plan.already_complete);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_oversized_artifact_is_a_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 1200]).unwrap();

        let err = ResumePlanner::new()
            .plan("big.bin", &path, 1000)
            .await
            .unwrap_err();
        match err {
            TransferError::SizeMismatch {
                current, declared, ..
            } => {
                assert_eq!(current, 1200);
                assert_eq!(declared, 1000);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1200);
    }

    #[tokio::test]
    async fn test_probe_does_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ghost.bin");

        let plan = ResumePlanner::new().probe("ghost.bin", &path, 5).await.unwrap();
        assert_eq!(plan.start_offset, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_parent_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("f.bin");

        let err = ResumePlanner::new().plan("f.bin", &path, 5).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::ArtifactIo {
                op: ArtifactOp::Create,
                ..
            }
        ));
    }
}
