use crate::config::ShareConfig;
use crate::services::transfer::{
    ProgressObserver, ResumePlan, ResumePlanner, TracingProgress, TransferError,
    TransferExecutor, TransferSession, skip_source,
};
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::path_guard::StorageRoot;
use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Where the incoming stream starts relative to the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePosition {
    /// The stream carries the payload from byte zero; already stored bytes are skipped.
    Start,
    /// The stream starts at this offset, which must match what is stored.
    Offset(u64),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadOutcome {
    pub name: String,
    pub declared_total: u64,
    pub start_offset: u64,
    pub bytes_written: u64,
    pub final_size: u64,
    pub already_complete: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadStatus {
    pub name: String,
    pub current_size: u64,
    pub start_offset: u64,
    pub already_complete: bool,
}

pub struct UploadService {
    root: StorageRoot,
    locks: KeyedMutex,
    planner: ResumePlanner,
    executor: TransferExecutor,
    config: ShareConfig,
}

impl UploadService {
    pub fn new(root: StorageRoot, locks: KeyedMutex, config: ShareConfig) -> Self {
        Self {
            root,
            locks,
            planner: ResumePlanner::new(),
            executor: TransferExecutor::new(config.buffer_size),
            config,
        }
    }

    /// Stores `source` under `name`, resuming whatever an earlier attempt left.
    /// Progress goes to the log.
    pub async fn upload<R>(
        &self,
        name: &str,
        declared_total: u64,
        position: SourcePosition,
        source: &mut R,
    ) -> Result<UploadOutcome, TransferError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let step = self.config.progress_log_step;
        self.upload_observed(name, declared_total, position, source, |total, start| {
            TracingProgress::new(name, total, start, step)
        })
        .await
    }

    /// Like [`upload`](Self::upload) with a caller supplied observer.
    ///
    /// `make_observer` receives `(declared_total, start_offset)` once the
    /// session is planned; it is not called for an already complete artifact.
    pub async fn upload_observed<R, P, F>(
        &self,
        name: &str,
        declared_total: u64,
        position: SourcePosition,
        source: &mut R,
        make_observer: F,
    ) -> Result<UploadOutcome, TransferError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
        P: ProgressObserver,
        F: FnOnce(u64, u64) -> P,
    {
        if declared_total > self.config.max_file_size {
            return Err(TransferError::TooLarge {
                declared: declared_total,
                max: self.config.max_file_size,
            });
        }

        let path = self.root.resolve_upload(name)?;
        let key = self.lock_key(&path, name);

        let result = {
            let _guard = self.locks.lock(&key).await;
            self.run_session(&key, &path, declared_total, position, source, make_observer)
                .await
        };
        self.locks.cleanup();

        match &result {
            Ok(outcome) if outcome.already_complete => {
                info!("✅ {} already complete ({} bytes)", key, outcome.final_size)
            }
            Ok(outcome) => info!(
                "✅ {} stored: {} bytes written from offset {}",
                key, outcome.bytes_written, outcome.start_offset
            ),
            Err(e) => warn!("⚠️ Upload of {} failed: {}", key, e),
        }
        result
    }

    /// Reports what a new attempt would do, without creating anything.
    pub async fn status(
        &self,
        name: &str,
        declared_total: u64,
    ) -> Result<UploadStatus, TransferError> {
        let path = self.root.resolve_upload(name)?;
        let key = self.lock_key(&path, name);
        let ResumePlan {
            start_offset,
            already_complete,
        } = self.planner.probe(&key, &path, declared_total).await?;

        Ok(UploadStatus {
            name: key,
            current_size: start_offset,
            start_offset,
            already_complete,
        })
    }

    async fn run_session<R, P, F>(
        &self,
        key: &str,
        path: &Path,
        declared_total: u64,
        position: SourcePosition,
        source: &mut R,
        make_observer: F,
    ) -> Result<UploadOutcome, TransferError>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
        P: ProgressObserver,
        F: FnOnce(u64, u64) -> P,
    {
        let plan = self.planner.plan(key, path, declared_total).await?;
        let mut outcome = UploadOutcome {
            name: key.to_string(),
            declared_total,
            start_offset: plan.start_offset,
            bytes_written: 0,
            final_size: plan.start_offset,
            already_complete: plan.already_complete,
        };
        if plan.already_complete {
            return Ok(outcome);
        }

        match position {
            SourcePosition::Start => skip_source(source, plan.start_offset).await?,
            SourcePosition::Offset(provided) if provided != plan.start_offset => {
                return Err(TransferError::OffsetMismatch {
                    expected: plan.start_offset,
                    provided,
                });
            }
            SourcePosition::Offset(_) => {}
        }

        if plan.start_offset > 0 {
            info!("⏯️  Resuming {} at byte {}", key, plan.start_offset);
        }

        // Bytes past the declared total are never written.
        let mut remaining = (&mut *source).take(declared_total - plan.start_offset);
        let mut progress = make_observer(declared_total, plan.start_offset);

        let session = TransferSession::open(path, plan.start_offset).await?;
        let final_size = session
            .run(&self.executor, &mut remaining, &mut progress)
            .await?;

        if final_size != declared_total {
            return Err(TransferError::Incomplete {
                persisted: final_size,
                declared: declared_total,
            });
        }

        outcome.bytes_written = final_size - plan.start_offset;
        outcome.final_size = final_size;
        Ok(outcome)
    }

    fn lock_key(&self, path: &Path, name: &str) -> String {
        self.root
            .relative(path)
            .unwrap_or_else(|| name.to_string())
    }
}
