use super::error::{ArtifactOp, TransferError};
use super::executor::TransferExecutor;
use super::progress::ProgressObserver;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeekExt};

/// One upload attempt against one artifact.
///
/// Owns the sink handle for its whole life; the handle is closed when the
/// session is consumed by [`run`](Self::run) or dropped, on every path.
#[derive(Debug)]
pub struct TransferSession {
    sink: File,
    start_offset: u64,
}

impl TransferSession {
    /// Opens the artifact for writing positioned at `start_offset`.
    pub async fn open(path: &Path, start_offset: u64) -> Result<Self, TransferError> {
        let mut sink = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(TransferError::artifact(ArtifactOp::Open))?;
        sink.seek(SeekFrom::Start(start_offset))
            .await
            .map_err(TransferError::artifact(ArtifactOp::Seek))?;

        Ok(Self { sink, start_offset })
    }

    /// Runs the copy and returns the artifact's size once the stream ends.
    pub async fn run<R, P>(
        mut self,
        executor: &TransferExecutor,
        source: &mut R,
        progress: &mut P,
    ) -> Result<u64, TransferError>
    where
        R: AsyncRead + Unpin + ?Sized,
        P: ProgressObserver + ?Sized,
    {
        let copied = executor.execute(&mut self.sink, source, progress).await?;
        let size = self
            .sink
            .metadata()
            .await
            .map_err(TransferError::artifact(ArtifactOp::Stat))?
            .len();

        let expected = self.start_offset + copied;
        if size != expected {
            return Err(TransferError::ArtifactIo {
                op: ArtifactOp::Stat,
                source: io::Error::other(format!(
                    "artifact is {size} bytes after the session, expected {expected}"
                )),
            });
        }
        Ok(size)
    }
}
