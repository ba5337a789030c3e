use super::error::{ArtifactOp, TransferError};
use super::progress::ProgressObserver;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Copies an upload stream into an artifact one bounded chunk at a time.
#[derive(Debug, Clone, Copy)]
pub struct TransferExecutor {
    buffer_size: usize,
}

impl TransferExecutor {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Streams `source` into `sink` until the source is exhausted.
    ///
    /// Both ends must already sit at the session's start offset. Each chunk is
    /// written and flushed as a unit before `progress` hears about it, so after
    /// a failure the sink holds every acknowledged chunk plus at most one
    /// partially written buffer. Returns the number of bytes copied.
    pub async fn execute<R, W, P>(
        &self,
        sink: &mut W,
        source: &mut R,
        progress: &mut P,
    ) -> Result<u64, TransferError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
        P: ProgressObserver + ?Sized,
    {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut copied: u64 = 0;

        loop {
            let n = match source.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransferError::SourceIo { copied, source: e }),
            };

            sink.write_all(&buffer[..n])
                .await
                .map_err(TransferError::artifact(ArtifactOp::Write))?;
            sink.flush()
                .await
                .map_err(TransferError::artifact(ArtifactOp::Flush))?;

            copied += n as u64;
            progress.advance(n as u64);
        }

        Ok(copied)
    }
}

/// Discards the first `n` bytes of a stream that cannot seek.
///
/// Used when a client re-sends a whole payload and the artifact already holds
/// its beginning.
pub async fn skip_source<R>(source: &mut R, n: u64) -> Result<(), TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if n == 0 {
        return Ok(());
    }
    let mut prefix = (&mut *source).take(n);
    let skipped = tokio::io::copy(&mut prefix, &mut tokio::io::sink())
        .await
        .map_err(|e| TransferError::SourceIo {
            copied: 0,
            source: e,
        })?;

    if skipped < n {
        return Err(TransferError::SourceIo {
            copied: 0,
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {skipped} bytes while skipping to offset {n}"),
            ),
        });
    }
    Ok(())
}
