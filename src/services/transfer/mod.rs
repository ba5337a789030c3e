//! Resumable transfer core.
//!
//! A [`ResumePlanner`] looks at what is already on disk for a name and decides
//! where the next attempt starts. A [`TransferSession`] opens the artifact at
//! that offset and drives a [`TransferExecutor`], which copies the remaining
//! bytes chunk by chunk and reports each chunk to a [`ProgressObserver`].
//!
//! The planner and executor never log, retry, or lock. Callers serialize
//! sessions per name and decide what a failure means for the client.

pub mod error;
pub mod executor;
pub mod planner;
pub mod progress;
pub mod session;

pub use error::{ArtifactOp, TransferError};
pub use executor::{TransferExecutor, skip_source};
pub use planner::{ResumePlan, ResumePlanner};
pub use progress::{
    CallbackProgress, NoProgress, ProgressObserver, ProgressState, TracingProgress, format_size,
    render_bar,
};
pub use session::TransferSession;
