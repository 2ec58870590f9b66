//! Service-level error taxonomy.

use thiserror::Error;

use crate::application::ports::outbound::{PipelineError, StoreError};

/// Errors surfaced by the orchestration and persistence services.
///
/// Auxiliary generation (cover art, dialogue) never produces one of these;
/// its failures are logged inside the spawned tasks and swallowed.
#[derive(Debug, Error, Clone)]
pub enum QuestError {
    /// Malformed or empty generation request; never reaches the pipeline.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Pipeline call rejected, timed out, or returned an incomplete payload.
    /// All in-flight section statuses are cleared before this surfaces.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A store write failed. The save is reported as failed as a whole; the
    /// in-memory draft is untouched and retrying is safe.
    #[error("Save failed: {0}")]
    Persistence(String),
}

impl QuestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

impl From<PipelineError> for QuestError {
    fn from(err: PipelineError) -> Self {
        Self::Generation(err.to_string())
    }
}

impl From<StoreError> for QuestError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}
