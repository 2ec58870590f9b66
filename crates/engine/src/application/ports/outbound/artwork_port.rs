//! Cover art generation port (best-effort side channel).

use async_trait::async_trait;

use questforge_domain::QuestId;

/// Narrative summary handed to the cover art generator.
#[derive(Debug, Clone)]
pub struct CoverArtRequest {
    pub quest_id: QuestId,
    pub title: String,
    pub synopsis: String,
    pub tags: Vec<String>,
}

/// Cover image generator. Failures never fail a generation run; the caller
/// logs and moves on, and an absent cover image is a valid displayable state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverArtPort: Send + Sync {
    /// Generate a cover image; returns an image reference (URL or asset key).
    async fn generate_cover(&self, request: CoverArtRequest) -> Result<String, CoverArtError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CoverArtError {
    #[error("Cover art generation failed: {0}")]
    GenerationFailed(String),
    #[error("Cover art service unavailable")]
    Unavailable,
}
