//! Scene dialogue generation port (best-effort side channel).

use async_trait::async_trait;

use questforge_domain::{CastMember, DialogueLine, NarrativeRole};

/// Ordered scene summary handed to the dialogue generator.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    /// 1-based order index within the quest
    pub order_index: u32,
    pub name: String,
    pub role: NarrativeRole,
    pub puzzle_prompt: String,
    pub next_hook: String,
}

/// Everything the dialogue generator needs: the narrative frame plus the
/// full ordered scene list. Callers skip dialogue silently when either is
/// missing; it is derivative content, not a precondition of anything.
#[derive(Debug, Clone)]
pub struct DialogueBrief {
    pub prologue: String,
    pub epilogue: String,
    pub cast: Vec<CastMember>,
    pub scenes: Vec<SceneSummary>,
}

/// Dialogue generator returning per-scene pre/post puzzle line lists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DialoguePort: Send + Sync {
    async fn generate_dialogue(
        &self,
        brief: DialogueBrief,
    ) -> Result<Vec<DialogueLine>, DialogueError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DialogueError {
    #[error("Dialogue generation failed: {0}")]
    GenerationFailed(String),
    #[error("Dialogue service unavailable")]
    Unavailable,
}
