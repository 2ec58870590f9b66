//! Relational quest store port.
//!
//! Table-like collections for quest, scene, scene detail, narrative timeline,
//! and dialogue line, each supporting upsert-by-id, delete-by-parent-id, and
//! select-by-parent-id-ordered. The store is the sole source of truth for
//! child foreign keys: scene rows get store-assigned ids on insert, and the
//! mapper re-reads them by `order_index` before writing any child row.

use async_trait::async_trait;

use questforge_domain::{
    DialogueStage, Difficulty, GeoPoint, NarrativeRole, NarrativeTimeline, QuestId, SceneRecordId,
    SpeakerType,
};

/// Root quest row.
#[derive(Debug, Clone)]
pub struct QuestRecord {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub area: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub difficulty: Difficulty,
    /// Lifecycle status label; drafts save as "draft"
    pub status: String,
}

/// Scene row as written by the mapper. Carries no id: the store assigns one
/// on insert, and `order_index` (1-based, dense) is the only ordering key.
#[derive(Debug, Clone)]
pub struct SceneRow {
    pub order_index: u32,
    pub name: String,
    pub address: String,
    pub position: GeoPoint,
    pub place_ref: Option<String>,
    pub role: NarrativeRole,
}

/// Scene row as read back from the store, with its assigned id.
#[derive(Debug, Clone)]
pub struct StoredScene {
    pub record_id: SceneRecordId,
    pub row: SceneRow,
}

/// Per-scene detail row keyed by the store-assigned scene id.
#[derive(Debug, Clone, Default)]
pub struct SceneDetailRecord {
    pub navigation_text: String,
    pub narrative_text: String,
    pub puzzle_kind: String,
    pub puzzle_prompt: String,
    pub hints: Vec<String>,
    pub answer: String,
    pub solution_steps: Vec<String>,
    pub next_hook: String,
    pub lore_reveal: String,
    pub plot_key: String,
}

/// Dialogue row carrying its scene's store-assigned id.
#[derive(Debug, Clone)]
pub struct DialogueRecord {
    pub scene_id: SceneRecordId,
    pub stage: DialogueStage,
    pub order: u32,
    pub speaker: SpeakerType,
    pub speaker_name: String,
    pub text: String,
}

/// Listing row for the editing surface.
#[derive(Debug, Clone)]
pub struct QuestSummary {
    pub id: QuestId,
    pub title: String,
    pub area: String,
    pub difficulty: Difficulty,
    pub status: String,
    pub scene_count: u32,
}

/// The relational store behind the persistence mapper.
#[async_trait]
pub trait QuestStorePort: Send + Sync {
    // Quest root
    async fn upsert_quest(&self, quest: &QuestRecord) -> Result<(), StoreError>;
    async fn get_quest(&self, id: QuestId) -> Result<Option<QuestRecord>, StoreError>;
    async fn list_quests(&self) -> Result<Vec<QuestSummary>, StoreError>;
    /// Delete the quest and every child row (scenes, details, timeline,
    /// dialogue).
    async fn delete_quest(&self, id: QuestId) -> Result<(), StoreError>;

    // Scenes
    /// Delete all scene rows for the quest, then insert `rows`, assigning a
    /// fresh record id per row.
    async fn replace_scenes(&self, quest_id: QuestId, rows: &[SceneRow]) -> Result<(), StoreError>;
    /// All scene rows for the quest ordered by `order_index` ascending.
    async fn scenes_for_quest(&self, quest_id: QuestId) -> Result<Vec<StoredScene>, StoreError>;

    // Scene details
    async fn upsert_scene_detail(
        &self,
        scene_id: SceneRecordId,
        detail: &SceneDetailRecord,
    ) -> Result<(), StoreError>;
    async fn detail_for_scene(
        &self,
        scene_id: SceneRecordId,
    ) -> Result<Option<SceneDetailRecord>, StoreError>;

    // Narrative timeline
    async fn upsert_timeline(
        &self,
        quest_id: QuestId,
        timeline: &NarrativeTimeline,
    ) -> Result<(), StoreError>;
    async fn timeline_for_quest(
        &self,
        quest_id: QuestId,
    ) -> Result<Option<NarrativeTimeline>, StoreError>;

    // Dialogue
    async fn delete_dialogue_for_scenes(
        &self,
        scene_ids: &[SceneRecordId],
    ) -> Result<(), StoreError>;
    async fn insert_dialogue(&self, rows: &[DialogueRecord]) -> Result<(), StoreError>;
    /// Lines for the given scenes, ordered by stage then line order.
    async fn dialogue_for_scenes(
        &self,
        scene_ids: &[SceneRecordId],
    ) -> Result<Vec<DialogueRecord>, StoreError>;
}

/// Store operation errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization of a JSON column failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}
