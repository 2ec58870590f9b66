//! QuestForge domain crate.
//!
//! Pure domain types for walking mystery quests: the quest draft aggregate,
//! scenes with puzzles and rewards, dialogue, the narrative timeline, and the
//! route geometry functions derived from an ordered scene list. No I/O and no
//! async here; adapters live in the engine crate.

pub mod entities;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod value_objects;

pub use entities::{
    CastMember, DialogueLine, MetaPuzzle, NarrativeTimeline, Puzzle, QuestDraft, Reward, Scene,
};
pub use error::DomainError;
pub use geometry::{climax_indices, distance, route_metrics, walking_minutes, RouteMetrics};
pub use ids::{DialogueLineId, QuestId, SceneId, SceneRecordId};
pub use value_objects::{Difficulty, DialogueStage, GeoPoint, NarrativeRole, SpeakerType};
