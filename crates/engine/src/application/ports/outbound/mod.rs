//! Outbound ports - Interfaces the application requires from external systems.

mod artwork_port;
mod dialogue_port;
mod pipeline_port;
mod quest_store_port;

pub use artwork_port::{CoverArtError, CoverArtPort, CoverArtRequest};

pub use dialogue_port::{DialogueBrief, DialogueError, DialoguePort, SceneSummary};

pub use pipeline_port::{
    CreatorPayload, GenerationInput, PipelineError, PipelineObserver, PipelineOutput,
    PipelinePort, PipelineRequest, PlayerPreview, PlotDraft, PromptSupport, MAX_SCENE_COUNT,
    MIN_SCENE_COUNT,
};

pub use quest_store_port::{
    DialogueRecord, QuestRecord, QuestStorePort, QuestSummary, SceneDetailRecord, SceneRow,
    StoreError, StoredScene,
};
