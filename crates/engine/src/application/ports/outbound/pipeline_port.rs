//! Generation pipeline port - the opaque multi-phase content generator.
//!
//! The pipeline is consumed as an async capability with a callback contract:
//! it emits progress and partial results through a [`PipelineObserver`] while
//! the overall call is in flight, then resolves with a dual final payload
//! (player preview + creator payload). Prompting and wire formats are the
//! adapter's business; nothing here knows about them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use questforge_domain::{CastMember, Difficulty, GeoPoint, MetaPuzzle, Scene};

/// Scene count bounds enforced before any request reaches the pipeline.
pub const MIN_SCENE_COUNT: u32 = 5;
pub const MAX_SCENE_COUNT: u32 = 12;

/// User-provided input for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    /// Free-text description of the experience; required, non-empty after trim
    pub prompt: String,
    pub difficulty: Difficulty,
    /// Desired stop count; clamped to [MIN_SCENE_COUNT, MAX_SCENE_COUNT]
    pub scene_count: u32,
    pub theme_tags: Vec<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub support: PromptSupport,
    /// Optional coordinate to bias scene placement around
    pub center: Option<GeoPoint>,
    /// Placement radius in km, meaningful only with `center`
    pub radius_km: Option<f64>,
}

/// Structured prompt-support fields the user may fill in instead of (or in
/// addition to) free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSupport {
    pub protagonist: Option<String>,
    pub objective: Option<String>,
    pub ending: Option<String>,
    pub when: Option<String>,
    pub r#where: Option<String>,
    pub purpose: Option<String>,
    pub with_whom: Option<String>,
}

/// Validated request handed to the pipeline capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    pub prompt: String,
    pub difficulty: Difficulty,
    pub scene_count: u32,
    pub theme_tags: Vec<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub support: PromptSupport,
    pub center: Option<GeoPoint>,
    pub radius_km: Option<f64>,
}

/// Early plot result: title, premise, and tags before any scene exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotDraft {
    pub title: String,
    pub synopsis: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Player-facing preview half of the final payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPreview {
    pub title: String,
    pub synopsis: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

/// Creator-facing half of the final payload. The pipeline may revise title
/// and tags here after all scenes are known; the reconciliation pass treats
/// these values as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorPayload {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub mission: String,
    pub prologue: String,
    pub epilogue: String,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub meta_puzzle: MetaPuzzle,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Final dual output of a pipeline run. Either half may be absent when the
/// backend misbehaves; the orchestrator treats absence as a generation
/// failure rather than trusting a partial payload.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub player_preview: Option<PlayerPreview>,
    pub creator_payload: Option<CreatorPayload>,
}

/// Callback hooks invoked while the pipeline call is in flight.
///
/// Each callback runs synchronously to completion before the next one is
/// dispatched, so status-store updates from one event are fully applied
/// before the following event is observed.
pub trait PipelineObserver: Send + Sync {
    /// Human-readable phase update; `scene_index` marks one scene as
    /// actively generating when present.
    fn on_progress(&self, phase: &str, scene_index: Option<usize>, scene_total: Option<usize>);

    /// The plot is known. May fire before any scene completes.
    fn on_plot_complete(&self, plot: PlotDraft);

    /// A scene finished. `index` is 0-based and authoritative; completions
    /// may arrive out of numeric order under pipeline retries.
    fn on_spot_complete(&self, scene: Scene, index: usize);
}

/// The generation pipeline capability.
#[async_trait]
pub trait PipelinePort: Send + Sync {
    /// Run a full generation, streaming events to `observer` until the call
    /// resolves with the final dual payload.
    async fn run(
        &self,
        request: PipelineRequest,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<PipelineOutput, PipelineError>;

    /// Regenerate a single scene in the context of an existing request.
    async fn regenerate_spot(
        &self,
        request: PipelineRequest,
        index: usize,
    ) -> Result<Scene, PipelineError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline request failed: {0}")]
    RequestFailed(String),
    #[error("Pipeline timed out after {0}s")]
    Timeout(u64),
    #[error("Invalid pipeline response: {0}")]
    InvalidResponse(String),
}
