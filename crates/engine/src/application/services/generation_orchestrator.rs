//! Generation Orchestrator - owns the generation request lifecycle.
//!
//! Builds a pipeline request from user input, consumes the stream of
//! progress and partial-result callbacks, keeps the draft and the section
//! status store in sync, runs the reconciliation pass over the final dual
//! payload, and fires cover art and dialogue generation as best-effort
//! side work. The primary phases are all-or-nothing: any pipeline failure
//! discards partial scenes and clears every section status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use questforge_domain::{
    Difficulty, NarrativeTimeline, QuestDraft, Scene,
};

use crate::application::error::QuestError;
use crate::application::ports::outbound::{
    CoverArtPort, CoverArtRequest, DialogueBrief, DialoguePort, GenerationInput, PipelineObserver,
    PipelinePort, PipelineRequest, PlotDraft, SceneSummary, MAX_SCENE_COUNT, MIN_SCENE_COUNT,
};
use crate::application::services::SectionStatusStore;
use crate::domain::value_objects::{SectionId, SectionStatus};

/// Editable slice of the draft behind the `basic-info` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicInfoEdit {
    title: String,
    synopsis: String,
    area: String,
    difficulty: Difficulty,
    tags: Vec<String>,
    mission: String,
}

/// Orchestrates one draft's generation lifecycle.
///
/// Constructed with its draft and section store injected so multiple drafts
/// (and tests) run in isolation. The draft and the store are mutated only
/// here (on pipeline events) and via the edit commands; the persistence
/// mapper reads but never writes them.
pub struct GenerationOrchestrator {
    draft: Arc<Mutex<QuestDraft>>,
    sections: Arc<SectionStatusStore>,
    pipeline: Arc<dyn PipelinePort>,
    cover_art: Arc<dyn CoverArtPort>,
    dialogue: Arc<dyn DialoguePort>,
    /// Re-entrancy guard: a second generate() while one is in flight would
    /// race the first run's callbacks with the second run's resets.
    in_flight: AtomicBool,
    phase: Arc<Mutex<String>>,
    /// Request of the last successful-or-running primary call, kept for
    /// single-scene regeneration context.
    last_request: Mutex<Option<PipelineRequest>>,
    aux_tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GenerationOrchestrator {
    pub fn new(
        draft: Arc<Mutex<QuestDraft>>,
        sections: Arc<SectionStatusStore>,
        pipeline: Arc<dyn PipelinePort>,
        cover_art: Arc<dyn CoverArtPort>,
        dialogue: Arc<dyn DialoguePort>,
    ) -> Self {
        Self {
            draft,
            sections,
            pipeline,
            cover_art,
            dialogue,
            in_flight: AtomicBool::new(false),
            phase: Arc::new(Mutex::new(String::new())),
            last_request: Mutex::new(None),
            aux_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Current human-readable phase label.
    pub fn phase(&self) -> String {
        lock(&self.phase).clone()
    }

    /// Run a full generation for this draft.
    ///
    /// Validates the input, resets all child collections, streams pipeline
    /// events into the draft and section store, reconciles the final
    /// payload, and fires auxiliary generation. Returns once the primary
    /// phases are done; auxiliary work continues in the background.
    pub async fn generate(&self, input: GenerationInput) -> Result<(), QuestError> {
        let prompt = input.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestError::validation("prompt must not be empty"));
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(QuestError::validation("generation already in progress"));
        }
        let result = self.run_primary(prompt, input).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_primary(&self, prompt: String, input: GenerationInput) -> Result<(), QuestError> {
        let request = PipelineRequest {
            prompt,
            difficulty: input.difficulty,
            scene_count: input.scene_count.clamp(MIN_SCENE_COUNT, MAX_SCENE_COUNT),
            theme_tags: input.theme_tags,
            genre: input.genre,
            tone: input.tone,
            support: input.support,
            center: input.center,
            radius_km: input.radius_km,
        };

        {
            let mut draft = lock(&self.draft);
            draft.reset_children();
            draft.difficulty = request.difficulty;
            tracing::info!(quest_id = %draft.id, scene_count = request.scene_count, "Starting generation run");
        }
        self.sections.clear();
        // Every section the run will produce starts out pending, so the
        // workspace can render the full skeleton before the first event.
        self.sections.set_status(SectionId::BasicInfo, SectionStatus::Pending);
        self.sections.set_status(SectionId::Story, SectionStatus::Pending);
        for index in 0..request.scene_count as usize {
            self.sections.set_status(SectionId::Spot(index), SectionStatus::Pending);
        }
        lock(&self.phase).clear();
        *lock(&self.last_request) = Some(request.clone());

        let observer: Arc<dyn PipelineObserver> = Arc::new(DraftObserver {
            draft: self.draft.clone(),
            sections: self.sections.clone(),
            phase: self.phase.clone(),
        });

        let output = match self.pipeline.run(request, observer).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Pipeline run failed: {}", e);
                self.abort_run();
                return Err(e.into());
            }
        };

        let (preview, payload) = match (output.player_preview, output.creator_payload) {
            (Some(preview), Some(payload)) => (preview, payload),
            _ => {
                tracing::error!("Pipeline resolved without both final payload halves");
                self.abort_run();
                return Err(QuestError::generation(
                    "pipeline returned an incomplete final payload",
                ));
            }
        };

        // Reconciliation pass: the final payload may revise basic info now
        // that all scenes are known.
        {
            let mut draft = lock(&self.draft);
            draft.title = payload.title;
            draft.synopsis = preview.synopsis;
            draft.tags = payload.tags;
            draft.highlights = preview.highlights;
            draft.area = payload.area;
            draft.mission = payload.mission;
            draft.warnings.extend(payload.warnings);
            draft.timeline = Some(NarrativeTimeline {
                prologue: payload.prologue,
                epilogue: payload.epilogue,
                cast: payload.cast,
                meta_puzzle: payload.meta_puzzle,
            });
            tracing::info!(quest_id = %draft.id, scenes = draft.scenes.len(), "Generation run reconciled");
        }
        self.sections.set_status(SectionId::BasicInfo, SectionStatus::Ready);
        self.sections.set_status(SectionId::Story, SectionStatus::Ready);

        self.start_auxiliary();
        Ok(())
    }

    /// Discard partial results of a failed primary run: the workspace shows
    /// nothing rather than a stale partial state.
    fn abort_run(&self) {
        lock(&self.draft).reset_children();
        self.sections.clear();
        lock(&self.phase).clear();
    }

    /// Regenerate a single scene in place. Sibling sections are untouched
    /// whether this succeeds or fails.
    pub async fn regenerate_scene(&self, index: usize) -> Result<(), QuestError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(QuestError::validation("generation already in progress"));
        }
        let result = self.run_regenerate(index).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_regenerate(&self, index: usize) -> Result<(), QuestError> {
        let request = lock(&self.last_request)
            .clone()
            .ok_or_else(|| QuestError::validation("no generation run to regenerate from"))?;
        {
            let draft = lock(&self.draft);
            if index >= draft.scenes.len() {
                return Err(QuestError::validation(format!("no scene at index {}", index)));
            }
        }

        self.sections.set_status(SectionId::Spot(index), SectionStatus::Generating);
        match self.pipeline.regenerate_spot(request, index).await {
            Ok(scene) => {
                lock(&self.draft).put_scene(index, scene);
                self.sections.set_status(SectionId::Spot(index), SectionStatus::Ready);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(index, "Scene regeneration failed: {}", e);
                self.sections.set_error(SectionId::Spot(index), e.to_string());
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Auxiliary generation (best-effort, non-blocking)
    // =========================================================================

    /// Fire cover art and dialogue generation. Failure of either is logged
    /// and swallowed; no section status moves on their account.
    fn start_auxiliary(&self) {
        let cover_request = {
            let draft = lock(&self.draft);
            CoverArtRequest {
                quest_id: draft.id,
                title: draft.title.clone(),
                synopsis: draft.synopsis.clone(),
                tags: draft.tags.clone(),
            }
        };

        let cover_port = self.cover_art.clone();
        let cover_draft = self.draft.clone();
        let cover_task = tokio::spawn(async move {
            match cover_port.generate_cover(cover_request).await {
                Ok(image) => {
                    lock(&cover_draft).cover_image = Some(image);
                }
                Err(e) => tracing::warn!("Cover art generation failed: {}", e),
            }
        });

        // Dialogue requires the final narrative plus all scenes; when either
        // is missing it is skipped silently, not an error.
        let brief = {
            let draft = lock(&self.draft);
            match (&draft.timeline, draft.scenes.is_empty()) {
                (Some(timeline), false) => Some(DialogueBrief {
                    prologue: timeline.prologue.clone(),
                    epilogue: timeline.epilogue.clone(),
                    cast: timeline.cast.clone(),
                    scenes: draft
                        .scenes
                        .iter()
                        .enumerate()
                        .map(|(i, s)| SceneSummary {
                            order_index: i as u32 + 1,
                            name: s.name.clone(),
                            role: s.role,
                            puzzle_prompt: s.puzzle.prompt.clone(),
                            next_hook: s.reward.next_hook.clone(),
                        })
                        .collect(),
                }),
                _ => None,
            }
        };

        let mut tasks = vec![cover_task];
        match brief {
            Some(brief) => {
                let dialogue_port = self.dialogue.clone();
                let dialogue_draft = self.draft.clone();
                tasks.push(tokio::spawn(async move {
                    match dialogue_port.generate_dialogue(brief).await {
                        Ok(lines) => {
                            lock(&dialogue_draft).dialogue = lines;
                        }
                        Err(e) => tracing::warn!("Dialogue generation failed: {}", e),
                    }
                }));
            }
            None => tracing::debug!("Skipping dialogue generation: narrative or scenes missing"),
        }

        lock(&self.aux_tasks).extend(tasks);
    }

    /// Wait for any in-flight auxiliary tasks. The save path tolerates
    /// running before or after these finish; this exists for callers that
    /// want the cover image and dialogue included in the save.
    pub async fn wait_for_auxiliary(&self) {
        let tasks: Vec<_> = lock(&self.aux_tasks).drain(..).collect();
        for result in futures_util::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::warn!("Auxiliary task panicked: {}", e);
            }
        }
    }

    // =========================================================================
    // Edit commands (the editing surface's only write path into the draft)
    // =========================================================================

    /// Snapshot the section's draft sub-object into an edit scratch copy.
    pub fn start_edit(&self, id: SectionId) -> Result<(), QuestError> {
        let scratch = {
            let draft = lock(&self.draft);
            match id {
                SectionId::BasicInfo => serde_json::to_value(BasicInfoEdit {
                    title: draft.title.clone(),
                    synopsis: draft.synopsis.clone(),
                    area: draft.area.clone(),
                    difficulty: draft.difficulty,
                    tags: draft.tags.clone(),
                    mission: draft.mission.clone(),
                }),
                SectionId::Story => serde_json::to_value(draft.timeline.clone().ok_or_else(
                    || QuestError::validation("no story to edit yet"),
                )?),
                SectionId::Spot(index) => {
                    let scene = draft.scenes.get(index).ok_or_else(|| {
                        QuestError::validation(format!("no scene at index {}", index))
                    })?;
                    serde_json::to_value(scene.clone())
                }
            }
            .map_err(|e| QuestError::validation(e.to_string()))?
        };

        if self.sections.start_edit(id, scratch) {
            Ok(())
        } else {
            Err(QuestError::validation(format!(
                "section {} is not ready for editing",
                id
            )))
        }
    }

    /// Replace the scratch copy while editing (live form state).
    pub fn update_edit(&self, id: SectionId, scratch: serde_json::Value) -> Result<(), QuestError> {
        if self.sections.update_scratch(id, scratch) {
            Ok(())
        } else {
            Err(QuestError::validation(format!("section {} is not being edited", id)))
        }
    }

    /// Discard the scratch copy and return the section to ready.
    pub fn cancel_edit(&self, id: SectionId) {
        self.sections.cancel_edit(id);
    }

    /// Merge the scratch copy back into the draft and return to ready.
    pub fn commit_edit(&self, id: SectionId) -> Result<(), QuestError> {
        let scratch = self
            .sections
            .commit_edit(id)
            .ok_or_else(|| QuestError::validation(format!("section {} is not being edited", id)))?;

        let mut draft = lock(&self.draft);
        match id {
            SectionId::BasicInfo => {
                let edit: BasicInfoEdit = serde_json::from_value(scratch)
                    .map_err(|e| QuestError::validation(e.to_string()))?;
                draft.title = edit.title;
                draft.synopsis = edit.synopsis;
                draft.area = edit.area;
                draft.difficulty = edit.difficulty;
                draft.tags = edit.tags;
                draft.mission = edit.mission;
            }
            SectionId::Story => {
                let timeline: NarrativeTimeline = serde_json::from_value(scratch)
                    .map_err(|e| QuestError::validation(e.to_string()))?;
                draft.timeline = Some(timeline);
            }
            SectionId::Spot(index) => {
                let scene: Scene = serde_json::from_value(scratch)
                    .map_err(|e| QuestError::validation(e.to_string()))?;
                draft.put_scene(index, scene);
            }
        }
        Ok(())
    }
}

/// Observer bridging pipeline callbacks onto the draft and section store.
///
/// Each callback runs synchronously to completion, so one event's updates
/// are fully applied before the next event is processed.
struct DraftObserver {
    draft: Arc<Mutex<QuestDraft>>,
    sections: Arc<SectionStatusStore>,
    phase: Arc<Mutex<String>>,
}

impl PipelineObserver for DraftObserver {
    fn on_progress(&self, phase: &str, scene_index: Option<usize>, scene_total: Option<usize>) {
        tracing::debug!(phase, ?scene_index, ?scene_total, "Pipeline progress");
        *lock(&self.phase) = phase.to_string();
        if let Some(index) = scene_index {
            self.sections.set_status(SectionId::Spot(index), SectionStatus::Generating);
        }
    }

    fn on_plot_complete(&self, plot: PlotDraft) {
        let mut draft = lock(&self.draft);
        draft.title = plot.title;
        draft.synopsis = plot.synopsis;
        draft.tags = plot.tags;
        draft.warnings.extend(plot.warnings);
        drop(draft);
        // A titled draft with zero scenes is a valid intermediate state.
        self.sections.set_status(SectionId::BasicInfo, SectionStatus::Ready);
    }

    fn on_spot_complete(&self, scene: Scene, index: usize) {
        lock(&self.draft).put_scene(index, scene);
        self.sections.set_status(SectionId::Spot(index), SectionStatus::Ready);
    }
}
