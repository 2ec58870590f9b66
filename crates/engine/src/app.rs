//! Application composition root.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use questforge_domain::{QuestDraft, QuestId};

use crate::application::error::QuestError;
use crate::application::ports::outbound::{
    CoverArtPort, DialoguePort, PipelinePort, QuestStorePort,
};
use crate::application::services::{GenerationOrchestrator, PersistenceMapper, SectionStatusStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One draft being generated and edited: the draft itself, its section
/// state, and the orchestrator driving both.
pub struct DraftSession {
    pub draft: Arc<Mutex<QuestDraft>>,
    pub sections: Arc<SectionStatusStore>,
    pub orchestrator: GenerationOrchestrator,
}

/// Wires adapters to services and opens draft sessions.
pub struct App {
    pipeline: Arc<dyn PipelinePort>,
    cover_art: Arc<dyn CoverArtPort>,
    dialogue: Arc<dyn DialoguePort>,
    mapper: PersistenceMapper,
}

impl App {
    pub fn new(
        pipeline: Arc<dyn PipelinePort>,
        cover_art: Arc<dyn CoverArtPort>,
        dialogue: Arc<dyn DialoguePort>,
        store: Arc<dyn QuestStorePort>,
    ) -> Self {
        Self {
            pipeline,
            cover_art,
            dialogue,
            mapper: PersistenceMapper::new(store),
        }
    }

    /// Open a session around a fresh draft. The quest id is minted here and
    /// survives regeneration, so every save targets the same row.
    pub fn open_session(&self) -> DraftSession {
        self.session_for(QuestDraft::new(QuestId::new()))
    }

    /// Open a session around a previously saved quest.
    pub async fn resume_session(&self, quest_id: QuestId) -> Result<DraftSession, QuestError> {
        let draft = self.mapper.load(quest_id).await?;
        Ok(self.session_for(draft))
    }

    fn session_for(&self, draft: QuestDraft) -> DraftSession {
        let draft = Arc::new(Mutex::new(draft));
        let sections = Arc::new(SectionStatusStore::new());
        let orchestrator = GenerationOrchestrator::new(
            draft.clone(),
            sections.clone(),
            self.pipeline.clone(),
            self.cover_art.clone(),
            self.dialogue.clone(),
        );
        DraftSession {
            draft,
            sections,
            orchestrator,
        }
    }

    /// Save a session's draft, snapshotting it under the lock first.
    pub async fn save_session(&self, session: &DraftSession) -> Result<QuestId, QuestError> {
        let snapshot = lock(&session.draft).clone();
        self.mapper.save(&snapshot).await
    }

    pub fn mapper(&self) -> &PersistenceMapper {
        &self.mapper
    }
}
