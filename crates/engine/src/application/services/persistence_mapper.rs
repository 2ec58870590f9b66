//! Persistence Mapper - ordered, referentially-consistent draft saves.
//!
//! Converts the in-memory draft into normalized rows: upsert the quest root,
//! replace the scene collection with dense 1-based order indices, re-read the
//! store-assigned scene ids, then write details, timeline, and dialogue
//! against those ids. Client-side temporary scene ids are never trusted as
//! foreign keys. Steps run strictly in order with no compensating rollback;
//! a failed save can leave root+scenes committed with stale details, which is
//! accepted because every step is upsert-or-replace and retrying is safe.

use std::collections::HashMap;
use std::sync::Arc;

use questforge_domain::{
    DialogueLine, Puzzle, QuestDraft, QuestId, Reward, Scene, SceneRecordId,
};

use crate::application::error::QuestError;
use crate::application::ports::outbound::{
    DialogueRecord, QuestRecord, QuestStorePort, QuestSummary, SceneDetailRecord, SceneRow,
};

/// Maps drafts to and from the relational store.
pub struct PersistenceMapper {
    store: Arc<dyn QuestStorePort>,
}

impl PersistenceMapper {
    pub fn new(store: Arc<dyn QuestStorePort>) -> Self {
        Self { store }
    }

    /// Save the draft. Returns the persisted quest id.
    ///
    /// The in-memory draft is never mutated here, so a failed save is
    /// retried by simply calling again.
    pub async fn save(&self, draft: &QuestDraft) -> Result<QuestId, QuestError> {
        let quest_id = draft.id;
        tracing::info!(%quest_id, scenes = draft.scenes.len(), "Saving quest draft");

        // 1. Quest root.
        self.store
            .upsert_quest(&QuestRecord {
                id: quest_id,
                title: draft.title.clone(),
                description: draft.synopsis.clone(),
                area: draft.area.clone(),
                tags: draft.tags.clone(),
                cover_image: draft.cover_image.clone(),
                difficulty: draft.difficulty,
                status: "draft".to_string(),
            })
            .await?;

        // 2. Replace the scene collection; positions are never left sparse.
        let rows: Vec<SceneRow> = draft
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| SceneRow {
                order_index: i as u32 + 1,
                name: scene.name.clone(),
                address: scene.address.clone(),
                position: scene.position,
                place_ref: scene.place_ref.clone(),
                role: scene.role,
            })
            .collect();
        self.store.replace_scenes(quest_id, &rows).await?;

        // 3. Re-read for store-assigned ids; the store is the sole source of
        // truth for child foreign keys.
        let stored = self.store.scenes_for_quest(quest_id).await?;
        let id_by_order: HashMap<u32, SceneRecordId> = stored
            .iter()
            .map(|s| (s.row.order_index, s.record_id))
            .collect();

        // 4. Per-scene details keyed by store id.
        for (i, scene) in draft.scenes.iter().enumerate() {
            let order_index = i as u32 + 1;
            let Some(&scene_id) = id_by_order.get(&order_index) else {
                return Err(QuestError::persistence(format!(
                    "store returned no scene row for order index {}",
                    order_index
                )));
            };
            self.store
                .upsert_scene_detail(
                    scene_id,
                    &SceneDetailRecord {
                        navigation_text: scene.rationale.clone(),
                        narrative_text: scene.handout.clone(),
                        puzzle_kind: scene.puzzle.kind.clone(),
                        puzzle_prompt: scene.puzzle.prompt.clone(),
                        hints: scene.puzzle.hints.clone(),
                        answer: scene.puzzle.answer.clone(),
                        solution_steps: scene.puzzle.solution_steps.clone(),
                        next_hook: scene.reward.next_hook.clone(),
                        lore_reveal: scene.reward.lore_reveal.clone(),
                        plot_key: scene.reward.plot_key.clone(),
                    },
                )
                .await?;
        }

        // 5. Narrative timeline (one per quest, upserted).
        match &draft.timeline {
            Some(timeline) => self.store.upsert_timeline(quest_id, timeline).await?,
            None => tracing::debug!(%quest_id, "No narrative timeline on draft, skipping"),
        }

        // 6-7. Dialogue: full replace when present, silent skip when absent.
        if draft.dialogue.is_empty() {
            tracing::debug!(%quest_id, "No dialogue on draft, skipping");
        } else {
            let scene_ids: Vec<SceneRecordId> = stored.iter().map(|s| s.record_id).collect();
            self.store.delete_dialogue_for_scenes(&scene_ids).await?;

            let mut records = Vec::with_capacity(draft.dialogue.len());
            for line in &draft.dialogue {
                let Some(&scene_id) = id_by_order.get(&line.scene_order) else {
                    tracing::warn!(
                        scene_order = line.scene_order,
                        "Dropping dialogue line for unknown scene order"
                    );
                    continue;
                };
                records.push(DialogueRecord {
                    scene_id,
                    stage: line.stage,
                    order: line.order,
                    speaker: line.speaker,
                    speaker_name: line.speaker_name.clone(),
                    text: line.text.clone(),
                });
            }
            self.store.insert_dialogue(&records).await?;
        }

        tracing::info!(%quest_id, "Quest draft saved");
        Ok(quest_id)
    }

    /// Reconstitute a draft from the store for the editing surface.
    pub async fn load(&self, quest_id: QuestId) -> Result<QuestDraft, QuestError> {
        let quest = self
            .store
            .get_quest(quest_id)
            .await?
            .ok_or_else(|| QuestError::persistence(format!("quest {} not found", quest_id)))?;

        let mut draft = QuestDraft::new(quest_id);
        draft.title = quest.title;
        draft.synopsis = quest.description;
        draft.area = quest.area;
        draft.tags = quest.tags;
        draft.cover_image = quest.cover_image;
        draft.difficulty = quest.difficulty;

        let stored = self.store.scenes_for_quest(quest_id).await?;
        let mut order_by_id: HashMap<SceneRecordId, u32> = HashMap::new();
        for s in &stored {
            order_by_id.insert(s.record_id, s.row.order_index);

            let detail = self
                .store
                .detail_for_scene(s.record_id)
                .await?
                .unwrap_or_default();

            let mut scene = Scene::new(s.row.name.clone(), s.row.position)
                .with_role(s.row.role)
                .with_address(s.row.address.clone());
            scene.place_ref = s.row.place_ref.clone();
            scene.rationale = detail.navigation_text;
            scene.handout = detail.narrative_text;
            scene.puzzle = Puzzle {
                kind: detail.puzzle_kind,
                prompt: detail.puzzle_prompt,
                hints: detail.hints,
                answer: detail.answer,
                solution_steps: detail.solution_steps,
            };
            scene.reward = Reward {
                next_hook: detail.next_hook,
                lore_reveal: detail.lore_reveal,
                plot_key: detail.plot_key,
            };
            draft.scenes.push(scene);
        }

        draft.timeline = self.store.timeline_for_quest(quest_id).await?;

        let scene_ids: Vec<SceneRecordId> = stored.iter().map(|s| s.record_id).collect();
        for record in self.store.dialogue_for_scenes(&scene_ids).await? {
            let Some(&scene_order) = order_by_id.get(&record.scene_id) else {
                continue;
            };
            draft.dialogue.push(DialogueLine::new(
                scene_order,
                record.stage,
                record.order,
                record.speaker,
                record.speaker_name,
                record.text,
            ));
        }

        Ok(draft)
    }

    /// Remove the quest and every child row.
    pub async fn delete(&self, quest_id: QuestId) -> Result<(), QuestError> {
        self.store.delete_quest(quest_id).await?;
        tracing::info!(%quest_id, "Quest deleted");
        Ok(())
    }

    /// Quest summaries for the listing surface.
    pub async fn list(&self) -> Result<Vec<QuestSummary>, QuestError> {
        Ok(self.store.list_quests().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use questforge_domain::{
        DialogueStage, GeoPoint, NarrativeRole, NarrativeTimeline, SpeakerType,
    };

    use crate::application::ports::outbound::{StoreError, StoredScene};

    /// In-memory stand-in for the relational store, mirroring its
    /// upsert/replace/select-ordered contract.
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryTables>,
        fail_on_detail: bool,
    }

    #[derive(Default)]
    struct MemoryTables {
        quests: HashMap<QuestId, QuestRecord>,
        scenes: HashMap<QuestId, Vec<StoredScene>>,
        details: HashMap<SceneRecordId, SceneDetailRecord>,
        timelines: HashMap<QuestId, NarrativeTimeline>,
        dialogue: Vec<DialogueRecord>,
    }

    #[async_trait]
    impl QuestStorePort for MemoryStore {
        async fn upsert_quest(&self, quest: &QuestRecord) -> Result<(), StoreError> {
            self.inner
                .lock()
                .expect("tables")
                .quests
                .insert(quest.id, quest.clone());
            Ok(())
        }

        async fn get_quest(&self, id: QuestId) -> Result<Option<QuestRecord>, StoreError> {
            Ok(self.inner.lock().expect("tables").quests.get(&id).cloned())
        }

        async fn list_quests(&self) -> Result<Vec<QuestSummary>, StoreError> {
            let tables = self.inner.lock().expect("tables");
            Ok(tables
                .quests
                .values()
                .map(|q| QuestSummary {
                    id: q.id,
                    title: q.title.clone(),
                    area: q.area.clone(),
                    difficulty: q.difficulty,
                    status: q.status.clone(),
                    scene_count: tables.scenes.get(&q.id).map(|s| s.len() as u32).unwrap_or(0),
                })
                .collect())
        }

        async fn delete_quest(&self, id: QuestId) -> Result<(), StoreError> {
            let mut tables = self.inner.lock().expect("tables");
            tables.quests.remove(&id);
            if let Some(scenes) = tables.scenes.remove(&id) {
                for s in &scenes {
                    tables.details.remove(&s.record_id);
                }
                let ids: Vec<SceneRecordId> = scenes.iter().map(|s| s.record_id).collect();
                tables.dialogue.retain(|d| !ids.contains(&d.scene_id));
            }
            tables.timelines.remove(&id);
            Ok(())
        }

        async fn replace_scenes(
            &self,
            quest_id: QuestId,
            rows: &[SceneRow],
        ) -> Result<(), StoreError> {
            let mut tables = self.inner.lock().expect("tables");
            let stored = rows
                .iter()
                .map(|row| StoredScene {
                    record_id: SceneRecordId::new(),
                    row: row.clone(),
                })
                .collect();
            tables.scenes.insert(quest_id, stored);
            Ok(())
        }

        async fn scenes_for_quest(
            &self,
            quest_id: QuestId,
        ) -> Result<Vec<StoredScene>, StoreError> {
            let mut scenes = self
                .inner
                .lock()
                .expect("tables")
                .scenes
                .get(&quest_id)
                .cloned()
                .unwrap_or_default();
            scenes.sort_by_key(|s| s.row.order_index);
            Ok(scenes)
        }

        async fn upsert_scene_detail(
            &self,
            scene_id: SceneRecordId,
            detail: &SceneDetailRecord,
        ) -> Result<(), StoreError> {
            if self.fail_on_detail {
                return Err(StoreError::database("upsert_scene_detail", "disk full"));
            }
            self.inner
                .lock()
                .expect("tables")
                .details
                .insert(scene_id, detail.clone());
            Ok(())
        }

        async fn detail_for_scene(
            &self,
            scene_id: SceneRecordId,
        ) -> Result<Option<SceneDetailRecord>, StoreError> {
            Ok(self.inner.lock().expect("tables").details.get(&scene_id).cloned())
        }

        async fn upsert_timeline(
            &self,
            quest_id: QuestId,
            timeline: &NarrativeTimeline,
        ) -> Result<(), StoreError> {
            self.inner
                .lock()
                .expect("tables")
                .timelines
                .insert(quest_id, timeline.clone());
            Ok(())
        }

        async fn timeline_for_quest(
            &self,
            quest_id: QuestId,
        ) -> Result<Option<NarrativeTimeline>, StoreError> {
            Ok(self.inner.lock().expect("tables").timelines.get(&quest_id).cloned())
        }

        async fn delete_dialogue_for_scenes(
            &self,
            scene_ids: &[SceneRecordId],
        ) -> Result<(), StoreError> {
            self.inner
                .lock()
                .expect("tables")
                .dialogue
                .retain(|d| !scene_ids.contains(&d.scene_id));
            Ok(())
        }

        async fn insert_dialogue(&self, rows: &[DialogueRecord]) -> Result<(), StoreError> {
            self.inner
                .lock()
                .expect("tables")
                .dialogue
                .extend(rows.iter().cloned());
            Ok(())
        }

        async fn dialogue_for_scenes(
            &self,
            scene_ids: &[SceneRecordId],
        ) -> Result<Vec<DialogueRecord>, StoreError> {
            Ok(self
                .inner
                .lock()
                .expect("tables")
                .dialogue
                .iter()
                .filter(|d| scene_ids.contains(&d.scene_id))
                .cloned()
                .collect())
        }
    }

    fn draft_with_scenes(n: usize) -> QuestDraft {
        let mut draft = QuestDraft::new(QuestId::new());
        draft.title = "Harbor Lights".into();
        draft.synopsis = "A dockside mystery.".into();
        draft.area = "Old Harbor".into();
        for i in 0..n {
            let mut scene = Scene::new(format!("stop {}", i), GeoPoint::new(35.0, 139.0 + i as f64 * 0.01))
                .with_role(NarrativeRole::Development);
            scene.puzzle.prompt = format!("puzzle {}", i);
            scene.reward.plot_key = format!("key-{}", i);
            draft.scenes.push(scene);
        }
        draft.timeline = Some(NarrativeTimeline {
            prologue: "Fog rolls in.".into(),
            epilogue: "The lighthouse keeper confesses.".into(),
            ..NarrativeTimeline::default()
        });
        draft
    }

    #[tokio::test]
    async fn test_save_assigns_dense_order_indices() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(3);

        let quest_id = mapper.save(&draft).await.expect("save");
        assert_eq!(quest_id, draft.id);

        let scenes = store.scenes_for_quest(quest_id).await.expect("scenes");
        let indices: Vec<u32> = scenes.iter().map(|s| s.row.order_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_double_save_leaves_exactly_n_scenes() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(4);

        mapper.save(&draft).await.expect("first save");
        mapper.save(&draft).await.expect("second save");

        let scenes = store.scenes_for_quest(draft.id).await.expect("scenes");
        assert_eq!(scenes.len(), 4);
    }

    #[tokio::test]
    async fn test_details_are_keyed_by_store_ids() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(2);

        mapper.save(&draft).await.expect("save");

        for stored in store.scenes_for_quest(draft.id).await.expect("scenes") {
            let detail = store
                .detail_for_scene(stored.record_id)
                .await
                .expect("detail query")
                .expect("detail row");
            let i = stored.row.order_index - 1;
            assert_eq!(detail.puzzle_prompt, format!("puzzle {}", i));
            assert_eq!(detail.plot_key, format!("key-{}", i));
        }
    }

    #[tokio::test]
    async fn test_dialogue_absence_is_not_an_error() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(2);
        assert!(draft.dialogue.is_empty());

        mapper.save(&draft).await.expect("save without dialogue");
    }

    #[tokio::test]
    async fn test_dialogue_is_replaced_in_full() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let mut draft = draft_with_scenes(2);
        draft.dialogue = vec![
            DialogueLine::new(1, DialogueStage::PrePuzzle, 1, SpeakerType::Narrator, "", "line a"),
            DialogueLine::new(2, DialogueStage::PostPuzzle, 1, SpeakerType::Character, "Mori", "line b"),
        ];

        mapper.save(&draft).await.expect("first save");
        mapper.save(&draft).await.expect("second save");

        let scene_ids: Vec<SceneRecordId> = store
            .scenes_for_quest(draft.id)
            .await
            .expect("scenes")
            .iter()
            .map(|s| s.record_id)
            .collect();
        let lines = store.dialogue_for_scenes(&scene_ids).await.expect("dialogue");
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_reports_persistence_error() {
        let store = Arc::new(MemoryStore {
            fail_on_detail: true,
            ..MemoryStore::default()
        });
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(2);

        let err = mapper.save(&draft).await.expect_err("must fail");
        assert!(matches!(err, QuestError::Persistence(_)));

        // Root and scenes committed before the failing step; accepted, and
        // retrying with a healthy store would simply re-run every step.
        assert!(store.get_quest(draft.id).await.expect("quest").is_some());
        assert_eq!(store.scenes_for_quest(draft.id).await.expect("scenes").len(), 2);
    }

    #[tokio::test]
    async fn test_load_round_trips_scene_order_and_dialogue() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let mut draft = draft_with_scenes(3);
        draft.dialogue = vec![DialogueLine::new(
            2,
            DialogueStage::PrePuzzle,
            1,
            SpeakerType::Narrator,
            "",
            "the middle stop speaks",
        )];

        mapper.save(&draft).await.expect("save");
        let loaded = mapper.load(draft.id).await.expect("load");

        assert_eq!(loaded.title, draft.title);
        let names: Vec<&str> = loaded.scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["stop 0", "stop 1", "stop 2"]);
        assert_eq!(loaded.scenes[1].puzzle.prompt, "puzzle 1");
        assert_eq!(loaded.dialogue.len(), 1);
        assert_eq!(loaded.dialogue[0].scene_order, 2);
        assert!(loaded.timeline.is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_children() {
        let store = Arc::new(MemoryStore::default());
        let mapper = PersistenceMapper::new(store.clone());
        let draft = draft_with_scenes(2);

        mapper.save(&draft).await.expect("save");
        mapper.delete(draft.id).await.expect("delete");

        assert!(store.get_quest(draft.id).await.expect("quest").is_none());
        assert!(store.scenes_for_quest(draft.id).await.expect("scenes").is_empty());
        assert!(mapper.list().await.expect("list").is_empty());
    }
}
