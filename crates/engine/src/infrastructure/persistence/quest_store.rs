//! SQLite implementation of the quest store.
//!
//! Straightforward row mapping: enums are stored as their text tokens,
//! list-valued fields (tags, hints, cast) as JSON text columns. Scene rows
//! get a store-minted uuid on insert; `replace_scenes` purges the old rows
//! and their children so stale details never outlive their scene.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use questforge_domain::{
    CastMember, DialogueStage, Difficulty, GeoPoint, MetaPuzzle, NarrativeRole, NarrativeTimeline,
    QuestId, SceneRecordId, SpeakerType,
};

use crate::application::ports::outbound::{
    DialogueRecord, QuestRecord, QuestStorePort, QuestSummary, SceneDetailRecord, SceneRow,
    StoreError, StoredScene,
};

pub struct SqliteQuestStore {
    pool: SqlitePool,
}

impl SqliteQuestStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quests (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                area TEXT NOT NULL,
                tags TEXT NOT NULL,
                cover_image TEXT,
                difficulty TEXT NOT NULL,
                status TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenes (
                id TEXT PRIMARY KEY,
                quest_id TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                place_ref TEXT,
                role TEXT NOT NULL,
                UNIQUE (quest_id, order_index)
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scene_details (
                scene_id TEXT PRIMARY KEY,
                navigation_text TEXT NOT NULL,
                narrative_text TEXT NOT NULL,
                puzzle_kind TEXT NOT NULL,
                puzzle_prompt TEXT NOT NULL,
                hints TEXT NOT NULL,
                answer TEXT NOT NULL,
                solution_steps TEXT NOT NULL,
                next_hook TEXT NOT NULL,
                lore_reveal TEXT NOT NULL,
                plot_key TEXT NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS timelines (
                quest_id TEXT PRIMARY KEY,
                prologue TEXT NOT NULL,
                epilogue TEXT NOT NULL,
                cast_members TEXT NOT NULL,
                meta_puzzle TEXT NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dialogue_lines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scene_id TEXT NOT NULL,
                stage TEXT NOT NULL,
                line_order INTEGER NOT NULL,
                speaker TEXT NOT NULL,
                speaker_name TEXT NOT NULL,
                text TEXT NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::serialization(format!("bad uuid {}: {}", s, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(StoreError::serialization)
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    serde_json::from_str(s).map_err(StoreError::serialization)
}

#[async_trait]
impl QuestStorePort for SqliteQuestStore {
    async fn upsert_quest(&self, quest: &QuestRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO quests
                (id, title, description, area, tags, cover_image, difficulty, status, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(quest.id.to_string())
        .bind(&quest.title)
        .bind(&quest.description)
        .bind(&quest.area)
        .bind(to_json(&quest.tags)?)
        .bind(&quest.cover_image)
        .bind(quest.difficulty.to_string())
        .bind(&quest.status)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("upsert_quest", e))?;

        Ok(())
    }

    async fn get_quest(&self, id: QuestId) -> Result<Option<QuestRecord>, StoreError> {
        let row: Option<(String, String, String, String, Option<String>, String, String)> =
            sqlx::query_as(
                r#"
                SELECT title, description, area, tags, cover_image, difficulty, status
                FROM quests WHERE id = ?
            "#,
            )
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database("get_quest", e))?;

        let Some((title, description, area, tags, cover_image, difficulty, status)) = row else {
            return Ok(None);
        };

        Ok(Some(QuestRecord {
            id,
            title,
            description,
            area,
            tags: from_json(&tags)?,
            cover_image,
            difficulty: Difficulty::from_str(&difficulty).map_err(StoreError::serialization)?,
            status,
        }))
    }

    async fn list_quests(&self) -> Result<Vec<QuestSummary>, StoreError> {
        let rows: Vec<(String, String, String, String, String, i64)> = sqlx::query_as(
            r#"
            SELECT q.id, q.title, q.area, q.difficulty, q.status, COUNT(s.id)
            FROM quests q
            LEFT JOIN scenes s ON s.quest_id = q.id
            GROUP BY q.id
            ORDER BY q.updated_at DESC
        "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database("list_quests", e))?;

        rows.into_iter()
            .map(|(id, title, area, difficulty, status, scene_count)| {
                Ok(QuestSummary {
                    id: QuestId::from_uuid(parse_uuid(&id)?),
                    title,
                    area,
                    difficulty: Difficulty::from_str(&difficulty)
                        .map_err(StoreError::serialization)?,
                    status,
                    scene_count: scene_count as u32,
                })
            })
            .collect()
    }

    async fn delete_quest(&self, id: QuestId) -> Result<(), StoreError> {
        let id_str = id.to_string();

        sqlx::query(
            "DELETE FROM dialogue_lines WHERE scene_id IN (SELECT id FROM scenes WHERE quest_id = ?)",
        )
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("delete_quest", e))?;

        sqlx::query(
            "DELETE FROM scene_details WHERE scene_id IN (SELECT id FROM scenes WHERE quest_id = ?)",
        )
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("delete_quest", e))?;

        for table in ["scenes", "timelines"] {
            sqlx::query(&format!("DELETE FROM {} WHERE quest_id = ?", table))
                .bind(&id_str)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::database("delete_quest", e))?;
        }

        sqlx::query("DELETE FROM quests WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("delete_quest", e))?;

        Ok(())
    }

    async fn replace_scenes(&self, quest_id: QuestId, rows: &[SceneRow]) -> Result<(), StoreError> {
        let quest_id_str = quest_id.to_string();

        // Children of the outgoing rows go with them; their scene ids are
        // about to be invalidated.
        sqlx::query(
            "DELETE FROM dialogue_lines WHERE scene_id IN (SELECT id FROM scenes WHERE quest_id = ?)",
        )
        .bind(&quest_id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("replace_scenes", e))?;

        sqlx::query(
            "DELETE FROM scene_details WHERE scene_id IN (SELECT id FROM scenes WHERE quest_id = ?)",
        )
        .bind(&quest_id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("replace_scenes", e))?;

        sqlx::query("DELETE FROM scenes WHERE quest_id = ?")
            .bind(&quest_id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("replace_scenes", e))?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO scenes (id, quest_id, order_index, name, address, lat, lng, place_ref, role)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(SceneRecordId::new().to_string())
            .bind(&quest_id_str)
            .bind(row.order_index as i64)
            .bind(&row.name)
            .bind(&row.address)
            .bind(row.position.lat)
            .bind(row.position.lng)
            .bind(&row.place_ref)
            .bind(row.role.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("replace_scenes", e))?;
        }

        Ok(())
    }

    async fn scenes_for_quest(&self, quest_id: QuestId) -> Result<Vec<StoredScene>, StoreError> {
        let rows: Vec<(String, i64, String, String, f64, f64, Option<String>, String)> =
            sqlx::query_as(
                r#"
                SELECT id, order_index, name, address, lat, lng, place_ref, role
                FROM scenes WHERE quest_id = ?
                ORDER BY order_index
            "#,
            )
            .bind(quest_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database("scenes_for_quest", e))?;

        rows.into_iter()
            .map(|(id, order_index, name, address, lat, lng, place_ref, role)| {
                Ok(StoredScene {
                    record_id: SceneRecordId::from_uuid(parse_uuid(&id)?),
                    row: SceneRow {
                        order_index: order_index as u32,
                        name,
                        address,
                        position: GeoPoint::new(lat, lng),
                        place_ref,
                        role: NarrativeRole::from_str(&role).map_err(StoreError::serialization)?,
                    },
                })
            })
            .collect()
    }

    async fn upsert_scene_detail(
        &self,
        scene_id: SceneRecordId,
        detail: &SceneDetailRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO scene_details
                (scene_id, navigation_text, narrative_text, puzzle_kind, puzzle_prompt,
                 hints, answer, solution_steps, next_hook, lore_reveal, plot_key)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(scene_id.to_string())
        .bind(&detail.navigation_text)
        .bind(&detail.narrative_text)
        .bind(&detail.puzzle_kind)
        .bind(&detail.puzzle_prompt)
        .bind(to_json(&detail.hints)?)
        .bind(&detail.answer)
        .bind(to_json(&detail.solution_steps)?)
        .bind(&detail.next_hook)
        .bind(&detail.lore_reveal)
        .bind(&detail.plot_key)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("upsert_scene_detail", e))?;

        Ok(())
    }

    async fn detail_for_scene(
        &self,
        scene_id: SceneRecordId,
    ) -> Result<Option<SceneDetailRecord>, StoreError> {
        #[allow(clippy::type_complexity)]
        let row: Option<(
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
            String,
        )> = sqlx::query_as(
            r#"
            SELECT navigation_text, narrative_text, puzzle_kind, puzzle_prompt,
                   hints, answer, solution_steps, next_hook, lore_reveal, plot_key
            FROM scene_details WHERE scene_id = ?
        "#,
        )
        .bind(scene_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database("detail_for_scene", e))?;

        let Some((
            navigation_text,
            narrative_text,
            puzzle_kind,
            puzzle_prompt,
            hints,
            answer,
            solution_steps,
            next_hook,
            lore_reveal,
            plot_key,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(SceneDetailRecord {
            navigation_text,
            narrative_text,
            puzzle_kind,
            puzzle_prompt,
            hints: from_json(&hints)?,
            answer,
            solution_steps: from_json(&solution_steps)?,
            next_hook,
            lore_reveal,
            plot_key,
        }))
    }

    async fn upsert_timeline(
        &self,
        quest_id: QuestId,
        timeline: &NarrativeTimeline,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO timelines (quest_id, prologue, epilogue, cast_members, meta_puzzle)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(quest_id.to_string())
        .bind(&timeline.prologue)
        .bind(&timeline.epilogue)
        .bind(to_json(&timeline.cast)?)
        .bind(to_json(&timeline.meta_puzzle)?)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("upsert_timeline", e))?;

        Ok(())
    }

    async fn timeline_for_quest(
        &self,
        quest_id: QuestId,
    ) -> Result<Option<NarrativeTimeline>, StoreError> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT prologue, epilogue, cast_members, meta_puzzle FROM timelines WHERE quest_id = ?",
        )
        .bind(quest_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database("timeline_for_quest", e))?;

        let Some((prologue, epilogue, cast, meta_puzzle)) = row else {
            return Ok(None);
        };

        let cast: Vec<CastMember> = from_json(&cast)?;
        let meta_puzzle: MetaPuzzle = from_json(&meta_puzzle)?;

        Ok(Some(NarrativeTimeline {
            prologue,
            epilogue,
            cast,
            meta_puzzle,
        }))
    }

    async fn delete_dialogue_for_scenes(
        &self,
        scene_ids: &[SceneRecordId],
    ) -> Result<(), StoreError> {
        for scene_id in scene_ids {
            sqlx::query("DELETE FROM dialogue_lines WHERE scene_id = ?")
                .bind(scene_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::database("delete_dialogue_for_scenes", e))?;
        }
        Ok(())
    }

    async fn insert_dialogue(&self, rows: &[DialogueRecord]) -> Result<(), StoreError> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dialogue_lines (scene_id, stage, line_order, speaker, speaker_name, text)
                VALUES (?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(row.scene_id.to_string())
            .bind(row.stage.to_string())
            .bind(row.order as i64)
            .bind(row.speaker.to_string())
            .bind(&row.speaker_name)
            .bind(&row.text)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("insert_dialogue", e))?;
        }
        Ok(())
    }

    async fn dialogue_for_scenes(
        &self,
        scene_ids: &[SceneRecordId],
    ) -> Result<Vec<DialogueRecord>, StoreError> {
        let mut out = Vec::new();

        for scene_id in scene_ids {
            let rows: Vec<(String, i64, String, String, String)> = sqlx::query_as(
                r#"
                SELECT stage, line_order, speaker, speaker_name, text
                FROM dialogue_lines WHERE scene_id = ?
                ORDER BY CASE WHEN stage = 'pre_puzzle' THEN 0 ELSE 1 END, line_order
            "#,
            )
            .bind(scene_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database("dialogue_for_scenes", e))?;

            for (stage, line_order, speaker, speaker_name, text) in rows {
                out.push(DialogueRecord {
                    scene_id: *scene_id,
                    stage: DialogueStage::from_str(&stage).map_err(StoreError::serialization)?,
                    order: line_order as u32,
                    speaker: SpeakerType::from_str(&speaker).map_err(StoreError::serialization)?,
                    speaker_name,
                    text,
                });
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteQuestStore {
        // One connection: an in-memory sqlite database is per-connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        SqliteQuestStore::new(pool).await.expect("schema bootstrap")
    }

    fn quest_record(id: QuestId) -> QuestRecord {
        QuestRecord {
            id,
            title: "Canal Ghosts".into(),
            description: "Follow the old towpath.".into(),
            area: "Canal District".into(),
            tags: vec!["mystery".into(), "history".into()],
            cover_image: None,
            difficulty: Difficulty::Hard,
            status: "draft".into(),
        }
    }

    fn scene_rows(n: u32) -> Vec<SceneRow> {
        (1..=n)
            .map(|i| SceneRow {
                order_index: i,
                name: format!("stop {}", i),
                address: format!("{} Towpath", i),
                position: GeoPoint::new(52.37, 4.89 + f64::from(i) * 0.002),
                place_ref: None,
                role: NarrativeRole::Development,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_quest_upsert_and_get_round_trip() {
        let store = store().await;
        let id = QuestId::new();

        store.upsert_quest(&quest_record(id)).await.expect("upsert");
        let loaded = store.get_quest(id).await.expect("get").expect("row");

        assert_eq!(loaded.title, "Canal Ghosts");
        assert_eq!(loaded.tags, vec!["mystery", "history"]);
        assert_eq!(loaded.difficulty, Difficulty::Hard);
    }

    #[tokio::test]
    async fn test_get_quest_missing_is_none() {
        let store = store().await;
        assert!(store.get_quest(QuestId::new()).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_replace_scenes_mints_fresh_ids() {
        let store = store().await;
        let id = QuestId::new();
        store.upsert_quest(&quest_record(id)).await.expect("upsert");

        store.replace_scenes(id, &scene_rows(3)).await.expect("first replace");
        let first = store.scenes_for_quest(id).await.expect("scenes");

        store.replace_scenes(id, &scene_rows(3)).await.expect("second replace");
        let second = store.scenes_for_quest(id).await.expect("scenes");

        assert_eq!(second.len(), 3);
        let indices: Vec<u32> = second.iter().map(|s| s.row.order_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(first
            .iter()
            .zip(&second)
            .all(|(a, b)| a.record_id != b.record_id));
    }

    #[tokio::test]
    async fn test_replace_scenes_purges_orphaned_children() {
        let store = store().await;
        let id = QuestId::new();
        store.upsert_quest(&quest_record(id)).await.expect("upsert");
        store.replace_scenes(id, &scene_rows(1)).await.expect("replace");

        let old_id = store.scenes_for_quest(id).await.expect("scenes")[0].record_id;
        store
            .upsert_scene_detail(old_id, &SceneDetailRecord::default())
            .await
            .expect("detail");

        store.replace_scenes(id, &scene_rows(1)).await.expect("replace again");
        assert!(store
            .detail_for_scene(old_id)
            .await
            .expect("detail query")
            .is_none());
    }

    #[tokio::test]
    async fn test_scene_detail_round_trip() {
        let store = store().await;
        let id = QuestId::new();
        store.upsert_quest(&quest_record(id)).await.expect("upsert");
        store.replace_scenes(id, &scene_rows(1)).await.expect("replace");
        let scene_id = store.scenes_for_quest(id).await.expect("scenes")[0].record_id;

        let detail = SceneDetailRecord {
            puzzle_kind: "cipher".into(),
            puzzle_prompt: "Decode the plaque.".into(),
            hints: vec!["Look at the first letters.".into()],
            answer: "LOCK NINE".into(),
            solution_steps: vec!["Read the plaque.".into(), "Take initials.".into()],
            plot_key: "nine".into(),
            ..SceneDetailRecord::default()
        };
        store.upsert_scene_detail(scene_id, &detail).await.expect("upsert");

        let loaded = store
            .detail_for_scene(scene_id)
            .await
            .expect("get")
            .expect("row");
        assert_eq!(loaded.puzzle_kind, "cipher");
        assert_eq!(loaded.hints, detail.hints);
        assert_eq!(loaded.solution_steps.len(), 2);
    }

    #[tokio::test]
    async fn test_timeline_round_trip() {
        let store = store().await;
        let id = QuestId::new();

        let timeline = NarrativeTimeline {
            prologue: "A letter arrives.".into(),
            epilogue: "The canal keeps its secret.".into(),
            cast: vec![CastMember {
                name: "Elena".into(),
                role: "archivist".into(),
                ..CastMember::default()
            }],
            meta_puzzle: MetaPuzzle {
                keys: vec!["nine".into(), "iron".into()],
                question: "What opened the gate?".into(),
                answer: "IRON NINE".into(),
                explanation: String::new(),
            },
        };
        store.upsert_timeline(id, &timeline).await.expect("upsert");

        let loaded = store
            .timeline_for_quest(id)
            .await
            .expect("get")
            .expect("row");
        assert_eq!(loaded.cast.len(), 1);
        assert_eq!(loaded.meta_puzzle.keys, vec!["nine", "iron"]);
    }

    #[tokio::test]
    async fn test_dialogue_ordering_and_delete() {
        let store = store().await;
        let id = QuestId::new();
        store.upsert_quest(&quest_record(id)).await.expect("upsert");
        store.replace_scenes(id, &scene_rows(1)).await.expect("replace");
        let scene_id = store.scenes_for_quest(id).await.expect("scenes")[0].record_id;

        let rows = vec![
            DialogueRecord {
                scene_id,
                stage: DialogueStage::PostPuzzle,
                order: 1,
                speaker: SpeakerType::Narrator,
                speaker_name: String::new(),
                text: "after".into(),
            },
            DialogueRecord {
                scene_id,
                stage: DialogueStage::PrePuzzle,
                order: 2,
                speaker: SpeakerType::Character,
                speaker_name: "Elena".into(),
                text: "before, second".into(),
            },
            DialogueRecord {
                scene_id,
                stage: DialogueStage::PrePuzzle,
                order: 1,
                speaker: SpeakerType::Character,
                speaker_name: "Elena".into(),
                text: "before, first".into(),
            },
        ];
        store.insert_dialogue(&rows).await.expect("insert");

        let loaded = store.dialogue_for_scenes(&[scene_id]).await.expect("get");
        let texts: Vec<&str> = loaded.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["before, first", "before, second", "after"]);

        store
            .delete_dialogue_for_scenes(&[scene_id])
            .await
            .expect("delete");
        assert!(store
            .dialogue_for_scenes(&[scene_id])
            .await
            .expect("get")
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_quest_cascades() {
        let store = store().await;
        let id = QuestId::new();
        store.upsert_quest(&quest_record(id)).await.expect("upsert");
        store.replace_scenes(id, &scene_rows(2)).await.expect("replace");
        store
            .upsert_timeline(id, &NarrativeTimeline::default())
            .await
            .expect("timeline");

        store.delete_quest(id).await.expect("delete");

        assert!(store.get_quest(id).await.expect("get").is_none());
        assert!(store.scenes_for_quest(id).await.expect("scenes").is_empty());
        assert!(store.timeline_for_quest(id).await.expect("timeline").is_none());
        assert!(store.list_quests().await.expect("list").is_empty());
    }
}
