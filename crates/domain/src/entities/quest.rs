//! Quest draft aggregate.

use serde::{Deserialize, Serialize};

use crate::entities::{DialogueLine, NarrativeTimeline, Scene};
use crate::ids::QuestId;
use crate::value_objects::Difficulty;

/// The in-memory quest being generated and edited.
///
/// The draft exclusively owns its scene list, timeline, and dialogue for the
/// duration of one generation run. A new run supersedes (never deletes) the
/// draft by resetting every child collection while keeping the id, so
/// partial saves before and after regeneration target the same quest row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraft {
    pub id: QuestId,
    pub title: String,
    pub synopsis: String,
    /// District/neighborhood label the route runs through
    pub area: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    /// Mission / clear-condition text
    pub mission: String,
    /// Ordered scene list; position is the sole ordering key in memory
    pub scenes: Vec<Scene>,
    pub timeline: Option<NarrativeTimeline>,
    pub dialogue: Vec<DialogueLine>,
    /// Generation warnings surfaced to the creator
    pub warnings: Vec<String>,
    /// Player-facing highlight blurbs from the final payload
    pub highlights: Vec<String>,
}

impl QuestDraft {
    pub fn new(id: QuestId) -> Self {
        Self {
            id,
            title: String::new(),
            synopsis: String::new(),
            area: String::new(),
            difficulty: Difficulty::default(),
            tags: Vec::new(),
            cover_image: None,
            mission: String::new(),
            scenes: Vec::new(),
            timeline: None,
            dialogue: Vec::new(),
            warnings: Vec::new(),
            highlights: Vec::new(),
        }
    }

    /// Reset every child collection ahead of a fresh generation run.
    /// The quest id survives so re-saves keep targeting the same row.
    pub fn reset_children(&mut self) {
        self.title.clear();
        self.synopsis.clear();
        self.area.clear();
        self.tags.clear();
        self.cover_image = None;
        self.mission.clear();
        self.scenes.clear();
        self.timeline = None;
        self.dialogue.clear();
        self.warnings.clear();
        self.highlights.clear();
    }

    /// Write a scene at an explicit 0-based index, growing the list with
    /// placeholders when completions arrive out of numeric order. The index
    /// is authoritative; scenes are never appended blindly.
    pub fn put_scene(&mut self, index: usize, scene: Scene) {
        while self.scenes.len() <= index {
            self.scenes.push(Scene::placeholder());
        }
        self.scenes[index] = scene;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::GeoPoint;

    #[test]
    fn test_put_scene_out_of_order() {
        let mut draft = QuestDraft::new(QuestId::new());
        draft.put_scene(2, Scene::new("third", GeoPoint::new(0.0, 2.0)));
        draft.put_scene(0, Scene::new("first", GeoPoint::new(0.0, 0.0)));
        draft.put_scene(1, Scene::new("second", GeoPoint::new(0.0, 1.0)));

        let names: Vec<&str> = draft.scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_put_scene_overwrites_in_place() {
        let mut draft = QuestDraft::new(QuestId::new());
        draft.put_scene(0, Scene::new("draft one", GeoPoint::new(1.0, 1.0)));
        draft.put_scene(0, Scene::new("retry one", GeoPoint::new(1.0, 1.0)));

        assert_eq!(draft.scenes.len(), 1);
        assert_eq!(draft.scenes[0].name, "retry one");
    }

    #[test]
    fn test_draft_serializes_with_camel_case_keys() {
        let mut draft = QuestDraft::new(QuestId::new());
        draft.cover_image = Some("covers/a.png".into());

        let value = serde_json::to_value(&draft).expect("serialize");
        assert!(value.get("coverImage").is_some());
        assert!(value.get("cover_image").is_none());
    }

    #[test]
    fn test_reset_children_keeps_id() {
        let id = QuestId::new();
        let mut draft = QuestDraft::new(id);
        draft.title = "Old Run".into();
        draft.put_scene(0, Scene::new("stop", GeoPoint::new(1.0, 1.0)));
        draft.timeline = Some(NarrativeTimeline::default());

        draft.reset_children();

        assert_eq!(draft.id, id);
        assert!(draft.title.is_empty());
        assert!(draft.scenes.is_empty());
        assert!(draft.timeline.is_none());
    }
}
