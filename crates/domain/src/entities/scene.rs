//! Scene entity - a single geolocated stop on the quest route.

use serde::{Deserialize, Serialize};

use crate::ids::SceneId;
use crate::value_objects::{GeoPoint, NarrativeRole};

/// The puzzle a player solves at a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    /// Puzzle kind label (riddle, cipher, observation, ...)
    pub kind: String,
    /// Player-facing prompt
    pub prompt: String,
    /// Ordered hints, mildest first
    pub hints: Vec<String>,
    /// Expected answer
    pub answer: String,
    /// Steps explaining how the answer is reached
    pub solution_steps: Vec<String>,
}

/// What solving a scene's puzzle yields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    /// Teaser pointing at the next stop
    pub next_hook: String,
    /// Lore revealed on completion
    pub lore_reveal: String,
    /// Token feeding the quest-level meta puzzle
    pub plot_key: String,
}

/// A single stop on the route, bundling narrative and puzzle content.
///
/// The `id` is a temporary client identifier; the store assigns the
/// authoritative record id at first save. Order within the quest is carried
/// by the scene's position in `QuestDraft::scenes` and persisted as an
/// explicit 1-based index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub address: String,
    pub position: GeoPoint,
    /// Optional external place reference (POI id)
    pub place_ref: Option<String>,
    pub role: NarrativeRole,
    pub puzzle: Puzzle,
    /// Handout/lore text shown at the stop
    pub handout: String,
    pub reward: Reward,
    /// Why this stop sits where it does in the narrative
    pub rationale: String,
}

impl Scene {
    pub fn new(name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            address: String::new(),
            position,
            place_ref: None,
            role: NarrativeRole::default(),
            puzzle: Puzzle::default(),
            handout: String::new(),
            reward: Reward::default(),
            rationale: String::new(),
        }
    }

    /// Placeholder scene used when spot completions arrive out of order.
    /// Never surfaced as ready; always overwritten before the run resolves.
    pub fn placeholder() -> Self {
        Self::new("", GeoPoint::new(0.0, 0.0))
    }

    pub fn with_role(mut self, role: NarrativeRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}
