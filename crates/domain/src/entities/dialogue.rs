//! Dialogue line entity.

use serde::{Deserialize, Serialize};

use crate::ids::DialogueLineId;
use crate::value_objects::{DialogueStage, SpeakerType};

/// One line of scene dialogue.
///
/// Dialogue is derivative of the narrative and scene content, cheap to
/// regenerate, and always replaced in full rather than diffed. Lines
/// reference their scene by 1-based order index; the store swaps that for
/// the store-assigned scene id at save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    pub id: DialogueLineId,
    /// 1-based order index of the owning scene
    pub scene_order: u32,
    pub stage: DialogueStage,
    /// Position within the stage
    pub order: u32,
    pub speaker: SpeakerType,
    pub speaker_name: String,
    pub text: String,
}

impl DialogueLine {
    pub fn new(
        scene_order: u32,
        stage: DialogueStage,
        order: u32,
        speaker: SpeakerType,
        speaker_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: DialogueLineId::new(),
            scene_order,
            stage,
            order,
            speaker,
            speaker_name: speaker_name.into(),
            text: text.into(),
        }
    }
}
