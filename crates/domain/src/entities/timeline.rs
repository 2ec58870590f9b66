//! Narrative timeline entity - prologue, epilogue, cast, and meta puzzle.

use serde::{Deserialize, Serialize};

/// A character in the quest's cast roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub name: String,
    pub role: String,
    pub tone: String,
    pub motivation: String,
    pub sample_line: String,
}

/// Quest-level puzzle combining the plot keys earned at each scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPuzzle {
    /// Keys drawn from each scene's reward, in scene order
    pub keys: Vec<String>,
    pub question: String,
    pub answer: String,
    pub explanation: String,
}

/// The quest's narrative frame. One per quest; upserted, never multiplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeTimeline {
    pub prologue: String,
    pub epilogue: String,
    pub cast: Vec<CastMember>,
    pub meta_puzzle: MetaPuzzle,
}
