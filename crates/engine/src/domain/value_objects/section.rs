//! Section identity and lifecycle status.
//!
//! A section is a UI-tracked unit of generated content: the basic info
//! block, the story block, or one scene. Sections exist only for the
//! duration of a session and are never persisted.

use serde::{Deserialize, Serialize};

use questforge_domain::DomainError;

/// Key identifying one section of the editing workspace.
///
/// Renders to the wire keys `basic-info`, `story`, and `spot-{index}`
/// (0-based index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    BasicInfo,
    Story,
    Spot(usize),
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BasicInfo => write!(f, "basic-info"),
            Self::Story => write!(f, "story"),
            Self::Spot(index) => write!(f, "spot-{}", index),
        }
    }
}

impl std::str::FromStr for SectionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic-info" => Ok(Self::BasicInfo),
            "story" => Ok(Self::Story),
            _ => {
                let index = s
                    .strip_prefix("spot-")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| DomainError::parse(format!("Unknown section id: {}", s)))?;
                Ok(Self::Spot(index))
            }
        }
    }
}

/// Lifecycle status of one section.
///
/// The store is deliberately permissive: any status may overwrite any other
/// (last write wins). Transition discipline lives with the two writers, the
/// orchestrator and the editing surface, so out-of-order pipeline events can
/// never deadlock on an illegal-transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionStatus {
    Pending,
    Generating,
    Ready,
    Editing,
    Locked,
    Error,
}

impl SectionStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_section_id_round_trip() {
        for id in [SectionId::BasicInfo, SectionId::Story, SectionId::Spot(7)] {
            let parsed = SectionId::from_str(&id.to_string()).expect("parse");
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_section_id_rejects_garbage() {
        assert!(SectionId::from_str("spot-").is_err());
        assert!(SectionId::from_str("chapter-1").is_err());
    }
}
