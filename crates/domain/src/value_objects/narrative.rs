use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Narrative function a scene serves within the quest arc.
///
/// `TurningPoint` scenes are surfaced as climax markers on the route view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NarrativeRole {
    Introduction,
    Development,
    TurningPoint,
    Resolution,
}

impl NarrativeRole {
    pub fn is_turning_point(&self) -> bool {
        matches!(self, Self::TurningPoint)
    }
}

impl Default for NarrativeRole {
    fn default() -> Self {
        Self::Development
    }
}

impl std::fmt::Display for NarrativeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Introduction => write!(f, "introduction"),
            Self::Development => write!(f, "development"),
            Self::TurningPoint => write!(f, "turning_point"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

impl std::str::FromStr for NarrativeRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introduction" => Ok(Self::Introduction),
            "development" => Ok(Self::Development),
            "turning_point" => Ok(Self::TurningPoint),
            "resolution" => Ok(Self::Resolution),
            _ => Err(DomainError::parse(format!("Unknown narrative role: {}", s))),
        }
    }
}
