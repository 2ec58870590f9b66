use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// When a dialogue line plays relative to the scene's puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStage {
    PrePuzzle,
    PostPuzzle,
}

impl std::fmt::Display for DialogueStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrePuzzle => write!(f, "pre_puzzle"),
            Self::PostPuzzle => write!(f, "post_puzzle"),
        }
    }
}

impl std::str::FromStr for DialogueStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre_puzzle" => Ok(Self::PrePuzzle),
            "post_puzzle" => Ok(Self::PostPuzzle),
            _ => Err(DomainError::parse(format!("Unknown dialogue stage: {}", s))),
        }
    }
}

/// Who delivers a dialogue line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerType {
    Character,
    Narrator,
}

impl std::fmt::Display for SpeakerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character => write!(f, "character"),
            Self::Narrator => write!(f, "narrator"),
        }
    }
}

impl std::str::FromStr for SpeakerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(Self::Character),
            "narrator" => Ok(Self::Narrator),
            _ => Err(DomainError::parse(format!("Unknown speaker type: {}", s))),
        }
    }
}
