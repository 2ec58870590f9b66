//! Quest entities.

mod dialogue;
mod quest;
mod scene;
mod timeline;

pub use dialogue::DialogueLine;
pub use quest::QuestDraft;
pub use scene::{Puzzle, Reward, Scene};
pub use timeline::{CastMember, MetaPuzzle, NarrativeTimeline};
