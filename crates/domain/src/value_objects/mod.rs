//! Value objects shared across quest entities.

mod difficulty;
mod geo;
mod narrative;
mod speech;

pub use difficulty::Difficulty;
pub use geo::GeoPoint;
pub use narrative::NarrativeRole;
pub use speech::{DialogueStage, SpeakerType};
