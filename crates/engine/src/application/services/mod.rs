//! Application services.

mod generation_orchestrator;
mod persistence_mapper;
mod section_status;

pub use generation_orchestrator::GenerationOrchestrator;
pub use persistence_mapper::PersistenceMapper;
pub use section_status::{SectionState, SectionStatusStore};
