//! Outbound adapters: backend HTTP clients and sqlite persistence.

pub mod artwork;
pub mod dialogue;
pub mod persistence;
pub mod pipeline;

pub use artwork::HttpCoverArtClient;
pub use dialogue::HttpDialogueClient;
pub use pipeline::HttpPipelineClient;
