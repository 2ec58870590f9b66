mod section;

pub use section::{SectionId, SectionStatus};
