//! Port traits at the application boundary.

pub mod outbound;
