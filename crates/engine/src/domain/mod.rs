//! Engine-local domain types.

pub mod value_objects;
