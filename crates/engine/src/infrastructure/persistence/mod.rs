//! SQLite persistence adapters.

pub mod connection;
pub mod quest_store;

pub use connection::connect;
pub use quest_store::SqliteQuestStore;
