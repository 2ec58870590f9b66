//! QuestForge engine crate.
//!
//! Orchestrates quest generation against an external pipeline capability,
//! tracks per-section lifecycle state for the editing surface, and maps the
//! in-memory draft into normalized rows in the relational store.

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
