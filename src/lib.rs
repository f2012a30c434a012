//! AWB: Agile Workbench
//!
//! Project-scoped epics, stories, sprints, RACI, retros, decisions and
//! risks, kept in a flat key-value store with no enforced foreign keys.

pub mod cli;
pub mod core;
pub mod entities;
pub mod export;
