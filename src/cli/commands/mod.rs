//! CLI command implementations

pub mod completions;
pub mod decision;
pub mod epic;
pub mod export;
pub mod init;
pub mod project;
pub mod raci;
pub mod retro;
pub mod risk;
pub mod sprint;
pub mod status;
pub mod story;
pub mod team;
