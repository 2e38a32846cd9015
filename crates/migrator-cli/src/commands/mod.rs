//! CLI commands

pub mod export;
pub mod import;
pub mod pause_toggle;
