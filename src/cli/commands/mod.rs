//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs` and CLI tests.
//! Implementations live in `commands/*`.

mod common;
mod config_cmd;
mod drain;
mod generate;
mod roadmaps;

pub use config_cmd::execute_config_command;
pub use drain::{DrainSummary, drain_queue, progress_line};
pub use generate::{
    execute_generate_command, execute_regenerate_command, execute_resume_command,
};
pub use roadmaps::{
    RoadmapSummary, execute_delete_command, execute_list_command, execute_show_command,
};

#[cfg(test)]
pub(crate) use roadmaps::render_roadmap;
