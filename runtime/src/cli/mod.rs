//! CLI subcommand implementations for the roam-export binary.

pub mod doctor;
pub mod export_cmd;
pub mod output;
