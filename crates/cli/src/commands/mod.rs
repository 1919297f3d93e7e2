//! CLI subcommand implementations

pub mod analyze;
pub mod savings;
pub mod snapshot;
