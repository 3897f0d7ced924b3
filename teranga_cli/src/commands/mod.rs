//! CLI subcommand implementations.

pub mod pipeline;
pub mod scrape;
