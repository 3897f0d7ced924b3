//! Library layer for the Teranga player pipeline: SQLite storage, cleaning,
//! KPI computation and CSV export over data collected by `teranga_scraper`.
//!
//! The scraping side is async and lives in the `teranga_scraper` crate;
//! everything here is synchronous and operates on the local database.

pub mod cleaning;
pub mod db;
pub mod export;
pub mod kpi;
pub mod pipeline;

pub use teranga_scraper;

pub use cleaning::{CleanDataset, CleanMatch, CleanPerformance, CleanPlayer};
pub use db::{Db, DbError, MatchRecord, PerformanceRecord, PlayerRecord};
pub use export::ExportError;
pub use kpi::PlayerKpi;
pub use pipeline::{PipelineError, PipelineReport};
