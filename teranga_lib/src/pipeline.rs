//! End-to-end refinement of an already-scraped database: clean, publish,
//! compute KPIs, export CSVs.

use std::path::Path;

use crate::cleaning;
use crate::db::{Db, DbError};
use crate::export::{self, ExportError};
use crate::kpi;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Row counts and cleaning warnings from one run.
#[derive(Debug, Default, PartialEq)]
pub struct PipelineReport {
    pub players: usize,
    pub matches: usize,
    pub performances: usize,
    pub kpis: usize,
    pub warnings: Vec<String>,
}

/// Runs the whole refinement. Safe to rerun: published tables are rebuilt
/// inside one transaction and CSV files are rewritten whole, so the same
/// database state always produces the same output.
pub fn run(db: &mut Db, out_dir: &Path) -> Result<PipelineReport, PipelineError> {
    let players = db.load_players()?;
    let matches = db.load_matches()?;
    let performances = db.load_performances()?;
    tracing::info!(
        "loaded {} players, {} matches, {} performances",
        players.len(),
        matches.len(),
        performances.len()
    );

    let dataset = cleaning::clean(players, matches, performances);
    let kpis = kpi::compute_kpis(&dataset.players, &dataset.performances);

    db.publish(&dataset, &kpis)?;
    let written = export::export_all(&dataset, &kpis, out_dir)?;
    for path in &written {
        tracing::info!("wrote {}", path.display());
    }

    Ok(PipelineReport {
        players: dataset.players.len(),
        matches: dataset.matches.len(),
        performances: dataset.performances.len(),
        kpis: kpis.len(),
        warnings: dataset.warnings,
    })
}
