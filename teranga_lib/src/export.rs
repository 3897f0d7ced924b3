//! CSV outputs for the cleaned tables and the KPI table.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cleaning::CleanDataset;
use crate::kpi::PlayerKpi;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the clean CSVs into `out_dir` and the KPI CSV into its
/// `processed/` subdirectory, creating both directories as needed. Files
/// are rewritten whole, so rerunning over the same data reproduces them
/// byte for byte. Returns the written paths in write order.
pub fn export_all(
    dataset: &CleanDataset,
    kpis: &[PlayerKpi],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir)?;
    let processed = out_dir.join("processed");
    fs::create_dir_all(&processed)?;

    let players = out_dir.join("players_clean.csv");
    write_csv(&players, &dataset.players)?;
    let matches = out_dir.join("matches_clean.csv");
    write_csv(&matches, &dataset.matches)?;
    let performances = out_dir.join("performances_clean.csv");
    write_csv(&performances, &dataset.performances)?;
    let kpi_file = processed.join("players_kpis.csv");
    write_csv(&kpi_file, kpis)?;

    Ok(vec![players, matches, performances, kpi_file])
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
