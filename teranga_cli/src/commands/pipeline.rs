//! The `pipeline` subcommand: clean the scraped tables, compute KPIs and
//! export CSV files.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use teranga_lib::db::Db;
use teranga_lib::pipeline;

/// Arguments for the `pipeline` subcommand.
#[derive(Args)]
pub struct PipelineArgs {
    /// SQLite database path
    #[arg(long, default_value = "teranga.db")]
    pub db: PathBuf,

    /// Directory for the exported CSV files
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,
}

pub fn run(args: &PipelineArgs) -> Result<()> {
    let mut db = Db::open(&args.db)?;
    db.init()?;

    eprintln!(
        "Refining {} into {}",
        args.db.display(),
        args.out_dir.display()
    );

    let report = pipeline::run(&mut db, &args.out_dir)?;

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    eprintln!(
        "Pipeline complete: {} players, {} matches, {} performances, {} KPI rows",
        report.players, report.matches, report.performances, report.kpis
    );
    Ok(())
}
