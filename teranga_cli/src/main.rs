mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "teranga")]
#[command(about = "Scrape and refine football player data for Senegalese squads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape player profiles and career totals into SQLite
    Scrape(commands::scrape::ScrapeArgs),
    /// Clean the scraped tables, compute KPIs and export CSVs
    Pipeline(commands::pipeline::PipelineArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("teranga_scraper=info".parse().unwrap())
                .add_directive("teranga_lib=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Scrape(args) => {
            commands::scrape::run(args, None).await?;
        }
        Commands::Pipeline(args) => commands::pipeline::run(args)?,
    }

    Ok(())
}
