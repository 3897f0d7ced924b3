//! The `scrape` subcommand: work through a list of player pages and ingest
//! profiles and career totals into SQLite.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use teranga_lib::db::Db;
use teranga_lib::teranga_scraper::{
    FetchClient, ProfileScraper, RequestPolicy, RotatingIdentity,
};

/// Arguments for the `scrape` subcommand.
#[derive(Args)]
pub struct ScrapeArgs {
    /// CSV work list with a `url` column, one player page per row
    #[arg(long, default_value = "data/raw/players_list.csv")]
    pub input: PathBuf,

    /// SQLite database path
    #[arg(long, default_value = "teranga.db")]
    pub db: PathBuf,

    /// Season start year to restrict totals to (whole career by default)
    #[arg(long)]
    pub season: Option<String>,

    /// Nationality substring a player must carry to be persisted
    #[arg(long, default_value = "Sénégal")]
    pub nationality: String,
}

/// Per-item counters for one batch run.
#[derive(Debug, Default, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub ineligible: usize,
    pub failed: usize,
}

pub async fn run(args: &ScrapeArgs, base_url: Option<&str>) -> Result<BatchReport> {
    let policy: Arc<dyn RequestPolicy> = Arc::new(RotatingIdentity::from_env());
    run_with_policy(args, base_url, policy).await
}

pub(crate) async fn run_with_policy(
    args: &ScrapeArgs,
    base_url: Option<&str>,
    policy: Arc<dyn RequestPolicy>,
) -> Result<BatchReport> {
    let urls = read_work_list(&args.input)?;
    if urls.is_empty() {
        eprintln!("Work list {} holds no usable rows", args.input.display());
        return Ok(BatchReport::default());
    }

    let mut db = Db::open(&args.db)?;
    db.init()?;

    let client = FetchClient::new(policy.clone())?;
    let scraper = match base_url
        .map(str::to_string)
        .or_else(|| std::env::var("TERANGA_BASE_URL").ok())
    {
        Some(base) => ProfileScraper::with_base_url(client, policy.clone(), &base),
        None => ProfileScraper::new(client, policy.clone()),
    };

    eprintln!("Scraping {} players into {}", urls.len(), args.db.display());

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}",
        )
        .unwrap(),
    );

    let mut report = BatchReport::default();
    let last = urls.len() - 1;
    for (idx, url) in urls.iter().enumerate() {
        match process_item(&scraper, &mut db, url, args).await {
            Ok(ItemOutcome::Persisted(name)) => {
                report.processed += 1;
                pb.println(format!("stored {}", name));
            }
            Ok(ItemOutcome::Ineligible(name)) => {
                report.ineligible += 1;
                pb.println(format!("skipped {} (outside scope)", name));
            }
            Err(err) => {
                report.failed += 1;
                pb.println(format!("failed {}: {}", url, err));
            }
        }
        pb.inc(1);

        // Pause between items, not after the final one.
        if idx != last {
            tokio::time::sleep(policy.item_delay()).await;
        }
    }
    pb.finish_and_clear();

    eprintln!(
        "Scrape complete: {} stored, {} outside scope, {} failed",
        report.processed, report.ineligible, report.failed
    );
    Ok(report)
}

enum ItemOutcome {
    Persisted(String),
    Ineligible(String),
}

/// One work-list item: profile, name check, eligibility, totals,
/// persistence. A page that yields no player name fails the item before
/// eligibility is judged; a totals page that cannot be fetched degrades to
/// an absent value and the profile is still stored.
async fn process_item(
    scraper: &ProfileScraper,
    db: &mut Db,
    url: &str,
    args: &ScrapeArgs,
) -> Result<ItemOutcome> {
    let profile = scraper.fetch_profile(url).await?;
    let Some(name) = profile.name.clone() else {
        return Err(anyhow!("page at {} yielded no player name", url));
    };

    let eligible = profile
        .nationality
        .as_deref()
        .is_some_and(|n| n.contains(&args.nationality));
    if !eligible {
        return Ok(ItemOutcome::Ineligible(name));
    }

    let totals = match scraper.fetch_totals(url, args.season.as_deref()).await {
        Ok(totals) => totals,
        Err(err) => {
            eprintln!("Career totals for {} unavailable: {}", url, err);
            None
        }
    };

    db.persist_player(&profile, totals.as_ref())?;
    Ok(ItemOutcome::Persisted(name))
}

fn read_work_list(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open work list {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let url_column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("url"))
        .ok_or_else(|| anyhow!("work list {} has no url column", path.display()))?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.get(url_column) {
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    Ok(urls)
}
