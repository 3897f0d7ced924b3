//! Career and season statistics extraction.
//!
//! Totals come from the performance-detail page's summary table. Columns
//! are located by header label when the headers are readable, falling back
//! to the historical column positions when they are not (the source often
//! renders headers as bare icons).

use scraper::{ElementRef, Html};

use crate::errors::ScrapeError;
use crate::profile::{element_text, sel, ProfileScraper};
use crate::text::{clean_text, parse_count};

/// Aggregated totals for one player over a career or a single season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub matches: i64,
    pub goals: i64,
    pub assists: i64,
    pub minutes_played: i64,
}

impl Totals {
    /// Minutes are approximated as matches x 90; the summary table does
    /// not expose a reliable minutes column.
    pub fn new(matches: i64, goals: i64, assists: i64) -> Self {
        Self {
            matches,
            goals,
            assists,
            minutes_played: matches * 90,
        }
    }
}

/// Column indices for the totals row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    matches: usize,
    goals: usize,
    assists: usize,
}

/// Historical positions of the totals columns, used when the header row
/// cannot be interpreted.
const FALLBACK_COLUMNS: ColumnMap = ColumnMap {
    matches: 4,
    goals: 7,
    assists: 8,
};

const MATCH_HEADERS: [&str; 3] = ["matchs", "matches", "apparitions"];
const GOAL_HEADERS: [&str; 2] = ["buts", "goals"];
const ASSIST_HEADERS: [&str; 3] = ["passes décisives", "passes", "assists"];

/// Derives the performance-detail URL from a profile URL.
///
/// `season` is a start year such as `"2024"`; `None` spans the whole
/// career (the source treats an empty season segment as "all seasons").
pub fn stats_url(profile_url: &str, season: Option<&str>) -> String {
    let detail = profile_url.replace("/profil/", "/leistungsdatendetails/");
    format!(
        "{}/saison/{}/verein/0/liga/0/wettbewerb//pos/0/trainer_id/0/plus/1",
        detail,
        season.unwrap_or("")
    )
}

impl ProfileScraper {
    /// Fetches the totals for one player, over the whole career or one
    /// season. `Ok(None)` means the page had no usable statistics table,
    /// which is a normal outcome for players without recorded matches.
    pub async fn fetch_totals(
        &self,
        profile_url: &str,
        season: Option<&str>,
    ) -> Result<Option<Totals>, ScrapeError> {
        let url = stats_url(profile_url, season);
        let html = self.fetch_with_retry(&url, true).await?;
        parse_totals(&html)
    }
}

pub(crate) fn parse_totals(html: &str) -> Result<Option<Totals>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table_selector = sel("table.items")?;
    let Some(table) = doc.select(&table_selector).next() else {
        return Ok(None);
    };

    let columns = header_columns(&table)?.unwrap_or(FALLBACK_COLUMNS);

    // The footer totals row is authoritative when it shows any matches.
    let footer_selector = sel("tfoot td")?;
    let footer: Vec<i64> = table
        .select(&footer_selector)
        .map(|cell| parse_count(&element_text(&cell)))
        .collect();
    if !footer.is_empty() {
        let matches = footer.get(columns.matches).copied().unwrap_or(0);
        if matches > 0 {
            let goals = footer.get(columns.goals).copied().unwrap_or(0);
            let assists = footer.get(columns.assists).copied().unwrap_or(0);
            return Ok(Some(Totals::new(matches, goals, assists)));
        }
    }

    // No usable footer: sum the per-competition rows instead.
    let row_selector = sel("tbody tr")?;
    let cell_selector = sel("td")?;
    let mut matches = 0;
    let mut goals = 0;
    let mut assists = 0;
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() >= 5 {
            matches += parse_count(&element_text(&cells[1]));
            goals += parse_count(&element_text(&cells[3]));
            assists += parse_count(&element_text(&cells[4]));
        }
    }
    if matches > 0 {
        return Ok(Some(Totals::new(matches, goals, assists)));
    }

    Ok(None)
}

/// Maps totals columns by header label. Labels are read from the `title`
/// attribute first (icon headers), then from the cell text. Returns `None`
/// unless all three columns were identified.
fn header_columns(table: &ElementRef) -> Result<Option<ColumnMap>, ScrapeError> {
    let head_selector = sel("thead th")?;
    let mut matches = None;
    let mut goals = None;
    let mut assists = None;

    for (idx, th) in table.select(&head_selector).enumerate() {
        let label = th
            .value()
            .attr("title")
            .and_then(clean_text)
            .or_else(|| clean_text(&element_text(&th)))
            .map(|s| s.to_lowercase());
        let Some(label) = label else { continue };

        if matches.is_none() && MATCH_HEADERS.contains(&label.as_str()) {
            matches = Some(idx);
        } else if goals.is_none() && GOAL_HEADERS.contains(&label.as_str()) {
            goals = Some(idx);
        } else if assists.is_none() && ASSIST_HEADERS.contains(&label.as_str()) {
            assists = Some(idx);
        }
    }

    Ok(match (matches, goals, assists) {
        (Some(matches), Some(goals), Some(assists)) => Some(ColumnMap {
            matches,
            goals,
            assists,
        }),
        _ => None,
    })
}
