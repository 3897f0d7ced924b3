//! Cleaning stage: deduplication, defaults, normalization and referential
//! checks over the raw scraped tables.
//!
//! Cleaning never drops a row for being incomplete. Duplicates go, absent
//! text and performance numbers get documented defaults, text is normalized
//! to one casing, and anything suspicious (a dangling reference, a negative
//! score) is reported as a warning for the caller to surface. Defaults are
//! filled before normalization, so they come out the other side in
//! normalized casing like every real value. Match scores carry no default
//! and stay absent when the source never had them.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::{MatchRecord, PerformanceRecord, PlayerRecord};

/// Position assumed when a profile never yielded one.
pub const DEFAULT_POSITION: &str = "Position: Attaquant";
/// Placeholder for absent club, competition and country fields.
pub const DEFAULT_TEXT: &str = "Non défini";
/// Placeholder for an absent match competition.
pub const DEFAULT_MATCH_COMPETITION: &str = "Inconnue";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanPlayer {
    pub player_id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub position: String,
    pub current_club: String,
    pub current_competition: String,
    pub competition_country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanMatch {
    pub match_id: i64,
    pub date: Option<NaiveDate>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    /// Scores stay absent when the source page never carried them.
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub competition: String,
    pub season: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanPerformance {
    pub perf_id: i64,
    pub player_id: i64,
    pub match_id: Option<i64>,
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    /// Carried over from the player row for flat consumption of the CSV.
    pub position: Option<String>,
    pub current_club: Option<String>,
}

/// Output of one cleaning pass.
#[derive(Debug, Default)]
pub struct CleanDataset {
    pub players: Vec<CleanPlayer>,
    pub matches: Vec<CleanMatch>,
    pub performances: Vec<CleanPerformance>,
    pub warnings: Vec<String>,
}

/// Cleans the three raw tables. Input order is preserved, which makes the
/// first-occurrence rule of deduplication deterministic.
pub fn clean(
    players: Vec<PlayerRecord>,
    matches: Vec<MatchRecord>,
    performances: Vec<PerformanceRecord>,
) -> CleanDataset {
    let players = dedupe_players(players);
    let matches = dedupe_matches(matches);
    let performances = dedupe_performances(performances);

    let players: Vec<CleanPlayer> = players.into_iter().map(clean_player).collect();
    let matches: Vec<CleanMatch> = matches.into_iter().map(clean_match).collect();

    let by_player: HashMap<i64, (String, String)> = players
        .iter()
        .map(|p| (p.player_id, (p.position.clone(), p.current_club.clone())))
        .collect();
    let performances: Vec<CleanPerformance> = performances
        .into_iter()
        .map(|raw| clean_performance(raw, &by_player))
        .collect();

    let warnings = collect_warnings(&players, &matches, &performances);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    CleanDataset {
        players,
        matches,
        performances,
        warnings,
    }
}

fn dedupe_players(players: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    let before = players.len();
    let mut seen = HashSet::new();
    let kept: Vec<PlayerRecord> = players
        .into_iter()
        .filter(|p| seen.insert(p.name.clone()))
        .collect();
    log_dropped("player", before - kept.len());
    kept
}

fn dedupe_matches(matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let before = matches.len();
    let mut seen = HashSet::new();
    // Absent date or team names compare equal to each other here: two
    // all-unknown fixtures are one fixture, not two.
    let kept: Vec<MatchRecord> = matches
        .into_iter()
        .filter(|m| seen.insert((m.date.clone(), m.home_team.clone(), m.away_team.clone())))
        .collect();
    log_dropped("match", before - kept.len());
    kept
}

fn dedupe_performances(performances: Vec<PerformanceRecord>) -> Vec<PerformanceRecord> {
    let before = performances.len();
    let mut seen = HashSet::new();
    let kept: Vec<PerformanceRecord> = performances
        .into_iter()
        .filter(|p| seen.insert((p.player_id, p.match_id)))
        .collect();
    log_dropped("performance", before - kept.len());
    kept
}

fn log_dropped(kind: &str, dropped: usize) {
    if dropped > 0 {
        tracing::info!("dropped {} duplicate {} row(s)", dropped, kind);
    }
}

fn clean_player(raw: PlayerRecord) -> CleanPlayer {
    let position = raw
        .position
        .unwrap_or_else(|| DEFAULT_POSITION.to_string());
    let current_club = raw
        .current_club
        .unwrap_or_else(|| DEFAULT_TEXT.to_string());
    CleanPlayer {
        player_id: raw.player_id,
        name: title_case(&raw.name),
        birth_date: raw.birth_date.as_deref().and_then(parse_iso_date),
        nationality: raw.nationality.as_deref().map(title_case),
        position: normalize_position(&position),
        current_club: title_case(&current_club),
        current_competition: raw
            .current_competition
            .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
        competition_country: raw
            .competition_country
            .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
    }
}

fn clean_match(raw: MatchRecord) -> CleanMatch {
    let date = raw.date.as_deref().and_then(parse_iso_date);
    CleanMatch {
        match_id: raw.match_id,
        date,
        home_team: raw.home_team.as_deref().map(title_case),
        away_team: raw.away_team.as_deref().map(title_case),
        home_score: raw.home_score,
        away_score: raw.away_score,
        competition: raw
            .competition
            .unwrap_or_else(|| DEFAULT_MATCH_COMPETITION.to_string()),
        season: date.map(season_label),
    }
}

fn clean_performance(
    raw: PerformanceRecord,
    by_player: &HashMap<i64, (String, String)>,
) -> CleanPerformance {
    let enriched = by_player.get(&raw.player_id);
    CleanPerformance {
        perf_id: raw.perf_id,
        player_id: raw.player_id,
        match_id: raw.match_id,
        minutes_played: raw.minutes_played.unwrap_or(0),
        goals: raw.goals.unwrap_or(0),
        assists: raw.assists.unwrap_or(0),
        position: enriched.map(|(position, _)| position.clone()),
        current_club: enriched.map(|(_, club)| club.clone()),
    }
}

fn collect_warnings(
    players: &[CleanPlayer],
    matches: &[CleanMatch],
    performances: &[CleanPerformance],
) -> Vec<String> {
    let player_ids: HashSet<i64> = players.iter().map(|p| p.player_id).collect();
    let match_ids: HashSet<i64> = matches.iter().map(|m| m.match_id).collect();

    let mut warnings = Vec::new();
    for perf in performances {
        if !player_ids.contains(&perf.player_id) {
            warnings.push(format!(
                "performance {} references unknown player {}",
                perf.perf_id, perf.player_id
            ));
        }
        // An absent match reference is the aggregate row, not a dangling one.
        if let Some(match_id) = perf.match_id {
            if !match_ids.contains(&match_id) {
                warnings.push(format!(
                    "performance {} references unknown match {}",
                    perf.perf_id, match_id
                ));
            }
        }
    }
    for m in matches {
        if m.home_score.is_some_and(|s| s < 0) || m.away_score.is_some_and(|s| s < 0) {
            warnings.push(format!("match {} has a negative score", m.match_id));
        }
    }
    warnings
}

/// Word-wise capitalization: the first letter after any non-letter is
/// uppercased, everything else lowercased. "FC METZ" becomes "Fc Metz" and
/// "cote d'ivoire" becomes "Cote D'Ivoire"; published data has always used
/// this casing, so it stays.
pub(crate) fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Drops the "Position:" label and normalizes to lowercase.
fn normalize_position(raw: &str) -> String {
    raw.replace("Position:", "").trim().to_lowercase()
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Season label for a match date: a 2024 fixture belongs to "2024/2025".
fn season_label(date: NaiveDate) -> String {
    let year = date.year();
    format!("{}/{}", year, year + 1)
}
