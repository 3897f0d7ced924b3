//! SQLite storage for scraped player data and the published clean tables.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use teranga_scraper::{PlayerProfile, Totals};

use crate::cleaning::CleanDataset;
use crate::kpi::PlayerKpi;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The profile never yielded a name, which is the one field a player
    /// row cannot exist without.
    #[error("profile for {url} has no usable name")]
    MissingName { url: String },
}

/// A raw player row as scraped, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_id: i64,
    pub name: String,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub current_club: Option<String>,
    pub current_competition: Option<String>,
    pub competition_country: Option<String>,
}

/// A raw match row, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_id: i64,
    pub date: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub competition: Option<String>,
}

/// A raw performance row, before cleaning. `match_id` is absent on the
/// aggregate career row.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub perf_id: i64,
    pub player_id: i64,
    pub match_id: Option<i64>,
    pub minutes_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for internal use by the pipeline and tests).
    #[doc(hidden)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn init(&self) -> Result<(), DbError> {
        // The version gate is where future ALTERs go; the schema file
        // itself only creates what is missing.
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < 1 {
            self.conn.pragma_update(None, "user_version", 1)?;
        }

        Ok(())
    }

    /// Persists one player's profile and aggregate totals in a single
    /// transaction.
    ///
    /// The player row is keyed by the exact scraped name: a rescrape
    /// updates the existing row, and an absent field never overwrites a
    /// value a previous run captured. Totals land in the aggregate
    /// performance row (the one with no match reference), updated in
    /// place rather than appended.
    pub fn persist_player(
        &mut self,
        profile: &PlayerProfile,
        totals: Option<&Totals>,
    ) -> Result<i64, DbError> {
        let name = profile.name.as_deref().ok_or_else(|| DbError::MissingName {
            url: profile.url.clone(),
        })?;
        let birth_date = profile.birth_date.map(|d| d.format("%Y-%m-%d").to_string());

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO players (
               name,
               birth_date,
               nationality,
               position,
               current_club,
               current_competition,
               competition_country
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(name) DO UPDATE SET
               birth_date = COALESCE(excluded.birth_date, players.birth_date),
               nationality = COALESCE(excluded.nationality, players.nationality),
               position = COALESCE(excluded.position, players.position),
               current_club = COALESCE(excluded.current_club, players.current_club),
               current_competition = COALESCE(excluded.current_competition, players.current_competition),
               competition_country = COALESCE(excluded.competition_country, players.competition_country)",
            params![
                name,
                birth_date,
                profile.nationality,
                profile.position,
                profile.current_club,
                profile.current_competition,
                profile.competition_country
            ],
        )?;

        let player_id: i64 = tx.query_row(
            "SELECT player_id FROM players WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if let Some(totals) = totals {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT perf_id FROM performances
                     WHERE player_id = ?1 AND match_id IS NULL",
                    params![player_id],
                    |row| row.get(0),
                )
                .optional()?;
            match existing {
                Some(perf_id) => {
                    tx.execute(
                        "UPDATE performances
                         SET minutes_played = ?1, goals = ?2, assists = ?3
                         WHERE perf_id = ?4",
                        params![totals.minutes_played, totals.goals, totals.assists, perf_id],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO performances (player_id, match_id, minutes_played, goals, assists)
                         VALUES (?1, NULL, ?2, ?3, ?4)",
                        params![player_id, totals.minutes_played, totals.goals, totals.assists],
                    )?;
                }
            }
        }

        tx.commit()?;
        tracing::debug!("persisted {} as player {}", name, player_id);
        Ok(player_id)
    }

    pub fn load_players(&self) -> Result<Vec<PlayerRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, name, birth_date, nationality, position,
                    current_club, current_competition, competition_country
             FROM players ORDER BY player_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PlayerRecord {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    birth_date: row.get(2)?,
                    nationality: row.get(3)?,
                    position: row.get(4)?,
                    current_club: row.get(5)?,
                    current_competition: row.get(6)?,
                    competition_country: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn load_matches(&self) -> Result<Vec<MatchRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, date, home_team, away_team, home_score, away_score, competition
             FROM matches ORDER BY match_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MatchRecord {
                    match_id: row.get(0)?,
                    date: row.get(1)?,
                    home_team: row.get(2)?,
                    away_team: row.get(3)?,
                    home_score: row.get(4)?,
                    away_score: row.get(5)?,
                    competition: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn load_performances(&self) -> Result<Vec<PerformanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT perf_id, player_id, match_id, minutes_played, goals, assists
             FROM performances ORDER BY perf_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PerformanceRecord {
                    perf_id: row.get(0)?,
                    player_id: row.get(1)?,
                    match_id: row.get(2)?,
                    minutes_played: row.get(3)?,
                    goals: row.get(4)?,
                    assists: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replaces the published clean tables and the KPI table in one
    /// transaction, so a rerun never leaves stale rows behind and readers
    /// never see a half-published state.
    ///
    /// `performances_clean` deliberately carries no foreign keys: rows
    /// with dangling references are published with their warnings, not
    /// rejected.
    pub fn publish(&mut self, dataset: &CleanDataset, kpis: &[PlayerKpi]) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "DROP TABLE IF EXISTS players_kpis;
             DROP TABLE IF EXISTS performances_clean;
             DROP TABLE IF EXISTS matches_clean;
             DROP TABLE IF EXISTS players_clean;
             CREATE TABLE players_clean (
               player_id INTEGER PRIMARY KEY,
               name TEXT NOT NULL,
               birth_date TEXT,
               nationality TEXT,
               position TEXT NOT NULL,
               current_club TEXT NOT NULL,
               current_competition TEXT NOT NULL,
               competition_country TEXT NOT NULL
             );
             CREATE TABLE matches_clean (
               match_id INTEGER PRIMARY KEY,
               date TEXT,
               home_team TEXT,
               away_team TEXT,
               home_score INTEGER,
               away_score INTEGER,
               competition TEXT NOT NULL,
               season TEXT
             );
             CREATE TABLE performances_clean (
               perf_id INTEGER PRIMARY KEY,
               player_id INTEGER NOT NULL,
               match_id INTEGER,
               minutes_played INTEGER NOT NULL,
               goals INTEGER NOT NULL,
               assists INTEGER NOT NULL,
               position TEXT,
               current_club TEXT
             );
             CREATE TABLE players_kpis (
               player_id INTEGER PRIMARY KEY REFERENCES players_clean(player_id),
               minutes_played INTEGER NOT NULL,
               goals INTEGER NOT NULL,
               assists INTEGER NOT NULL,
               nb_matches INTEGER NOT NULL,
               efficiency REAL NOT NULL,
               score_global REAL NOT NULL
             );",
        )?;

        {
            let mut stmt_player = tx.prepare(
                "INSERT INTO players_clean (
                   player_id, name, birth_date, nationality, position,
                   current_club, current_competition, competition_country
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for p in &dataset.players {
                stmt_player.execute(params![
                    p.player_id,
                    p.name,
                    p.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    p.nationality,
                    p.position,
                    p.current_club,
                    p.current_competition,
                    p.competition_country
                ])?;
            }

            let mut stmt_match = tx.prepare(
                "INSERT INTO matches_clean (
                   match_id, date, home_team, away_team,
                   home_score, away_score, competition, season
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for m in &dataset.matches {
                stmt_match.execute(params![
                    m.match_id,
                    m.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    m.home_team,
                    m.away_team,
                    m.home_score,
                    m.away_score,
                    m.competition,
                    m.season
                ])?;
            }

            let mut stmt_perf = tx.prepare(
                "INSERT INTO performances_clean (
                   perf_id, player_id, match_id, minutes_played,
                   goals, assists, position, current_club
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for p in &dataset.performances {
                stmt_perf.execute(params![
                    p.perf_id,
                    p.player_id,
                    p.match_id,
                    p.minutes_played,
                    p.goals,
                    p.assists,
                    p.position,
                    p.current_club
                ])?;
            }

            let mut stmt_kpi = tx.prepare(
                "INSERT INTO players_kpis (
                   player_id, minutes_played, goals, assists,
                   nb_matches, efficiency, score_global
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for k in kpis {
                stmt_kpi.execute(params![
                    k.player_id,
                    k.minutes_played,
                    k.goals,
                    k.assists,
                    k.nb_matches,
                    k.efficiency,
                    k.score_global
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(
            "published {} players, {} matches, {} performances, {} kpi rows",
            dataset.players.len(),
            dataset.matches.len(),
            dataset.performances.len(),
            kpis.len()
        );
        Ok(())
    }
}
