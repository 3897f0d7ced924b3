use std::fs;
use std::path::{Path, PathBuf};

use teranga_lib::db::Db;
use teranga_lib::pipeline;
use teranga_lib::teranga_scraper::{PlayerProfile, Totals};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "teranga-pipeline-{}-{}",
        tag,
        std::process::id()
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    dir
}

fn seeded_db() -> Db {
    let mut db = Db::open_in_memory().unwrap();
    db.init().unwrap();

    let mane = PlayerProfile {
        url: "http://x/sadio-mane/profil/spieler/200512".to_string(),
        name: Some("sadio mané".to_string()),
        nationality: Some("sénégal".to_string()),
        position: Some("Position: Attaquant".to_string()),
        current_club: Some("al-nassr fc".to_string()),
        ..PlayerProfile::default()
    };
    db.persist_player(&mane, Some(&Totals::new(3, 3, 2))).unwrap();

    // A profile that yielded nothing beyond its name.
    let bare = PlayerProfile {
        url: "http://x/pape-gueye/profil/spieler/2".to_string(),
        name: Some("pape gueye".to_string()),
        ..PlayerProfile::default()
    };
    db.persist_player(&bare, None).unwrap();

    // Fixture rows plus the kind of mess older tooling left behind: an
    // exact duplicate match and a performance pointing at no player.
    db.conn()
        .execute_batch(
            "PRAGMA foreign_keys = OFF;
             INSERT INTO matches (date, home_team, away_team, home_score, away_score, competition)
             VALUES ('2024-09-15', 'al-nassr', 'al-hilal', 2, 1, 'Saudi Pro League');
             INSERT INTO matches (date, home_team, away_team, home_score, away_score, competition)
             VALUES ('2024-09-15', 'al-nassr', 'al-hilal', 2, 1, 'Saudi Pro League');
             INSERT INTO performances (player_id, match_id, minutes_played, goals, assists)
             VALUES (99, 1, 90, 1, 0);
             PRAGMA foreign_keys = ON;",
        )
        .unwrap();

    db
}

fn csv_snapshot(dir: &Path) -> Vec<String> {
    [
        dir.join("players_clean.csv"),
        dir.join("matches_clean.csv"),
        dir.join("performances_clean.csv"),
        dir.join("processed").join("players_kpis.csv"),
    ]
    .iter()
    .map(|path| fs::read_to_string(path).unwrap())
    .collect()
}

#[test]
fn full_run_publishes_clean_tables_and_kpis() {
    let mut db = seeded_db();
    let dir = scratch_dir("full");

    let report = pipeline::run(&mut db, &dir).unwrap();

    assert_eq!(report.players, 2);
    assert_eq!(report.matches, 1);
    assert_eq!(report.performances, 2);
    assert_eq!(report.kpis, 2);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("unknown player 99"));

    let (name, position, club): (String, String, String) = db
        .conn()
        .query_row(
            "SELECT name, position, current_club FROM players_clean WHERE player_id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(name, "Sadio Mané");
    assert_eq!(position, "attaquant");
    assert_eq!(club, "Al-Nassr Fc");

    let (bare_club, bare_competition): (String, String) = db
        .conn()
        .query_row(
            "SELECT current_club, current_competition FROM players_clean WHERE player_id = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(bare_club, "Non Défini");
    assert_eq!(bare_competition, "Non défini");

    let (season, home_team): (Option<String>, String) = db
        .conn()
        .query_row(
            "SELECT season, home_team FROM matches_clean WHERE match_id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(season.as_deref(), Some("2024/2025"));
    assert_eq!(home_team, "Al-Nassr");

    let (nb_matches, efficiency): (i64, f64) = db
        .conn()
        .query_row(
            "SELECT nb_matches, efficiency FROM players_kpis WHERE player_id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(nb_matches, 4);
    assert_eq!(efficiency, 125.0);

    let (bare_matches, bare_efficiency): (i64, f64) = db
        .conn()
        .query_row(
            "SELECT nb_matches, efficiency FROM players_kpis WHERE player_id = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(bare_matches, 0);
    assert_eq!(bare_efficiency, 0.0);

    assert!(dir.join("processed").join("players_kpis.csv").is_file());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rerun_over_the_same_data_is_byte_identical() {
    let mut db = seeded_db();
    let dir = scratch_dir("stable");

    pipeline::run(&mut db, &dir).unwrap();
    let first = csv_snapshot(&dir);
    pipeline::run(&mut db, &dir).unwrap();
    let second = csv_snapshot(&dir);

    assert_eq!(first, second);

    let players_clean: i64 = db
        .conn()
        .query_row("SELECT COUNT(1) FROM players_clean", [], |row| row.get(0))
        .unwrap();
    assert_eq!(players_clean, 2);

    fs::remove_dir_all(&dir).unwrap();
}
