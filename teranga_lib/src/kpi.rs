//! Player KPIs computed over the cleaned dataset.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cleaning::{CleanPerformance, CleanPlayer};

/// One KPI row per player, in the published column order. Rows are ordered
/// by `player_id`, so regenerating over the same data produces identical
/// output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerKpi {
    pub player_id: i64,
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub nb_matches: i64,
    pub efficiency: f64,
    pub score_global: f64,
}

/// Computes one KPI row per cleaned player. Players without any recorded
/// performance get a zeroed row rather than disappearing.
pub fn compute_kpis(players: &[CleanPlayer], performances: &[CleanPerformance]) -> Vec<PlayerKpi> {
    let mut sums: BTreeMap<i64, (i64, i64, i64)> = BTreeMap::new();
    for perf in performances {
        let entry = sums.entry(perf.player_id).or_default();
        entry.0 += perf.minutes_played;
        entry.1 += perf.goals;
        entry.2 += perf.assists;
    }

    let ids: BTreeSet<i64> = players.iter().map(|p| p.player_id).collect();

    let mut kpis = Vec::with_capacity(ids.len());
    for player_id in ids {
        let (minutes, goals, assists) = sums.get(&player_id).copied().unwrap_or((0, 0, 0));
        let nb_matches = estimate_matches(minutes);
        let efficiency = if nb_matches == 0 {
            0.0
        } else {
            round2((goals + assists) as f64 / nb_matches as f64 * 100.0)
        };
        kpis.push(PlayerKpi {
            player_id,
            minutes_played: minutes,
            goals,
            assists,
            nb_matches,
            efficiency,
            score_global: efficiency,
        });
    }
    kpis
}

/// Estimated appearances for a minute total: zero minutes means none,
/// otherwise one more than the number of full 90-minute blocks. A partial
/// appearance still counts as one.
fn estimate_matches(minutes: i64) -> i64 {
    if minutes <= 0 {
        0
    } else {
        minutes / 90 + 1
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
