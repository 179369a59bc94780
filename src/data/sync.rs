//! Sync local players with an FPL bootstrap snapshot
//!
//! Upserts the official teams, reconciles every local player name against
//! the snapshot's elements and writes the matched team and element id back.

use crate::data::fpl::Bootstrap;
use crate::data::Database;
use crate::matching::{reconcile, MatchIndex};
use crate::{PlayerId, Position, Result, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Report matches without touching the database
    pub dry_run: bool,
}

/// Outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    pub teams_upserted: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    /// Rows actually written (zero on a dry run)
    pub updated: usize,
    pub unmatched_names: Vec<(PlayerId, String)>,
}

/// Reconcile all local players against `bootstrap` and persist the results
///
/// A match whose team is missing from the snapshot's team list counts as
/// unmatched. All writes happen in a single transaction.
pub fn sync_player_teams(
    db: &mut Database,
    bootstrap: &Bootstrap,
    options: SyncOptions,
) -> Result<SyncSummary> {
    let index = MatchIndex::build(&bootstrap.catalog());
    let players = db.get_all_players()?;
    log::info!(
        "Reconciling {} local players against {} FPL players",
        players.len(),
        index.len()
    );

    let report = reconcile(&index, &players);

    let mut summary = SyncSummary {
        unmatched: report.unmatched,
        unmatched_names: report.unmatched_names,
        ..SyncSummary::default()
    };

    let names: std::collections::HashMap<PlayerId, &str> =
        players.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut writes = Vec::with_capacity(report.assignments.len());
    for assignment in report.assignments {
        match bootstrap.team(assignment.team) {
            Some(team) => writes.push((assignment, to_team(team))),
            None => {
                log::warn!(
                    "{} matched {} but {} is not in the snapshot",
                    assignment.player,
                    assignment.element,
                    assignment.team
                );
                summary.unmatched += 1;
                let name = names.get(&assignment.player).copied().unwrap_or_default();
                summary
                    .unmatched_names
                    .push((assignment.player, name.to_string()));
            }
        }
    }
    summary.matched = writes.len();
    summary.ambiguous = writes.iter().filter(|(a, _)| a.ambiguous).count();

    if options.dry_run {
        log::info!("Dry run: {} matches not written", writes.len());
        return Ok(summary);
    }

    let (teams_upserted, updated) = db.transaction(|db| {
        let teams = db.upsert_teams(&bootstrap.teams)?;
        for (assignment, team) in &writes {
            db.apply_assignment(assignment.player, team, assignment.element)?;
        }
        Ok((teams, writes.len()))
    })?;

    summary.teams_upserted = teams_upserted;
    summary.updated = updated;
    log::info!(
        "Updated {} players ({} unmatched, {} ambiguous)",
        summary.updated,
        summary.unmatched,
        summary.ambiguous
    );
    Ok(summary)
}

fn to_team(api: &crate::data::fpl::ApiTeam) -> Team {
    Team {
        id: TeamId(api.id),
        name: api.name.clone(),
        short_name: api.short_name.clone(),
        code: api.code,
        strength: api.strength,
    }
}

/// Entry of a player import file
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSeed {
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
}

/// Seed the local store from a JSON array of `{ "name", "position" }`
///
/// Existing players (same name) are left as they are. Returns the number of
/// entries processed.
pub fn import_players<P: AsRef<Path>>(db: &mut Database, path: P) -> Result<usize> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let seeds: Vec<PlayerSeed> = serde_json::from_str(&content)?;

    db.transaction(|db| {
        let mut count = 0;
        for seed in &seeds {
            let name = seed.name.trim();
            if name.is_empty() {
                log::warn!("Skipping player with empty name");
                continue;
            }
            let position = seed.position.as_deref().and_then(Position::from_code);
            if position.is_none() && seed.position.is_some() {
                log::warn!("Unknown position {:?} for {}", seed.position, name);
            }
            db.add_player(name, position)?;
            count += 1;
        }
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fpl::{ApiElement, ApiTeam};
    use crate::ElementId;

    fn bootstrap() -> Bootstrap {
        let team = |id: i64, name: &str, short: &str| ApiTeam {
            id,
            name: name.to_string(),
            short_name: short.to_string(),
            code: id,
            strength: 4,
        };
        let element = |id: i64, first: &str, second: &str, web: &str, team: i64| ApiElement {
            id,
            first_name: first.to_string(),
            second_name: second.to_string(),
            web_name: web.to_string(),
            team,
        };
        Bootstrap {
            teams: vec![team(12, "Liverpool", "LIV"), team(13, "Man City", "MCI")],
            elements: vec![
                element(328, "Mohamed", "Salah", "Salah", 12),
                element(401, "Erling", "Haaland", "Haaland", 13),
                element(999, "Lost", "Loanee", "Loanee", 77),
            ],
        }
    }

    fn seeded_db(names: &[&str]) -> Database {
        let db = Database::in_memory().unwrap();
        for name in names {
            db.add_player(name, None).unwrap();
        }
        db
    }

    #[test]
    fn test_sync_writes_matches() {
        let mut db = seeded_db(&["M.Salah", "Unknown Person", "Haaland"]);

        let summary = sync_player_teams(&mut db, &bootstrap(), SyncOptions::default()).unwrap();

        assert_eq!(summary.teams_upserted, 2);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.unmatched_names[0].1, "Unknown Person");

        let salah = db.find_player_by_name("M.Salah").unwrap().unwrap();
        assert_eq!(salah.team.as_deref(), Some("Liverpool"));
        assert_eq!(salah.team_id, Some(TeamId(12)));
        assert_eq!(salah.fpl_element_id, Some(ElementId(328)));

        let unknown = db.find_player_by_name("Unknown Person").unwrap().unwrap();
        assert_eq!(unknown.team_id, None);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut db = seeded_db(&["M.Salah", "Haaland"]);

        let summary =
            sync_player_teams(&mut db, &bootstrap(), SyncOptions { dry_run: true }).unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.teams_upserted, 0);
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 0);
        assert_eq!(stats.players_with_team, 0);
    }

    #[test]
    fn test_match_with_unknown_team_counts_unmatched() {
        let mut db = seeded_db(&["Loanee"]);

        let summary = sync_player_teams(&mut db, &bootstrap(), SyncOptions::default()).unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.unmatched_names, vec![(PlayerId(1), "Loanee".to_string())]);
        assert_eq!(summary.updated, 0);
    }

    #[test]
    fn test_ambiguous_match_with_unknown_team_is_not_counted_ambiguous() {
        let mut snapshot = bootstrap();
        snapshot.elements = vec![
            ApiElement {
                id: 10,
                first_name: "Ben".to_string(),
                second_name: "White".to_string(),
                web_name: "White".to_string(),
                team: 77,
            },
            ApiElement {
                id: 11,
                first_name: "Harvey".to_string(),
                second_name: "White".to_string(),
                web_name: "White".to_string(),
                team: 12,
            },
        ];
        let mut db = seeded_db(&["White"]);

        let summary = sync_player_teams(&mut db, &snapshot, SyncOptions::default()).unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.ambiguous, 0);
        assert!(summary.ambiguous <= summary.matched);
    }

    #[test]
    fn test_ambiguous_counted_among_written_matches() {
        let mut snapshot = bootstrap();
        snapshot.elements.push(ApiElement {
            id: 500,
            first_name: "Mohamed".to_string(),
            second_name: "Salah".to_string(),
            web_name: "Salah".to_string(),
            team: 13,
        });
        let mut db = seeded_db(&["M.Salah", "Haaland"]);

        let summary = sync_player_teams(&mut db, &snapshot, SyncOptions::default()).unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.ambiguous, 1);
    }

    #[test]
    fn test_sync_is_repeatable() {
        let mut db = seeded_db(&["M.Salah"]);
        let snapshot = bootstrap();
        let first = sync_player_teams(&mut db, &snapshot, SyncOptions::default()).unwrap();
        let second = sync_player_teams(&mut db, &snapshot, SyncOptions::default()).unwrap();
        assert_eq!(first.matched, second.matched);
        assert_eq!(db.get_all_teams().unwrap().len(), 2);
    }

    #[test]
    fn test_import_players() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.json");
        std::fs::write(
            &path,
            r#"[
                { "name": "M.Salah", "position": "MID" },
                { "name": "Haaland", "position": "FWD" },
                { "name": "  " },
                { "name": "Raya", "position": "keeper" },
                { "name": "M.Salah" }
            ]"#,
        )
        .unwrap();

        let mut db = Database::in_memory().unwrap();
        let count = import_players(&mut db, &path).unwrap();
        assert_eq!(count, 4);

        let players = db.get_all_players().unwrap();
        assert_eq!(players.len(), 3);
        assert_eq!(players[0].position, Some(Position::Midfielder));
        assert_eq!(players[2].name, "Raya");
        assert_eq!(players[2].position, None);
    }
}
