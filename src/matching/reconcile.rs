//! Batch reconciliation of local records against one catalog snapshot

use serde::Serialize;

use super::index::MatchIndex;
use crate::{ElementId, Player, PlayerId, TeamId};

/// Anything with an id and a free-text name that can be reconciled
pub trait LocalRecord {
    fn local_id(&self) -> PlayerId;
    fn local_name(&self) -> &str;
}

impl LocalRecord for Player {
    fn local_id(&self) -> PlayerId {
        self.id
    }

    fn local_name(&self) -> &str {
        &self.name
    }
}

impl LocalRecord for (PlayerId, String) {
    fn local_id(&self) -> PlayerId {
        self.0
    }

    fn local_name(&self) -> &str {
        &self.1
    }
}

/// A local record paired with the catalog identity it resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub player: PlayerId,
    pub element: ElementId,
    pub team: TeamId,
    /// The winning bucket held more than one record
    pub ambiguous: bool,
}

/// Outcome of reconciling a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub matched: usize,
    pub unmatched: usize,
    /// Matches taken from a bucket holding several records
    pub ambiguous: usize,
    pub assignments: Vec<Assignment>,
    /// Names that resolved to nothing, in input order
    pub unmatched_names: Vec<(PlayerId, String)>,
}

/// Resolve every local record against the index
///
/// Only computes; writing assignments back is up to the caller.
pub fn reconcile<'a, R, I>(index: &MatchIndex, locals: I) -> ReconcileReport
where
    R: LocalRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut report = ReconcileReport::default();

    for local in locals {
        match index.resolve_detailed(local.local_name()) {
            Some(resolution) => {
                log::debug!(
                    "{:?} -> {} {} via {}",
                    local.local_name(),
                    resolution.record.display_name,
                    resolution.record.team,
                    resolution.step
                );
                if resolution.is_ambiguous() {
                    log::warn!(
                        "{:?} matched {} catalog records, taking {}",
                        local.local_name(),
                        resolution.candidates,
                        resolution.record.id
                    );
                    report.ambiguous += 1;
                }
                report.matched += 1;
                report.assignments.push(Assignment {
                    player: local.local_id(),
                    element: resolution.record.id,
                    team: resolution.record.team,
                    ambiguous: resolution.is_ambiguous(),
                });
            }
            None => {
                log::debug!("{:?} -> no match", local.local_name());
                report.unmatched += 1;
                report
                    .unmatched_names
                    .push((local.local_id(), local.local_name().to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::index::record;

    fn locals(names: &[&str]) -> Vec<(PlayerId, String)> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (PlayerId(i as i64 + 1), n.to_string()))
            .collect()
    }

    #[test]
    fn test_batch_counts() {
        let index = MatchIndex::build(&[
            record(328, "Mohamed", "Salah", "Salah", 12),
            record(401, "Erling", "Haaland", "Haaland", 13),
        ]);
        let players = locals(&["M.Salah", "Unknown Person", "Haaland"]);

        let report = reconcile(&index, &players);

        assert_eq!(report.matched, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.ambiguous, 0);
        assert_eq!(
            report.assignments,
            vec![
                Assignment {
                    player: PlayerId(1),
                    element: ElementId(328),
                    team: TeamId(12),
                    ambiguous: false,
                },
                Assignment {
                    player: PlayerId(3),
                    element: ElementId(401),
                    team: TeamId(13),
                    ambiguous: false,
                },
            ]
        );
        assert_eq!(
            report.unmatched_names,
            vec![(PlayerId(2), "Unknown Person".to_string())]
        );
    }

    #[test]
    fn test_ambiguous_matches_still_count_as_matched() {
        let index = MatchIndex::build(&[
            record(10, "Ben", "White", "White", 1),
            record(11, "Harvey", "White", "White", 9),
        ]);
        let report = reconcile(&index, &locals(&["White"]));
        assert_eq!(report.matched, 1);
        assert_eq!(report.ambiguous, 1);
        assert_eq!(report.assignments[0].team, TeamId(1));
        assert!(report.assignments[0].ambiguous);
    }

    #[test]
    fn test_empty_inputs() {
        let index = MatchIndex::build(&[]);
        let report = reconcile(&index, &locals(&["Salah", ""]));
        assert_eq!(report.matched, 0);
        assert_eq!(report.unmatched, 2);

        let index = MatchIndex::build(&[record(1, "Mohamed", "Salah", "Salah", 12)]);
        let report = reconcile::<(PlayerId, String), _>(&index, &[]);
        assert_eq!(report, ReconcileReport::default());
    }

    #[test]
    fn test_players_are_local_records() {
        let index = MatchIndex::build(&[record(7, "Bukayo", "Saka", "Saka", 1)]);
        let player = Player {
            id: PlayerId(42),
            name: "B. Saka".to_string(),
            position: None,
            team: None,
            team_id: None,
            fpl_element_id: None,
        };
        let report = reconcile(&index, std::slice::from_ref(&player));
        assert_eq!(report.assignments[0].player, PlayerId(42));
        assert_eq!(report.assignments[0].element, ElementId(7));
    }
}
