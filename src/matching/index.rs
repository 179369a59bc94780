//! Lookup index over a catalog snapshot

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::normalize::{first_initial, normalize, split_parts};
use crate::{ElementId, TeamId};

/// One identity from the external catalog (an FPL element)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: ElementId,
    pub first_name: String,
    pub last_name: String,
    /// Short public name, FPL's `web_name`
    pub display_name: String,
    /// Current team affiliation
    pub team: TeamId,
}

/// Buckets of catalog records keyed by folded names
///
/// Built once per snapshot and never mutated afterwards, so a shared
/// reference can be resolved against from several threads. Buckets keep
/// catalog order; the first record of a bucket wins a lookup.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    records: Vec<CatalogRecord>,
    /// Folded display name -> positions in `records`
    by_display: HashMap<String, Vec<usize>>,
    /// "last:initial" -> positions in `records`
    by_last_initial: HashMap<String, Vec<usize>>,
}

impl MatchIndex {
    /// Index a catalog snapshot
    pub fn build(catalog: &[CatalogRecord]) -> Self {
        let mut by_display: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_last_initial: HashMap<String, Vec<usize>> = HashMap::new();

        for (pos, record) in catalog.iter().enumerate() {
            let display = normalize(&record.display_name);
            if !display.is_empty() {
                by_display.entry(display).or_default().push(pos);
            }

            let full = format!("{} {}", record.first_name, record.last_name);
            let (_, last) = split_parts(&full);
            if !last.is_empty() {
                let key = last_initial_key(&last, &first_initial(&record.first_name));
                by_last_initial.entry(key).or_default().push(pos);
            }
        }

        log::debug!(
            "Indexed {} catalog records ({} display keys, {} surname keys)",
            catalog.len(),
            by_display.len(),
            by_last_initial.len()
        );

        MatchIndex {
            records: catalog.to_vec(),
            by_display,
            by_last_initial,
        }
    }

    /// Number of records in the snapshot
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sharing a folded display name, in catalog order
    pub fn display_bucket(&self, key: &str) -> Vec<&CatalogRecord> {
        self.bucket(&self.by_display, key)
    }

    /// Records sharing a "last:initial" key, in catalog order
    pub fn last_initial_bucket(&self, key: &str) -> Vec<&CatalogRecord> {
        self.bucket(&self.by_last_initial, key)
    }

    /// First record of a display bucket and the bucket size
    pub(crate) fn first_by_display(&self, key: &str) -> Option<(&CatalogRecord, usize)> {
        self.first_in(&self.by_display, key)
    }

    /// First record of a surname bucket and the bucket size
    pub(crate) fn first_by_last_initial(&self, key: &str) -> Option<(&CatalogRecord, usize)> {
        self.first_in(&self.by_last_initial, key)
    }

    fn bucket(&self, map: &HashMap<String, Vec<usize>>, key: &str) -> Vec<&CatalogRecord> {
        map.get(key)
            .map(|positions| positions.iter().map(|&p| &self.records[p]).collect())
            .unwrap_or_default()
    }

    fn first_in(
        &self,
        map: &HashMap<String, Vec<usize>>,
        key: &str,
    ) -> Option<(&CatalogRecord, usize)> {
        if key.is_empty() {
            return None;
        }
        let positions = map.get(key)?;
        let first = *positions.first()?;
        Some((&self.records[first], positions.len()))
    }
}

/// Composite key for the surname index
pub fn last_initial_key(last: &str, initial: &str) -> String {
    format!("{}:{}", last, initial)
}

#[cfg(test)]
pub(crate) fn record(id: i64, first: &str, last: &str, display: &str, team: i64) -> CatalogRecord {
    CatalogRecord {
        id: ElementId(id),
        first_name: first.to_string(),
        last_name: last.to_string(),
        display_name: display.to_string(),
        team: TeamId(team),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_buckets() {
        let index = MatchIndex::build(&[
            record(1, "Mohamed", "Salah", "M.Salah", 12),
            record(2, "Erling", "Haaland", "Haaland", 13),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.display_bucket("msalah")[0].id, ElementId(1));
        assert_eq!(index.display_bucket("haaland")[0].id, ElementId(2));
        assert!(index.display_bucket("salah").is_empty());
    }

    #[test]
    fn test_last_initial_buckets() {
        let index = MatchIndex::build(&[
            record(1, "Bukayo", "Saka", "Saka", 1),
            record(2, "Jean Paul", "Van Damme", "Van Damme", 2),
        ]);

        assert_eq!(index.last_initial_bucket("saka:b")[0].id, ElementId(1));
        // Middle tokens of the full name are dropped
        assert_eq!(index.last_initial_bucket("damme:j")[0].id, ElementId(2));
        assert!(index.last_initial_bucket("saka:x").is_empty());
    }

    #[test]
    fn test_collisions_keep_catalog_order() {
        let index = MatchIndex::build(&[
            record(10, "Ben", "White", "White", 1),
            record(11, "Ben", "White", "White", 9),
        ]);

        let bucket = index.display_bucket("white");
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].id, ElementId(10));
        assert_eq!(bucket[1].id, ElementId(11));
        assert_eq!(index.last_initial_bucket("white:b").len(), 2);
    }

    #[test]
    fn test_blank_names_are_not_indexed() {
        let index = MatchIndex::build(&[record(1, "", "", "...", 1)]);
        assert_eq!(index.len(), 1);
        assert!(index.first_by_display("").is_none());
        assert!(index.first_by_last_initial(":").is_none());
    }

    #[test]
    fn test_first_name_only_record() {
        // A lone first name is taken as the surname with no initial
        let index = MatchIndex::build(&[record(1, "Richarlison", "", "Richarlison", 5)]);
        assert_eq!(index.last_initial_bucket("richarlison:r")[0].id, ElementId(1));
    }

    #[test]
    fn test_empty_catalog() {
        let index = MatchIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.display_bucket("salah").is_empty());
    }
}
