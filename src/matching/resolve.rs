//! Name resolution cascade
//!
//! Tries the narrowest signal first and stops at the first hit:
//!
//! 1. last token of the name (periods read as spaces) against display names
//! 2. whole folded name against display names
//! 3. surname plus first initial against catalog first/last names
//! 4. bare surname against display names

use std::fmt;

use serde::Serialize;

use super::index::{last_initial_key, CatalogRecord, MatchIndex};
use super::normalize::{first_initial, name_tokens, normalize, split_parts};

/// Which cascade step produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStep {
    LastToken,
    FullName,
    SurnameInitial,
    Surname,
}

impl fmt::Display for MatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStep::LastToken => write!(f, "last token"),
            MatchStep::FullName => write!(f, "full name"),
            MatchStep::SurnameInitial => write!(f, "surname + initial"),
            MatchStep::Surname => write!(f, "surname"),
        }
    }
}

/// A successful resolution with its provenance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub record: &'a CatalogRecord,
    pub step: MatchStep,
    /// Size of the bucket the record was taken from
    pub candidates: usize,
}

impl Resolution<'_> {
    /// More than one catalog record shared the winning key
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

impl MatchIndex {
    /// Find the catalog record a local name refers to
    pub fn resolve(&self, local_name: &str) -> Option<&CatalogRecord> {
        self.resolve_detailed(local_name).map(|r| r.record)
    }

    /// Like [`MatchIndex::resolve`], also reporting the step and bucket size
    pub fn resolve_detailed(&self, local_name: &str) -> Option<Resolution<'_>> {
        if local_name.is_empty() {
            return None;
        }

        let dotless = local_name.replace('.', " ");
        if let Some(last_token) = name_tokens(&dotless).last() {
            let found = hit(
                self.first_by_display(&normalize(last_token)),
                MatchStep::LastToken,
            );
            if found.is_some() {
                return found;
            }
        }

        let found = hit(self.first_by_display(&normalize(local_name)), MatchStep::FullName);
        if found.is_some() {
            return found;
        }

        let (first, last) = split_parts(local_name);
        if !last.is_empty() {
            let key = last_initial_key(&last, &first_initial(&first));
            let found = hit(self.first_by_last_initial(&key), MatchStep::SurnameInitial);
            if found.is_some() {
                return found;
            }
        }

        hit(self.first_by_display(&normalize(&last)), MatchStep::Surname)
    }
}

fn hit(found: Option<(&CatalogRecord, usize)>, step: MatchStep) -> Option<Resolution<'_>> {
    found.map(|(record, candidates)| Resolution {
        record,
        step,
        candidates,
    })
}
