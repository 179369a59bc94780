//! Player name reconciliation
//!
//! Maps free-text local player names onto FPL catalog identities.
//! Everything here is pure: no I/O and no errors, a miss is just `None`.

pub mod index;
pub mod normalize;
pub mod reconcile;
pub mod resolve;

pub use index::{CatalogRecord, MatchIndex};
pub use normalize::{first_initial, normalize, split_parts};
pub use reconcile::{reconcile, Assignment, LocalRecord, ReconcileReport};
pub use resolve::{MatchStep, Resolution};
