//! Data ingestion and storage
//!
//! FPL API client, SQLite database management and the sync that ties them
//! together.

pub mod database;
pub mod fpl;
pub mod sync;

pub use database::Database;
pub use fpl::{Bootstrap, FplClient};
pub use sync::{import_players, sync_player_teams, SyncOptions, SyncSummary};
