//! SQLite storage for teams and players

use crate::data::fpl::ApiTeam;
use crate::{ElementId, FplError, Player, PlayerId, Position, Result, Team, TeamId};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                short_name TEXT NOT NULL,
                code INTEGER NOT NULL DEFAULT 0,
                strength INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                position TEXT,
                team TEXT,
                team_id INTEGER REFERENCES teams(id),
                fpl_element_id INTEGER,
                updated_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_players_team_id ON players(team_id);
            "#,
        )?;
        Ok(())
    }

    /// Run `f` inside a transaction
    ///
    /// The transaction rolls back when `f` fails or the commit itself fails.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ==================== Team Operations ====================

    /// Insert or update teams by FPL id
    pub fn upsert_teams(&self, teams: &[ApiTeam]) -> Result<usize> {
        let now = timestamp();
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO teams (id, name, short_name, code, strength, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                short_name = excluded.short_name,
                code = excluded.code,
                strength = excluded.strength,
                updated_at = excluded.updated_at
            "#,
        )?;

        let mut count = 0;
        for team in teams {
            stmt.execute(params![
                team.id,
                team.name,
                team.short_name,
                team.code,
                team.strength,
                now
            ])?;
            count += 1;
        }
        Ok(count)
    }

    /// Get team by ID
    pub fn get_team(&self, id: TeamId) -> Result<Team> {
        self.conn
            .query_row(
                "SELECT id, name, short_name, code, strength FROM teams WHERE id = ?1",
                params![id.0],
                Self::row_to_team,
            )
            .optional()?
            .ok_or(FplError::TeamNotFound(id))
    }

    /// Get all teams
    pub fn get_all_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, short_name, code, strength FROM teams ORDER BY id")?;

        let teams = stmt
            .query_map([], Self::row_to_team)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(teams)
    }

    fn row_to_team(row: &rusqlite::Row) -> rusqlite::Result<Team> {
        Ok(Team {
            id: TeamId(row.get(0)?),
            name: row.get(1)?,
            short_name: row.get(2)?,
            code: row.get(3)?,
            strength: row.get(4)?,
        })
    }

    // ==================== Player Operations ====================

    /// Get or create a player by name
    pub fn add_player(&self, name: &str, position: Option<Position>) -> Result<Player> {
        if let Some(player) = self.find_player_by_name(name)? {
            return Ok(player);
        }

        self.conn.execute(
            "INSERT INTO players (name, position) VALUES (?1, ?2)",
            params![name, position.map(|p| p.code())],
        )?;

        let id = PlayerId(self.conn.last_insert_rowid());
        self.get_player(id)
    }

    /// Find a player by exact name
    pub fn find_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        let player = self
            .conn
            .query_row(
                &format!("{} WHERE name = ?1", PLAYER_SELECT),
                params![name],
                Self::row_to_player,
            )
            .optional()?;
        Ok(player)
    }

    /// Get player by ID
    pub fn get_player(&self, id: PlayerId) -> Result<Player> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", PLAYER_SELECT),
                params![id.0],
                Self::row_to_player,
            )
            .optional()?
            .ok_or(FplError::PlayerNotFound(id))
    }

    /// Get all players
    pub fn get_all_players(&self) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY id", PLAYER_SELECT))?;

        let players = stmt
            .query_map([], Self::row_to_player)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(players)
    }

    /// Record a player's current team and FPL identity
    pub fn apply_assignment(
        &self,
        player: PlayerId,
        team: &Team,
        element: ElementId,
    ) -> Result<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE players
            SET team = ?1, team_id = ?2, fpl_element_id = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
            params![team.name, team.id.0, element.0, timestamp(), player.0],
        )?;
        if changed == 0 {
            return Err(FplError::PlayerNotFound(player));
        }
        Ok(())
    }

    fn row_to_player(row: &rusqlite::Row) -> rusqlite::Result<Player> {
        let position: Option<String> = row.get(2)?;
        Ok(Player {
            id: PlayerId(row.get(0)?),
            name: row.get(1)?,
            position: position.as_deref().and_then(Position::from_code),
            team: row.get(3)?,
            team_id: row.get::<_, Option<i64>>(4)?.map(TeamId),
            fpl_element_id: row.get::<_, Option<i64>>(5)?.map(ElementId),
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let last_sync: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM players", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            team_count: count("SELECT COUNT(*) FROM teams")?,
            player_count: count("SELECT COUNT(*) FROM players")?,
            players_with_team: count("SELECT COUNT(*) FROM players WHERE team_id IS NOT NULL")?,
            players_with_element: count(
                "SELECT COUNT(*) FROM players WHERE fpl_element_id IS NOT NULL",
            )?,
            last_sync,
        })
    }
}

const PLAYER_SELECT: &str =
    "SELECT id, name, position, team, team_id, fpl_element_id FROM players";

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub player_count: usize,
    pub players_with_team: usize,
    pub players_with_element: usize,
    pub last_sync: Option<String>,
}
