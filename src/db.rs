// SQLite persistence for players, rankings, news, team slots and picks.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::DraftError;
use crate::models::{
    BoardEntry, NewPick, NewsItem, Pick, Player, Position, TeamSlot, CONSENSUS_SOURCE,
    PRIMARY_ADP_SOURCE, SECONDARY_ADP_SOURCE,
};

const LAST_REFRESH_KEY: &str = "last_refresh_ts";

impl ToSql for Position {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Position {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// SQLite-backed store. One connection guarded by a mutex; every mutating
/// call commits on its own.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at `path` and ensure the schema exists.
    /// `":memory:"` gives an ephemeral database for tests.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                player_id  TEXT PRIMARY KEY,
                clean_name TEXT NOT NULL,
                position   TEXT NOT NULL,
                team       TEXT NOT NULL DEFAULT 'FA',
                bye_week   INTEGER,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_players_position ON players(position);

            CREATE TABLE IF NOT EXISTS consensus_ranks (
                player_id TEXT NOT NULL REFERENCES players(player_id),
                source    TEXT NOT NULL,
                ecr_rank  INTEGER NOT NULL,
                tier      INTEGER,
                asof_ts   TEXT NOT NULL,
                PRIMARY KEY (player_id, source)
            );

            CREATE TABLE IF NOT EXISTS adp (
                player_id TEXT NOT NULL REFERENCES players(player_id),
                source    TEXT NOT NULL,
                adp       REAL NOT NULL,
                asof_ts   TEXT NOT NULL,
                PRIMARY KEY (player_id, source)
            );

            CREATE TABLE IF NOT EXISTS injuries (
                player_id  TEXT PRIMARY KEY REFERENCES players(player_id),
                risk_score REAL,
                status     TEXT,
                notes      TEXT,
                source     TEXT NOT NULL,
                asof_ts    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS news (
                news_id   INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id TEXT REFERENCES players(player_id),
                headline  TEXT NOT NULL,
                url       TEXT,
                source    TEXT NOT NULL,
                asof_ts   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_slots (
                team_slot_id   INTEGER PRIMARY KEY,
                team_name      TEXT NOT NULL,
                draft_position INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS picks (
                pick_id      INTEGER PRIMARY KEY AUTOINCREMENT,
                round_no     INTEGER NOT NULL,
                overall_no   INTEGER NOT NULL UNIQUE,
                team_slot_id INTEGER NOT NULL REFERENCES team_slots(team_slot_id),
                player_id    TEXT NOT NULL UNIQUE REFERENCES players(player_id),
                ts           TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_picks_team_overall ON picks(team_slot_id, overall_no);

            CREATE TABLE IF NOT EXISTS app_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned, which only happens after another
    /// thread panicked mid-query.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert or update every player in one transaction. Players are never
    /// deleted, so ids referenced by picks stay valid.
    pub fn upsert_players(&self, players: &[Player]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin player upsert")?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO players (player_id, clean_name, position, team, bye_week, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(player_id) DO UPDATE SET
                        clean_name = excluded.clean_name,
                        position   = excluded.position,
                        team       = excluded.team,
                        bye_week   = excluded.bye_week,
                        updated_at = excluded.updated_at",
                )
                .context("failed to prepare player upsert")?;

            for p in players {
                stmt.execute(params![
                    p.player_id,
                    p.clean_name,
                    p.position,
                    p.team,
                    p.bye_week,
                    now
                ])
                .with_context(|| format!("failed to upsert player {}", p.player_id))?;
            }
        }

        tx.commit().context("failed to commit player upsert")?;
        Ok(players.len())
    }

    pub fn all_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, clean_name, position, team, bye_week
                 FROM players ORDER BY player_id",
            )
            .context("failed to prepare all_players query")?;

        let players = stmt
            .query_map([], |row| {
                Ok(Player {
                    player_id: row.get(0)?,
                    clean_name: row.get(1)?,
                    position: row.get(2)?,
                    team: row.get(3)?,
                    bye_week: row.get(4)?,
                })
            })
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    pub fn player_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
            .context("failed to count players")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Rankings, ADP, injuries, news
    // ------------------------------------------------------------------

    /// Upsert `(player_id, ecr_rank, tier)` rows for one source. Refresh
    /// overwrites in place; there is one row per (player, source).
    pub fn upsert_consensus_ranks(&self, source: &str, rows: &[(String, u32, u32)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin rank upsert")?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO consensus_ranks (player_id, source, ecr_rank, tier, asof_ts)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(player_id, source) DO UPDATE SET
                        ecr_rank = excluded.ecr_rank,
                        tier     = excluded.tier,
                        asof_ts  = excluded.asof_ts",
                )
                .context("failed to prepare rank upsert")?;

            for (player_id, rank, tier) in rows {
                stmt.execute(params![player_id, source, rank, tier, now])
                    .with_context(|| format!("failed to upsert rank for {player_id}"))?;
            }
        }

        tx.commit().context("failed to commit rank upsert")?;
        Ok(())
    }

    /// Upsert `(player_id, adp)` rows for one ADP source
    pub fn upsert_adp(&self, source: &str, rows: &[(String, f64)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin adp upsert")?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO adp (player_id, source, adp, asof_ts)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(player_id, source) DO UPDATE SET
                        adp     = excluded.adp,
                        asof_ts = excluded.asof_ts",
                )
                .context("failed to prepare adp upsert")?;

            for (player_id, adp) in rows {
                stmt.execute(params![player_id, source, adp, now])
                    .with_context(|| format!("failed to upsert {source} adp for {player_id}"))?;
            }
        }

        tx.commit().context("failed to commit adp upsert")?;
        Ok(())
    }

    /// One injury row per player, overwritten on every call
    pub fn upsert_injuries(&self, source: &str, rows: &[(String, f64)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin injury upsert")?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO injuries (player_id, risk_score, status, notes, source, asof_ts)
                     VALUES (?1, ?2, NULL, NULL, ?3, ?4)
                     ON CONFLICT(player_id) DO UPDATE SET
                        risk_score = excluded.risk_score,
                        status     = NULL,
                        source     = excluded.source,
                        asof_ts    = excluded.asof_ts",
                )
                .context("failed to prepare injury upsert")?;

            for (player_id, risk) in rows {
                stmt.execute(params![player_id, risk, source, now])
                    .with_context(|| format!("failed to upsert injury for {player_id}"))?;
            }
        }

        tx.commit().context("failed to commit injury upsert")?;
        Ok(())
    }

    /// Replace stored news with the latest fetch
    pub fn replace_news(&self, items: &[(NewsItem, Option<String>)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin news replace")?;
        let now = Utc::now().to_rfc3339();

        tx.execute("DELETE FROM news", [])
            .context("failed to clear news")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO news (player_id, headline, url, source, asof_ts)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .context("failed to prepare news insert")?;

            for (item, player_id) in items {
                stmt.execute(params![player_id, item.headline, item.url, item.source, now])
                    .context("failed to insert news item")?;
            }
        }

        tx.commit().context("failed to commit news replace")?;
        Ok(())
    }

    pub fn news_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM news", [], |row| row.get(0))
            .context("failed to count news")?;
        Ok(count as usize)
    }

    /// Every player joined with its consensus rank, both ADP sources, injury
    /// risk and picked flag, ordered by player id.
    pub fn load_board(&self, position: Option<Position>) -> Result<Vec<BoardEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.player_id, p.clean_name, p.position, p.team, p.bye_week,
                        cr.ecr_rank, cr.tier, a1.adp, a2.adp, i.risk_score,
                        pk.pick_id IS NOT NULL
                 FROM players p
                 LEFT JOIN consensus_ranks cr ON cr.player_id = p.player_id AND cr.source = ?1
                 LEFT JOIN adp a1 ON a1.player_id = p.player_id AND a1.source = ?2
                 LEFT JOIN adp a2 ON a2.player_id = p.player_id AND a2.source = ?3
                 LEFT JOIN injuries i ON i.player_id = p.player_id
                 LEFT JOIN picks pk ON pk.player_id = p.player_id
                 WHERE ?4 IS NULL OR p.position = ?4
                 ORDER BY p.player_id",
            )
            .context("failed to prepare board query")?;

        let entries = stmt
            .query_map(
                params![
                    CONSENSUS_SOURCE,
                    PRIMARY_ADP_SOURCE,
                    SECONDARY_ADP_SOURCE,
                    position
                ],
                |row| {
                    Ok(BoardEntry {
                        player: Player {
                            player_id: row.get(0)?,
                            clean_name: row.get(1)?,
                            position: row.get(2)?,
                            team: row.get(3)?,
                            bye_week: row.get(4)?,
                        },
                        ecr_rank: row.get(5)?,
                        tier: row.get(6)?,
                        primary_adp: row.get(7)?,
                        secondary_adp: row.get(8)?,
                        injury_risk: row.get(9)?,
                        picked: row.get(10)?,
                    })
                },
            )
            .context("failed to query board")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map board rows")?;

        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Team slots and picks
    // ------------------------------------------------------------------

    /// Create `Team N` slots 1..=league_size that do not exist yet
    pub fn seed_team_slots(&self, league_size: u32) -> Result<()> {
        let conn = self.conn();
        for slot in 1..=league_size {
            conn.execute(
                "INSERT OR IGNORE INTO team_slots (team_slot_id, team_name, draft_position)
                 VALUES (?1, ?2, ?1)",
                params![slot, format!("Team {slot}")],
            )
            .context("failed to seed team slot")?;
        }
        Ok(())
    }

    pub fn team_slots(&self) -> Result<Vec<TeamSlot>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT team_slot_id, team_name, draft_position
                 FROM team_slots ORDER BY draft_position, team_slot_id",
            )
            .context("failed to prepare team slot query")?;

        let slots = stmt
            .query_map([], |row| {
                Ok(TeamSlot {
                    team_slot_id: row.get(0)?,
                    team_name: row.get(1)?,
                    draft_position: row.get(2)?,
                })
            })
            .context("failed to query team slots")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team slot rows")?;

        Ok(slots)
    }

    pub fn team_slot_exists(&self, team_slot_id: u32) -> Result<bool> {
        let conn = self.conn();
        exists(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM team_slots WHERE team_slot_id = ?1)",
            params![team_slot_id],
        )
    }

    /// Positions drafted so far by one team
    pub fn drafted_positions(&self, team_slot_id: u32) -> Result<Vec<Position>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.position FROM picks pk
                 JOIN players p ON p.player_id = pk.player_id
                 WHERE pk.team_slot_id = ?1
                 ORDER BY pk.overall_no",
            )
            .context("failed to prepare drafted positions query")?;

        let positions = stmt
            .query_map(params![team_slot_id], |row| row.get(0))
            .context("failed to query drafted positions")?
            .collect::<std::result::Result<Vec<Position>, _>>()
            .context("failed to map drafted positions")?;

        Ok(positions)
    }

    /// Record a pick after checking that the player and team slot exist,
    /// the overall number is unused and the player has not been taken.
    pub fn record_pick(&self, pick: &NewPick) -> std::result::Result<Pick, DraftError> {
        if pick.round_no == 0 {
            return Err(DraftError::InvalidPick("round_no must be at least 1".into()));
        }
        if pick.overall_no == 0 {
            return Err(DraftError::InvalidPick("overall_no must be at least 1".into()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin pick transaction")?;

        if !exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM players WHERE player_id = ?1)",
            params![pick.player_id],
        )? {
            return Err(DraftError::PlayerNotFound(pick.player_id.clone()));
        }
        if !exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM team_slots WHERE team_slot_id = ?1)",
            params![pick.team_slot_id],
        )? {
            return Err(DraftError::TeamSlotNotFound(pick.team_slot_id));
        }
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM picks WHERE overall_no = ?1)",
            params![pick.overall_no],
        )? {
            return Err(DraftError::DuplicateOverallPick(pick.overall_no));
        }
        if exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM picks WHERE player_id = ?1)",
            params![pick.player_id],
        )? {
            return Err(DraftError::PlayerAlreadyPicked(pick.player_id.clone()));
        }

        let ts = Utc::now();
        let pick_id: i64 = insert_pick(&tx, pick, &ts)?;
        tx.commit().context("failed to commit pick")?;

        Ok(Pick {
            pick_id,
            round_no: pick.round_no,
            overall_no: pick.overall_no,
            team_slot_id: pick.team_slot_id,
            player_id: pick.player_id.clone(),
            ts,
        })
    }

    /// All picks ordered by overall pick number
    pub fn list_picks(&self) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_id, round_no, overall_no, team_slot_id, player_id, ts
                 FROM picks ORDER BY overall_no ASC",
            )
            .context("failed to prepare list_picks query")?;

        let picks = stmt
            .query_map([], |row| {
                let ts: String = row.get(5)?;
                Ok(Pick {
                    pick_id: row.get(0)?,
                    round_no: row.get(1)?,
                    overall_no: row.get(2)?,
                    team_slot_id: row.get(3)?,
                    player_id: row.get(4)?,
                    ts: parse_ts(&ts)?,
                })
            })
            .context("failed to query picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;

        Ok(picks)
    }

    pub fn pick_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM picks", [], |row| row.get(0))
            .context("failed to count picks")?;
        Ok(count as usize)
    }

    pub fn delete_pick(&self, pick_id: i64) -> std::result::Result<(), DraftError> {
        let conn = self.conn();
        let deleted = conn
            .execute("DELETE FROM picks WHERE pick_id = ?1", params![pick_id])
            .context("failed to delete pick")?;

        if deleted == 0 {
            return Err(DraftError::PickNotFound(pick_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // App state
    // ------------------------------------------------------------------

    pub fn set_last_refresh(&self, ts: DateTime<Utc>) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![LAST_REFRESH_KEY, ts.to_rfc3339()],
        )
        .context("failed to save last refresh time")?;
        Ok(())
    }

    pub fn last_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![LAST_REFRESH_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load last refresh time")?;

        raw.map(|s| parse_ts(&s).context("stored refresh time is not RFC 3339"))
            .transpose()
    }
}

fn exists(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<bool> {
    conn.query_row(sql, params, |row| row.get(0))
        .context("failed to run existence check")
}

fn insert_pick(tx: &Transaction<'_>, pick: &NewPick, ts: &DateTime<Utc>) -> Result<i64> {
    tx.query_row(
        "INSERT INTO picks (round_no, overall_no, team_slot_id, player_id, ts)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING pick_id",
        params![
            pick.round_no,
            pick.overall_no,
            pick.team_slot_id,
            pick.player_id,
            ts.to_rfc3339()
        ],
        |row| row.get(0),
    )
    .context("failed to insert pick")
}
