//! SQLite persistence layer.
//!
//! RULE: Only journal.rs talks to the database.
//! Zones emit `SimEvent`s and the engine appends them here — nothing else
//! executes SQL directly.

use rusqlite::{params, Connection};

use crate::{
    error::EngineResult,
    event::EventLogEntry,
    types::Tick,
};

pub struct Journal {
    conn: Connection,
}

impl Journal {
    /// Open (or create) the journal database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_journal.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(&self, session_id: &str, seed: u64, version: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, seed as i64, version, 0i64],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, tick, zone, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.session_id,
                entry.tick as i64,
                entry.zone,
                entry.event_type,
                entry.payload,
                entry.tick as i64,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, session_id: &str, tick: Tick) -> EngineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, zone, event_type, payload
             FROM event_log WHERE session_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    session_id: row.get(1)?,
                    tick: row.get::<_, i64>(2)? as u64,
                    zone: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Every journal row for a session, in append order. Determinism checks
    /// compare the full sequence across runs.
    pub fn all_events(&self, session_id: &str) -> EngineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, zone, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    session_id: row.get(1)?,
                    tick: row.get::<_, i64>(2)? as u64,
                    zone: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, session_id: &str) -> EngineResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, session_id: &str, tick: Tick, state_json: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO snapshot (session_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![session_id, tick as i64, state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot_before(
        &self,
        session_id: &str,
        tick: Tick,
    ) -> EngineResult<Option<(Tick, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tick, state_json FROM snapshot
             WHERE session_id = ?1 AND tick <= ?2
             ORDER BY tick DESC LIMIT 1",
        )?;
        let result = stmt
            .query_row(params![session_id, tick as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?))
            })
            .ok();
        Ok(result)
    }
}
