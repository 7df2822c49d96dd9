//! SQLite save back-end: one `save_slot` row per slot.

use super::{SaveBackend, SlotRecord, SlotSummary};
use crate::{error::HavenResult, types::SlotId};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub struct SqliteSaveBackend {
    conn: Connection,
}

impl SqliteSaveBackend {
    pub fn open(path: &str) -> HavenResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let backend = Self { conn };
        backend.migrate()?;
        Ok(backend)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> HavenResult<Self> {
        let backend = Self { conn: Connection::open(":memory:")? };
        backend.migrate()?;
        Ok(backend)
    }

    /// Apply all schema migrations in order. Safe to run repeatedly.
    pub fn migrate(&self) -> HavenResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_save_slots.sql"))?;
        Ok(())
    }
}

const SUMMARY_COLUMNS: &str = "slot, schema_version, saved_at, playtime_seconds, day, season,
     cafe_level, gold, dragon_name, dragon_stage, playthrough_id";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SlotSummary> {
    Ok(SlotSummary {
        slot:             row.get::<_, i64>(0)? as SlotId,
        schema_version:   row.get::<_, i64>(1)? as u32,
        saved_at:         row.get(2)?,
        playtime_seconds: row.get(3)?,
        day:              row.get::<_, i64>(4)? as u32,
        season:           row.get(5)?,
        cafe_level:       row.get::<_, i64>(6)? as u32,
        gold:             row.get::<_, i64>(7)? as u32,
        dragon_name:      row.get(8)?,
        dragon_stage:     row.get(9)?,
        playthrough_id:   row.get(10)?,
    })
}

impl SaveBackend for SqliteSaveBackend {
    fn write(&mut self, record: &SlotRecord) -> HavenResult<()> {
        let s = &record.summary;
        // Single statement: the old row survives if this fails.
        self.conn.execute(
            "INSERT OR REPLACE INTO save_slot
                (slot, schema_version, saved_at, playtime_seconds, day, season,
                 cafe_level, gold, dragon_name, dragon_stage, playthrough_id, document)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                s.slot as i64,
                s.schema_version as i64,
                s.saved_at,
                s.playtime_seconds,
                s.day as i64,
                s.season,
                s.cafe_level as i64,
                s.gold as i64,
                s.dragon_name,
                s.dragon_stage,
                s.playthrough_id,
                record.document,
            ],
        )?;
        Ok(())
    }

    fn read(&self, slot: SlotId) -> HavenResult<Option<String>> {
        let document = self
            .conn
            .query_row(
                "SELECT document FROM save_slot WHERE slot = ?1",
                params![slot as i64],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(document)
    }

    fn summaries(&self) -> HavenResult<Vec<SlotSummary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SUMMARY_COLUMNS} FROM save_slot ORDER BY slot"))?;
        let rows = stmt.query_map([], summary_from_row)?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    fn remove(&mut self, slot: SlotId) -> HavenResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM save_slot WHERE slot = ?1", params![slot as i64])?;
        Ok(removed > 0)
    }
}
