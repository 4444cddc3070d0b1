use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::error;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::StoreError;
use crate::domain::WatermarkRecord;
use crate::store::{StoreResult, WatermarkStore};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> StoreResult<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn to_record(
        feed_id: String,
        name: Option<String>,
        raw: Option<String>,
    ) -> StoreResult<WatermarkRecord> {
        let raw = raw.unwrap_or_default();
        let last_seen = Self::parse_datetime(&raw).ok_or_else(|| StoreError::InvalidTimestamp {
            feed_id: feed_id.clone(),
            value: raw,
        })?;

        Ok(WatermarkRecord {
            feed_id,
            name: name.unwrap_or_default(),
            last_seen,
        })
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

impl WatermarkStore for SqliteStore {
    fn get(&self, feed_id: &str) -> StoreResult<Option<WatermarkRecord>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT channelId, name, datetime FROM content WHERE channelId = ?1",
                params![feed_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, raw)| Self::to_record(id, name, raw))
            .transpose()
    }

    fn seed(&self, feed_id: &str, name: &str, last_seen: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO content (channelId, name, datetime) VALUES (?1, ?2, ?3)",
            params![feed_id, name, last_seen.to_rfc3339()],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::AlreadyExists(feed_id.to_string())
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    fn advance(&self, feed_id: &str, last_seen: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE content SET datetime = ?1 WHERE channelId = ?2",
            params![last_seen.to_rfc3339(), feed_id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(feed_id.to_string()));
        }

        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<WatermarkRecord>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT channelId, name, datetime FROM content ORDER BY rowid")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .filter_map(|(id, name, raw)| match Self::to_record(id, name, raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    error!("Skipping unreadable watermark: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}
