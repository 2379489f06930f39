//! Processed-confirmation log
//!
//! The durable idempotency gate inbound updates must pass before they reach
//! a match. The transport delivers at-least-once; update ids seen here are
//! dropped without touching any state.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::instrument;

use crate::error::Result;

/// How long processed update ids are retained. A replay arriving later than
/// this is treated as new; the transport does not redeliver that far back.
const RETENTION_DAYS: i64 = 3;

pub struct ConfirmationLog<'a> {
    conn: &'a Connection,
}

impl<'a> ConfirmationLog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Has this update id been processed already?
    #[instrument(skip(self))]
    pub fn seen(&self, update_id: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM confirmations WHERE update_id = ?1")?;

        let hit = stmt
            .query_row(params![update_id], |_| Ok(()))
            .optional()?;
        Ok(hit.is_some())
    }

    /// Remember a processed update id
    #[instrument(skip(self))]
    pub fn record(&self, update_id: &str, processed_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO confirmations (update_id, processed_at) VALUES (?1, ?2)",
            params![update_id, processed_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Drop entries past the retention window; returns rows removed
    #[instrument(skip(self))]
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = now - Duration::days(RETENTION_DAYS);
        let removed = self.conn.execute(
            "DELETE FROM confirmations WHERE processed_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed as u64)
    }
}
