//! Session records: `nick:user@host` → last activity.
//!
//! Sessions slide: every successful check moves last activity to now. A
//! session checked after its window has passed is deleted in the same
//! transaction, so it stays dead even if a later check would otherwise
//! have fallen inside the window again.

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use super::{SESSIONS, StoreError};

/// Outcome of a session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Valid; last activity moved to now.
    Refreshed,
    /// No record.
    Missing,
    /// Record older than the window; removed.
    Expired,
    /// Record not a timestamp; removed.
    Corrupt,
}

/// Repository for session operations. Keys are built by the caller.
pub struct SessionRepository<'a> {
    db: &'a Database,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create or overwrite a session with last activity `now`.
    pub fn touch(&self, key: &str, now: i64) -> Result<(), StoreError> {
        let value = now.to_string();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(key, value.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Check and refresh a session as one read-modify-write transaction.
    pub fn check_and_refresh(
        &self,
        key: &str,
        now: i64,
        window_secs: i64,
    ) -> Result<SessionCheck, StoreError> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let stored = table.get(key)?.map(|v| v.value().to_string());
            match stored.map(|s| s.parse::<i64>()) {
                None => SessionCheck::Missing,
                Some(Err(_)) => {
                    table.remove(key)?;
                    SessionCheck::Corrupt
                }
                Some(Ok(last)) if now - last > window_secs => {
                    table.remove(key)?;
                    SessionCheck::Expired
                }
                Some(Ok(_)) => {
                    let value = now.to_string();
                    table.insert(key, value.as_str())?;
                    SessionCheck::Refreshed
                }
            }
        };
        write_txn.commit()?;

        debug!(key = %key, outcome = ?outcome, "Session checked");
        Ok(outcome)
    }

    /// Last activity for `key`, without refreshing.
    pub fn last_activity(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        Ok(table
            .get(key)?
            .and_then(|v| v.value().parse::<i64>().ok()))
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
