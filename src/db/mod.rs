//! Persistent storage for accounts, sessions, channels and roles.
//!
//! Everything lives in one redb file with one table per namespace:
//!
//! | table      | key                  | value                       |
//! |------------|----------------------|-----------------------------|
//! | `accounts` | nick                 | argon2 PHC hash             |
//! | `sessions` | `nick:user@host`     | last activity (unix secs)   |
//! | `channels` | channel              | role bucket id (uuid)       |
//! | `roles`    | `bucket\0nick`       | `owner` / `op`              |
//! | `seen`     | nick                 | JSON [`SeenRecord`]         |
//!
//! Nick and channel keys are folded with RFC 1459 case mapping. Every
//! mutation runs in a single write transaction; redb admits one writer at
//! a time, which is the only locking the rest of the bot relies on.

mod accounts;
mod channels;
mod seen;
mod sessions;

pub use accounts::AccountRepository;
pub use channels::{ChannelRepository, Membership, Role, RoleChange};
pub use seen::{SeenRecord, SeenRepository};
pub use sessions::{SessionCheck, SessionRepository};

use redb::{Database, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const ACCOUNTS: TableDefinition<&str, &str> = TableDefinition::new("accounts");
pub(crate) const SESSIONS: TableDefinition<&str, &str> = TableDefinition::new("sessions");
pub(crate) const CHANNELS: TableDefinition<&str, &str> = TableDefinition::new("channels");
pub(crate) const ROLES: TableDefinition<&str, &str> = TableDefinition::new("roles");
pub(crate) const SEEN: TableDefinition<&str, &[u8]> = TableDefinition::new("seen");

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Handle to the services database. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path` and make sure every table
    /// exists before anything is served.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(CHANNELS)?;
            let _ = write_txn.open_table(ROLES)?;
            let _ = write_txn.open_table(SEEN)?;
        }
        write_txn.commit()?;

        info!(path = %path.display(), "Store opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Get account repository.
    pub fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.db)
    }

    /// Get session repository.
    pub fn sessions(&self) -> SessionRepository<'_> {
        SessionRepository::new(&self.db)
    }

    /// Get channel repository.
    pub fn channels(&self) -> ChannelRepository<'_> {
        ChannelRepository::new(&self.db)
    }

    /// Get last-seen repository.
    pub fn seen(&self) -> SeenRepository<'_> {
        SeenRepository::new(&self.db)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_keeps_data_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/quarid.redb");
        {
            let store = Store::open(&path).unwrap();
            assert!(store.accounts().create("alice", "$hash").unwrap());
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(
            store.accounts().password_hash("ALICE").unwrap().as_deref(),
            Some("$hash")
        );
        assert_eq!(store.channels().membership("#none", "alice").unwrap(), Membership::UnknownChannel);
    }
}
