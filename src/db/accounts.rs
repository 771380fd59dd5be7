//! Account records: nick → password hash.

use quarid_proto::irc_to_lower;
use redb::{Database, ReadableDatabase, ReadableTable};

use super::{ACCOUNTS, StoreError};

/// Repository for account operations.
pub struct AccountRepository<'a> {
    db: &'a Database,
}

impl<'a> AccountRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert an account unless one exists for `nick`.
    ///
    /// Returns `false` (and writes nothing) when the nick is taken. The
    /// existence check and insert share one write transaction.
    pub fn create(&self, nick: &str, password_hash: &str) -> Result<bool, StoreError> {
        let key = irc_to_lower(nick);
        let write_txn = self.db.begin_write()?;
        let created = {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            if table.get(key.as_str())?.is_some() {
                false
            } else {
                table.insert(key.as_str(), password_hash)?;
                true
            }
        };
        if created {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(created)
    }

    /// Stored hash for `nick`, if registered.
    pub fn password_hash(&self, nick: &str) -> Result<Option<String>, StoreError> {
        let key = irc_to_lower(nick);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        Ok(table.get(key.as_str())?.map(|v| v.value().to_string()))
    }

    pub fn exists(&self, nick: &str) -> Result<bool, StoreError> {
        Ok(self.password_hash(nick)?.is_some())
    }
}
