//! Last-seen records for the SEEN command.

use quarid_proto::irc_to_lower;
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{SEEN, StoreError};

/// Where and when a nick last spoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    /// Channel name, case preserved.
    pub channel: String,
    /// Unix seconds.
    pub at: i64,
}

pub struct SeenRepository<'a> {
    db: &'a Database,
}

impl<'a> SeenRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn record(&self, nick: &str, channel: &str, at: i64) -> Result<(), StoreError> {
        let key = irc_to_lower(nick);
        let value = serde_json::to_vec(&SeenRecord {
            channel: channel.to_string(),
            at,
        })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SEEN)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Last record for `nick`. Undecodable records read as absent.
    pub fn get(&self, nick: &str) -> Result<Option<SeenRecord>, StoreError> {
        let key = irc_to_lower(nick);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEEN)?;
        let Some(raw) = table.get(key.as_str())? else {
            return Ok(None);
        };
        match serde_json::from_slice::<SeenRecord>(raw.value()) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(nick = %nick, error = %e, "Failed to deserialize seen record, ignoring");
                Ok(None)
            }
        }
    }
}
