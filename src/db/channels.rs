//! Channel records and per-channel role buckets.
//!
//! A channel maps to an opaque bucket id; roles are stored under
//! `bucket\0nick`. The bucket indirection means a channel's roles can
//! only be reached through its own channel record.

use std::fmt;
use std::str::FromStr;

use quarid_proto::irc_to_lower;
use redb::{Database, ReadableDatabase, ReadableTable, Table};
use tracing::info;
use uuid::Uuid;

use super::{CHANNELS, ROLES, StoreError};

/// A member's standing in a registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Op,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Op => "op",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "op" => Ok(Self::Op),
            other => Err(StoreError::Serialization(format!("unknown role '{other}'"))),
        }
    }
}

/// Result of looking a nick up in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    UnknownChannel,
    NotMember,
    Member(Role),
}

/// Result of a grant or revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Applied,
    UnknownChannel,
    /// Nothing written; carries the role the nick already had.
    Unchanged(Option<Role>),
}

/// Repository for channel operations.
pub struct ChannelRepository<'a> {
    db: &'a Database,
}

fn role_key(bucket: &str, nick: &str) -> String {
    format!("{}\0{}", bucket, irc_to_lower(nick))
}

fn read_role(
    roles: &Table<'_, &'static str, &'static str>,
    key: &str,
) -> Result<Option<Role>, StoreError> {
    roles
        .get(key)?
        .map(|v| v.value().parse::<Role>())
        .transpose()
}

impl<'a> ChannelRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register `channel` with `owner` as its owner.
    ///
    /// The channel record, its new bucket and the owner entry are written
    /// in one transaction. Returns `false` (writing nothing) when the
    /// channel is already registered.
    pub fn register(&self, channel: &str, owner: &str) -> Result<bool, StoreError> {
        let key = irc_to_lower(channel);
        let write_txn = self.db.begin_write()?;
        let bucket = {
            let mut channels = write_txn.open_table(CHANNELS)?;
            if channels.get(key.as_str())?.is_some() {
                None
            } else {
                let bucket = Uuid::new_v4().to_string();
                channels.insert(key.as_str(), bucket.as_str())?;
                let mut roles = write_txn.open_table(ROLES)?;
                roles.insert(role_key(&bucket, owner).as_str(), Role::Owner.as_str())?;
                Some(bucket)
            }
        };

        match bucket {
            Some(bucket) => {
                write_txn.commit()?;
                info!(channel = %channel, owner = %owner, bucket = %bucket, "Channel registered");
                Ok(true)
            }
            None => {
                write_txn.abort()?;
                Ok(false)
            }
        }
    }

    /// Bucket id for `channel`, if registered.
    pub fn bucket(&self, channel: &str) -> Result<Option<String>, StoreError> {
        let key = irc_to_lower(channel);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHANNELS)?;
        Ok(table.get(key.as_str())?.map(|v| v.value().to_string()))
    }

    /// Role of `nick` in `channel`.
    pub fn membership(&self, channel: &str, nick: &str) -> Result<Membership, StoreError> {
        let key = irc_to_lower(channel);
        let read_txn = self.db.begin_read()?;
        let channels = read_txn.open_table(CHANNELS)?;
        let Some(bucket) = channels.get(key.as_str())?.map(|v| v.value().to_string()) else {
            return Ok(Membership::UnknownChannel);
        };

        let roles = read_txn.open_table(ROLES)?;
        let role = roles
            .get(role_key(&bucket, nick).as_str())?
            .map(|v| v.value().parse::<Role>())
            .transpose()?;
        Ok(role.map_or(Membership::NotMember, Membership::Member))
    }

    /// Make `nick` an op in `channel`. Owners keep their ownership.
    pub fn grant_op(&self, channel: &str, nick: &str) -> Result<RoleChange, StoreError> {
        self.modify_role(channel, nick, |current| match current {
            Some(Role::Owner) => None,
            _ => Some(Some(Role::Op)),
        })
    }

    /// Remove `nick`'s op entry from `channel`. Owners cannot be removed
    /// this way, and a nick without an entry is left alone.
    pub fn revoke_op(&self, channel: &str, nick: &str) -> Result<RoleChange, StoreError> {
        self.modify_role(channel, nick, |current| match current {
            Some(Role::Op) => Some(None),
            _ => None,
        })
    }

    /// Resolve the channel's bucket and rewrite one entry in a single
    /// write transaction.
    ///
    /// `decide` sees the current role and returns `None` to leave it, or
    /// `Some(new)` to store `new` (`Some(None)` deletes the entry).
    fn modify_role<F>(&self, channel: &str, nick: &str, decide: F) -> Result<RoleChange, StoreError>
    where
        F: FnOnce(Option<Role>) -> Option<Option<Role>>,
    {
        let key = irc_to_lower(channel);
        let write_txn = self.db.begin_write()?;
        let change = {
            let channels = write_txn.open_table(CHANNELS)?;
            let bucket = channels.get(key.as_str())?.map(|v| v.value().to_string());
            match bucket {
                None => RoleChange::UnknownChannel,
                Some(bucket) => {
                    let mut roles = write_txn.open_table(ROLES)?;
                    let entry = role_key(&bucket, nick);
                    let current = read_role(&roles, &entry)?;
                    match decide(current) {
                        None => RoleChange::Unchanged(current),
                        Some(Some(role)) => {
                            roles.insert(entry.as_str(), role.as_str())?;
                            RoleChange::Applied
                        }
                        Some(None) => {
                            roles.remove(entry.as_str())?;
                            RoleChange::Applied
                        }
                    }
                }
            }
        };

        if change == RoleChange::Applied {
            write_txn.commit()?;
            info!(channel = %channel, nick = %nick, "Channel roles updated");
        } else {
            write_txn.abort()?;
        }
        Ok(change)
    }
}
