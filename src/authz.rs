//! Authorization engine.
//!
//! Composes hostmask matching with the store: password login, sliding
//! sessions, channel ownership and op delegation. Holds no state of its
//! own beyond configuration; every decision is made from records read
//! in the call that needs them.

use std::time::Duration;

use chrono::Utc;
use quarid_proto::hostmask::matches_admin;
use quarid_proto::{HostMask, irc_to_lower};
use tracing::{debug, info};

use crate::db::{Membership, Role, RoleChange, SessionCheck, Store, StoreError};
use crate::error::AuthError;
use crate::security::{MIN_PASSWORD_LEN, hash_password, is_strong_enough, verify_password};

pub struct Authorizer {
    store: Store,
    admins: Vec<String>,
    session_window_secs: i64,
}

impl Authorizer {
    pub fn new(store: Store, admins: Vec<String>, session_window: Duration) -> Self {
        Self {
            store,
            admins,
            session_window_secs: i64::try_from(session_window.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// `nick:user@host`, with the nick case-folded and the host
    /// lowercased.
    pub fn session_key(nick: &str, identity: &str) -> Result<String, AuthError> {
        let mask = HostMask::parse(identity)
            .map_err(|_| AuthError::InvalidIdentity(identity.to_string()))?;
        Ok(format!(
            "{}:{}@{}",
            irc_to_lower(nick),
            mask.user,
            mask.host.to_ascii_lowercase()
        ))
    }

    /// True when `identity` matches a configured global-operator mask.
    /// Global operators bypass per-channel role checks.
    pub fn is_global_oper(&self, identity: &str) -> bool {
        matches_admin(identity, &self.admins)
    }

    pub fn login(&self, nick: &str, identity: &str) -> Result<(), AuthError> {
        self.login_at(nick, identity, Utc::now().timestamp())
    }

    pub fn login_at(&self, nick: &str, identity: &str, now: i64) -> Result<(), AuthError> {
        let key = Self::session_key(nick, identity)?;
        self.start_session(nick, &key, now)
    }

    fn start_session(&self, nick: &str, key: &str, now: i64) -> Result<(), AuthError> {
        self.store.sessions().touch(key, now)?;
        info!(nick = %nick, "Session started");
        Ok(())
    }

    /// Valid-session check that also refreshes the session.
    ///
    /// Unparseable identities have no session.
    pub fn check_session(&self, nick: &str, identity: &str) -> Result<bool, StoreError> {
        self.check_session_at(nick, identity, Utc::now().timestamp())
    }

    pub fn check_session_at(&self, nick: &str, identity: &str, now: i64) -> Result<bool, StoreError> {
        let Ok(key) = Self::session_key(nick, identity) else {
            return Ok(false);
        };
        let outcome = self
            .store
            .sessions()
            .check_and_refresh(&key, now, self.session_window_secs)?;
        Ok(outcome == SessionCheck::Refreshed)
    }

    /// [`check_session`](Self::check_session) as a `NotLoggedIn` error.
    pub fn require_session(&self, nick: &str, identity: &str) -> Result<(), AuthError> {
        if self.check_session(nick, identity)? {
            Ok(())
        } else {
            Err(AuthError::NotLoggedIn)
        }
    }

    /// Create an account and log it in. Nothing is written unless the
    /// identity can carry a session.
    pub fn register(&self, nick: &str, password: &str, identity: &str) -> Result<(), AuthError> {
        let key = Self::session_key(nick, identity)?;
        let accounts = self.store.accounts();
        if accounts.exists(nick)? {
            return Err(AuthError::AlreadyRegistered);
        }
        if !is_strong_enough(password) {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let hash = hash_password(password).map_err(|e| StoreError::Hash(e.to_string()))?;
        if !accounts.create(nick, &hash)? {
            return Err(AuthError::AlreadyRegistered);
        }
        info!(nick = %nick, "Account registered");
        self.start_session(nick, &key, Utc::now().timestamp())
    }

    pub fn identify(&self, nick: &str, password: &str, identity: &str) -> Result<(), AuthError> {
        let stored = self
            .store
            .accounts()
            .password_hash(nick)?
            .ok_or(AuthError::NoSuchAccount)?;
        if !verify_password(password, &stored) {
            debug!(nick = %nick, "Identify failed: bad password");
            return Err(AuthError::BadPassword);
        }
        self.login(nick, identity)
    }

    pub fn register_channel(&self, nick: &str, channel: &str) -> Result<(), AuthError> {
        if self.store.channels().register(channel, nick)? {
            Ok(())
        } else {
            Err(AuthError::AlreadyRegistered)
        }
    }

    pub fn channel_role(&self, nick: &str, channel: &str) -> Result<Role, AuthError> {
        match self.store.channels().membership(channel, nick)? {
            Membership::Member(role) => Ok(role),
            Membership::NotMember => Err(AuthError::NoPermission),
            Membership::UnknownChannel => Err(AuthError::NoSuchChannel),
        }
    }

    /// Make `target` an op of `channel`. The caller has already checked
    /// that `acting` may do so.
    pub fn grant_op(&self, acting: &str, target: &str, channel: &str) -> Result<RoleChange, AuthError> {
        if self.store.channels().bucket(channel)?.is_none() {
            return Err(AuthError::NoSuchChannel);
        }
        if !self.store.accounts().exists(target)? {
            return Err(AuthError::NoSuchAccount);
        }
        let change = self.store.channels().grant_op(channel, target)?;
        if change == RoleChange::UnknownChannel {
            return Err(AuthError::NoSuchChannel);
        }
        debug!(acting = %acting, target = %target, channel = %channel, change = ?change, "grant op");
        Ok(change)
    }

    /// Remove `target`'s op entry in `channel`. The caller has already
    /// checked that `acting` may do so.
    pub fn revoke_op(&self, acting: &str, target: &str, channel: &str) -> Result<RoleChange, AuthError> {
        let change = self.store.channels().revoke_op(channel, target)?;
        if change == RoleChange::UnknownChannel {
            return Err(AuthError::NoSuchChannel);
        }
        debug!(acting = %acting, target = %target, channel = %channel, change = ?change, "revoke op");
        Ok(change)
    }
}
