//! Chat-triggered services.
//!
//! A [`Service`] is a named set of [`Command`]s sharing a prefix symbol.
//! The [`Router`] turns channel and private messages into
//! [`CommandInvocation`]s and runs the matching command's handler.

pub mod chanbot;
mod invocation;
pub mod nickbot;
pub mod plugin;
mod router;

pub use invocation::CommandInvocation;
pub use router::Router;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::authz::Authorizer;
use crate::client::Responder;
use crate::error::{AuthError, HandlerError};
use crate::plugins::PluginHost;

/// Reply sent when the store fails underneath a command.
pub const GENERIC_FAILURE: &str = "Something went wrong, try again later";

/// What every command handler can reach.
#[derive(Clone)]
pub struct ServiceContext {
    pub authz: Arc<Authorizer>,
    pub plugins: Arc<PluginHost>,
}

/// Body of one command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError>;
}

#[derive(Debug, Clone)]
pub struct CmdParam {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

pub struct Command {
    /// Upper-case command name.
    pub name: String,
    pub description: String,
    /// Silently ignore private invocations.
    pub requires_channel: bool,
    pub params: Vec<CmdParam>,
    pub handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn new(name: &str, description: &str, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.to_uppercase(),
            description: description.to_string(),
            requires_channel: false,
            params: Vec::new(),
            handler,
        }
    }

    pub fn param(mut self, name: &'static str, description: &'static str) -> Self {
        self.params.push(CmdParam {
            name,
            description,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, description: &'static str) -> Self {
        self.params.push(CmdParam {
            name,
            description,
            required: false,
        });
        self
    }

    pub fn channel_only(mut self) -> Self {
        self.requires_channel = true;
        self
    }

    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// `NAME <required> [optional]`
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for p in &self.params {
            if p.required {
                usage.push_str(&format!(" <{}>", p.name));
            } else {
                usage.push_str(&format!(" [{}]", p.name));
            }
        }
        usage
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("requires_channel", &self.requires_channel)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Service {
    pub name: String,
    pub description: String,
    pub prefix: String,
    pub commands: Vec<Command>,
}

impl Service {
    pub fn new(name: &str, description: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            prefix: prefix.to_string(),
            commands: Vec::new(),
        }
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Look up a command by its upper-case name.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }
}

/// Chat reply for a user-facing authorization failure. Store failures
/// have no reply here; the router answers those generically.
pub(crate) fn auth_failure_text(err: &AuthError) -> Option<String> {
    let text = match err {
        AuthError::NoSuchAccount => "User doesn't exist".to_string(),
        AuthError::BadPassword => "Incorrect password".to_string(),
        AuthError::AlreadyRegistered => "User already exists".to_string(),
        AuthError::WeakPassword { min } => format!("Password must be at least {min} chars"),
        AuthError::NoSuchChannel => "Channel not registered".to_string(),
        AuthError::NoPermission => "No Permissions".to_string(),
        AuthError::NotLoggedIn | AuthError::InvalidIdentity(_) => "Must login".to_string(),
        AuthError::Store(_) => return None,
    };
    Some(text)
}

/// Answer `err` in chat, or hand it back when it is not user-facing.
pub(crate) async fn reply_auth_failure(
    inv: &CommandInvocation,
    responder: &Responder,
    err: AuthError,
) -> Result<(), HandlerError> {
    match auth_failure_text(&err) {
        Some(text) => {
            inv.respond(responder, &text).await?;
            Ok(())
        }
        None => Err(err.into()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::db::test_support::temp_store;

    /// Context over a fresh store with the given global-operator masks.
    pub fn context_with_admins(admins: &[&str]) -> (TempDir, ServiceContext) {
        let (dir, store) = temp_store();
        let admins = admins.iter().map(|s| s.to_string()).collect();
        let ctx = ServiceContext {
            authz: Arc::new(Authorizer::new(store, admins, Duration::from_secs(3600))),
            plugins: Arc::new(PluginHost::default()),
        };
        (dir, ctx)
    }

    pub fn context() -> (TempDir, ServiceContext) {
        context_with_admins(&[])
    }
}
