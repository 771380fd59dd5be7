use async_trait::async_trait;
use chrono::DateTime;
use quarid_proto::Event;
use tracing::trace;

use crate::client::Responder;
use crate::dispatch::Handler;
use crate::error::HandlerError;
use crate::services::invocation::privmsg_parts;
use crate::services::{CommandHandler, CommandInvocation, ServiceContext};

/// `SEEN <nick>`
pub struct Seen;

#[async_trait]
impl CommandHandler for Seen {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let nick = inv.arg(0).unwrap_or_default();
        let text = match ctx.authz.store().seen().get(nick)? {
            Some(record) => {
                let when = DateTime::from_timestamp(record.at, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| record.at.to_string());
                format!("{nick} was last seen in {} at {when}", record.channel)
            }
            None => format!("I haven't seen {nick}"),
        };
        inv.respond(responder, &text).await?;
        Ok(())
    }
}

/// Records who spoke where, for `SEEN`. Register for channel `PRIVMSG`s.
pub struct SeenTracker {
    ctx: ServiceContext,
}

impl SeenTracker {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Handler for SeenTracker {
    fn name(&self) -> &'static str {
        "seen-tracker"
    }

    async fn handle(&self, event: &Event, _responder: &Responder) -> Result<(), HandlerError> {
        let Some((channel, _)) = privmsg_parts(event) else {
            return Ok(());
        };
        let nick = event.origin_nick();
        if nick.is_empty() {
            return Ok(());
        }
        trace!(nick = %nick, channel = %channel, "seen");
        self.ctx
            .authz
            .store()
            .seen()
            .record(nick, channel, event.received_at.timestamp())?;
        Ok(())
    }
}
