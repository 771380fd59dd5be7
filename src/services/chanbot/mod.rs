//! ChanBot: channel registration and op delegation.

mod ops;

pub use ops::{AddOp, DropOp, Op};

use std::sync::Arc;

use async_trait::async_trait;
use quarid_proto::ChannelExt;

use super::{Command, CommandHandler, CommandInvocation, Service, ServiceContext, reply_auth_failure};
use crate::client::Responder;
use crate::error::{AuthError, HandlerError};

pub fn service(prefix: &str) -> Service {
    Service::new("ChanBot", "Channel registration", prefix)
        .command(
            Command::new("REGCHAN", "Register a channel to yourself", Arc::new(RegChan))
                .param("channel", "Channel to register"),
        )
        .command(
            Command::new("OP", "Give channel operator status", Arc::new(Op))
                .optional("nick", "Defaults to you")
                .optional("channel", "Defaults to the current channel"),
        )
        .command(
            Command::new("ADDOP", "Add a channel op", Arc::new(AddOp))
                .param("nick", "Registered nick")
                .optional("channel", "Defaults to the current channel"),
        )
        .command(
            Command::new("DROPOP", "Remove a channel op", Arc::new(DropOp))
                .param("nick", "Current op")
                .optional("channel", "Defaults to the current channel"),
        )
}

/// Channel named by argument `index`, else the channel the command was
/// sent in. Replies and returns `None` when there is no usable channel.
async fn target_channel(
    inv: &CommandInvocation,
    responder: &Responder,
    index: usize,
) -> Result<Option<String>, HandlerError> {
    let channel = match inv.arg(index) {
        Some(name) => name,
        None if inv.is_private() => {
            inv.respond(responder, "Channel required").await?;
            return Ok(None);
        }
        None => inv.channel.as_str(),
    };
    if !channel.is_valid_channel() {
        inv.respond(responder, &format!("Not a channel: {channel}")).await?;
        return Ok(None);
    }
    Ok(Some(channel.to_string()))
}

pub struct RegChan;

#[async_trait]
impl CommandHandler for RegChan {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        if let Err(e) = ctx.authz.require_session(inv.nick(), &inv.identity) {
            return reply_auth_failure(inv, responder, e).await;
        }
        let Some(channel) = target_channel(inv, responder, 0).await? else {
            return Ok(());
        };

        match ctx.authz.register_channel(inv.nick(), &channel) {
            Ok(()) => {
                inv.respond(responder, &format!("You are now the owner of {channel}"))
                    .await?;
                Ok(())
            }
            Err(AuthError::AlreadyRegistered) => {
                inv.respond(responder, "Channel already registered").await?;
                Ok(())
            }
            Err(e) => reply_auth_failure(inv, responder, e).await,
        }
    }
}
