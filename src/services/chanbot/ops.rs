use async_trait::async_trait;
use tracing::info;

use super::target_channel;
use crate::client::Responder;
use crate::db::{Role, RoleChange};
use crate::error::{AuthError, HandlerError};
use crate::services::{CommandHandler, CommandInvocation, ServiceContext, reply_auth_failure};

/// Minimum channel role a command needs.
#[derive(Clone, Copy)]
enum Need {
    Op,
    Owner,
}

/// Global operators pass outright. Everyone else needs a live session and
/// a role in `channel` that satisfies `need`.
fn authorize(
    ctx: &ServiceContext,
    inv: &CommandInvocation,
    channel: &str,
    need: Need,
) -> Result<(), AuthError> {
    if ctx.authz.is_global_oper(&inv.identity) {
        return Ok(());
    }
    ctx.authz.require_session(inv.nick(), &inv.identity)?;
    match (need, ctx.authz.channel_role(inv.nick(), channel)?) {
        (Need::Op, _) | (Need::Owner, Role::Owner) => Ok(()),
        (Need::Owner, Role::Op) => Err(AuthError::NoPermission),
    }
}

/// `OP [nick] [channel]`
pub struct Op;

#[async_trait]
impl CommandHandler for Op {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let nick = inv.arg(0).unwrap_or(inv.nick()).to_string();
        let Some(channel) = target_channel(inv, responder, 1).await? else {
            return Ok(());
        };
        if let Err(e) = authorize(ctx, inv, &channel, Need::Op) {
            return reply_auth_failure(inv, responder, e).await;
        }

        info!(by = %inv.nick(), nick = %nick, channel = %channel, "OP");
        responder.mode(&channel, "+o", &nick).await?;
        Ok(())
    }
}

/// `ADDOP <nick> [channel]`
pub struct AddOp;

#[async_trait]
impl CommandHandler for AddOp {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let target = inv.arg(0).unwrap_or_default();
        let Some(channel) = target_channel(inv, responder, 1).await? else {
            return Ok(());
        };
        if let Err(e) = authorize(ctx, inv, &channel, Need::Owner) {
            return reply_auth_failure(inv, responder, e).await;
        }

        let text = match ctx.authz.grant_op(inv.nick(), target, &channel) {
            Ok(RoleChange::Unchanged(Some(Role::Owner))) => format!("{target} owns {channel}"),
            Ok(_) => format!("{target} is now an OP in {channel}"),
            Err(e) => return reply_auth_failure(inv, responder, e).await,
        };
        inv.respond(responder, &text).await?;
        Ok(())
    }
}

/// `DROPOP <nick> [channel]`
pub struct DropOp;

#[async_trait]
impl CommandHandler for DropOp {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let target = inv.arg(0).unwrap_or_default();
        let Some(channel) = target_channel(inv, responder, 1).await? else {
            return Ok(());
        };
        if let Err(e) = authorize(ctx, inv, &channel, Need::Owner) {
            return reply_auth_failure(inv, responder, e).await;
        }

        let text = match ctx.authz.revoke_op(inv.nick(), target, &channel) {
            Ok(RoleChange::Applied) => format!("{target} is no longer an OP in {channel}"),
            Ok(RoleChange::Unchanged(Some(Role::Owner))) => format!("{target} owns {channel}"),
            Ok(_) => format!("{target} is not an OP in {channel}"),
            Err(e) => return reply_auth_failure(inv, responder, e).await,
        };
        inv.respond(responder, &text).await?;
        Ok(())
    }
}
