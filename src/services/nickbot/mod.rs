//! NickBot: account registration and login.

mod seen;

pub use seen::{Seen, SeenTracker};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Command, CommandHandler, CommandInvocation, Service, ServiceContext, reply_auth_failure};
use crate::client::Responder;
use crate::error::HandlerError;

pub fn service(prefix: &str) -> Service {
    Service::new("NickBot", "Nickname registration", prefix)
        .command(
            Command::new("REGISTER", "Register your current nick", Arc::new(Register))
                .param("password", "At least five characters"),
        )
        .command(
            Command::new("IDENTIFY", "Log in to your nick", Arc::new(Identify))
                .param("password", "Account password"),
        )
        .command(
            Command::new("SEEN", "When a nick last spoke", Arc::new(Seen))
                .param("nick", "Nick to look up")
                .channel_only(),
        )
}

pub struct Register;

#[async_trait]
impl CommandHandler for Register {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let password = inv.arg(0).unwrap_or_default();
        match ctx.authz.register(inv.nick(), password, &inv.identity) {
            Ok(()) => {
                inv.respond(responder, "Registered & LoggedIn").await?;
                Ok(())
            }
            Err(e) => reply_auth_failure(inv, responder, e).await,
        }
    }
}

pub struct Identify;

#[async_trait]
impl CommandHandler for Identify {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let password = inv.arg(0).unwrap_or_default();
        match ctx.authz.identify(inv.nick(), password, &inv.identity) {
            Ok(()) => {
                info!(nick = %inv.nick(), "Identified");
                inv.respond(responder, "Logged In").await?;
                Ok(())
            }
            Err(e) => reply_auth_failure(inv, responder, e).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::context;
    use quarid_proto::Event;
    use tokio::sync::mpsc;

    const ALICE: &str = "alice!~a@example.com";

    async fn run(
        ctx: &ServiceContext,
        handler: &dyn CommandHandler,
        text: &str,
    ) -> (Result<(), HandlerError>, Vec<String>) {
        let (tx, mut rx) = mpsc::channel(8);
        let responder = Responder::new(tx);
        let inv = CommandInvocation::parse("!", ALICE, "quarid", text).unwrap();
        let result = handler.call(ctx, &inv, &responder).await;
        let mut lines = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            lines.push(Event::trailing(&ev).unwrap_or_default().to_string());
        }
        (result, lines)
    }

    #[tokio::test]
    async fn register_then_identify() {
        let (_dir, ctx) = context();

        let (res, lines) = run(&ctx, &Register, "!REGISTER goodpass").await;
        res.unwrap();
        assert_eq!(lines, vec!["Registered & LoggedIn"]);
        assert!(ctx.authz.check_session("alice", ALICE).unwrap());

        let (res, lines) = run(&ctx, &Identify, "!IDENTIFY goodpass").await;
        res.unwrap();
        assert_eq!(lines, vec!["Logged In"]);

        let (_, lines) = run(&ctx, &Identify, "!IDENTIFY wrongpass").await;
        assert_eq!(lines, vec!["Incorrect password"]);
    }

    #[tokio::test]
    async fn register_rejections() {
        let (_dir, ctx) = context();

        let (_, lines) = run(&ctx, &Register, "!REGISTER abcd").await;
        assert_eq!(lines, vec!["Password must be at least 5 chars"]);
        assert!(!ctx.authz.store().accounts().exists("alice").unwrap());

        run(&ctx, &Register, "!REGISTER abcde").await.0.unwrap();
        let (_, lines) = run(&ctx, &Register, "!REGISTER abcde").await;
        assert_eq!(lines, vec!["User already exists"]);
    }

    #[tokio::test]
    async fn identify_unknown_account() {
        let (_dir, ctx) = context();
        let (_, lines) = run(&ctx, &Identify, "!IDENTIFY whatever").await;
        assert_eq!(lines, vec!["User doesn't exist"]);
    }

    #[test]
    fn seen_is_channel_only() {
        let svc = service("!");
        assert!(svc.find("SEEN").unwrap().requires_channel);
        assert!(!svc.find("REGISTER").unwrap().requires_channel);
    }
}
