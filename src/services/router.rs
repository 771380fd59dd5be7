use async_trait::async_trait;
use quarid_proto::Event;
use tracing::{debug, error};

use super::invocation::privmsg_parts;
use super::{Command, CommandInvocation, GENERIC_FAILURE, Service, ServiceContext};
use crate::client::Responder;
use crate::dispatch::Handler;
use crate::error::{AuthError, HandlerError};

/// Turns `PRIVMSG`s into command invocations.
///
/// Services sharing a prefix form one namespace: a command name is looked
/// up across all of them in registration order, and an unknown name gets
/// a single `Unknown command` reply for the whole namespace.
pub struct Router {
    ctx: ServiceContext,
    services: Vec<Service>,
}

impl Router {
    pub fn new(ctx: ServiceContext, services: Vec<Service>) -> Self {
        Self { ctx, services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Distinct prefixes in registration order.
    fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = Vec::new();
        for svc in &self.services {
            if !prefixes.contains(&svc.prefix.as_str()) {
                prefixes.push(&svc.prefix);
            }
        }
        prefixes
    }

    fn namespace<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Service> + 'a {
        self.services.iter().filter(move |s| s.prefix == prefix)
    }

    fn find(&self, prefix: &str, name: &str) -> Option<&Command> {
        self.services
            .iter()
            .filter(|s| s.prefix == prefix)
            .find_map(|s| s.find(name))
    }

    /// Route one invocation that arrived under `prefix`.
    pub async fn route(
        &self,
        prefix: &str,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        if inv.name == "HELP" {
            return self.help(prefix, inv, responder).await;
        }

        let Some(command) = self.find(prefix, &inv.name) else {
            inv.respond(responder, &format!("Unknown command: {}", inv.name))
                .await?;
            return Ok(());
        };

        if command.requires_channel && inv.is_private() {
            debug!(command = %command.name, "Channel-only command sent privately");
            return Ok(());
        }
        if inv.args.len() < command.required_params() {
            let text = format!("Not enough params. Usage: {}", command.usage());
            inv.respond(responder, &text).await?;
            return Ok(());
        }

        debug!(command = %command.name, nick = %inv.nick(), channel = %inv.channel, "Running command");
        match command.handler.call(&self.ctx, inv, responder).await {
            Err(e) if is_store_failure(&e) => {
                error!(command = %command.name, error = %e, "Command failed in the store");
                inv.respond(responder, GENERIC_FAILURE).await?;
                Err(e)
            }
            other => other,
        }
    }

    async fn help(
        &self,
        prefix: &str,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        match inv.arg(0) {
            Some(name) => {
                let name = name.trim_start_matches(prefix).to_uppercase();
                let text = match self.find(prefix, &name) {
                    Some(cmd) if cmd.description.is_empty() => format!("Usage: {prefix}{}", cmd.usage()),
                    Some(cmd) => format!("Usage: {prefix}{} - {}", cmd.usage(), cmd.description),
                    None => format!("Unknown command: {name}"),
                };
                inv.respond(responder, &text).await?;
            }
            None => {
                let names: Vec<String> = self
                    .namespace(prefix)
                    .flat_map(|s| s.commands.iter())
                    .map(|c| format!("{prefix}{}", c.name))
                    .collect();
                let text = format!("Commands: {} (see {prefix}HELP <command>)", names.join(", "));
                inv.respond(responder, &text).await?;
            }
        }
        Ok(())
    }
}

fn is_store_failure(err: &HandlerError) -> bool {
    matches!(
        err,
        HandlerError::Store(_) | HandlerError::Auth(AuthError::Store(_))
    )
}

#[async_trait]
impl Handler for Router {
    fn name(&self) -> &'static str {
        "router"
    }

    async fn handle(&self, event: &Event, responder: &Responder) -> Result<(), HandlerError> {
        let Some((target, text)) = privmsg_parts(event) else {
            return Ok(());
        };
        for prefix in self.prefixes() {
            if let Some(inv) = CommandInvocation::parse(prefix, &event.origin, target, text) {
                return self.route(prefix, &inv, responder).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use crate::services::CommandHandler;
    use crate::services::test_support::context;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler for Counter {
        async fn call(
            &self,
            _ctx: &ServiceContext,
            inv: &CommandInvocation,
            responder: &Responder,
        ) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            inv.respond(responder, "ran").await?;
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl CommandHandler for Broken {
        async fn call(
            &self,
            _ctx: &ServiceContext,
            _inv: &CommandInvocation,
            _responder: &Responder,
        ) -> Result<(), HandlerError> {
            Err(StoreError::Serialization("bad".into()).into())
        }
    }

    struct Fixture {
        router: Router,
        counter: Arc<Counter>,
        rx: mpsc::Receiver<Event>,
        responder: Responder,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let (dir, ctx) = context();
        let counter = Arc::new(Counter::default());
        let first = Service::new("First", "", "!").command(
            Command::new("ping", "answers", counter.clone())
                .param("what", "")
                .optional("extra", ""),
        );
        let second = Service::new("Second", "", "!")
            .command(Command::new("where", "", counter.clone()).channel_only())
            .command(Command::new("broken", "", Arc::new(Broken)));
        let other = Service::new("Other", "", "@").command(Command::new("dice", "", counter.clone()));

        let (tx, rx) = mpsc::channel(16);
        Fixture {
            router: Router::new(ctx, vec![first, second, other]),
            counter,
            rx,
            responder: Responder::new(tx),
            _dir: dir,
        }
    }

    async fn send(f: &Fixture, target: &str, text: &str) -> Result<(), HandlerError> {
        let line = format!(":alice!~a@example.com PRIVMSG {target} :{text}");
        let event: Event = line.parse().unwrap();
        f.router.handle(&event, &f.responder).await
    }

    fn next_line(f: &mut Fixture) -> String {
        f.rx.try_recv().unwrap().encode()
    }

    #[tokio::test]
    async fn runs_commands_across_services_sharing_a_prefix() {
        let mut f = fixture();
        send(&f, "#chat", "!ping x").await.unwrap();
        send(&f, "#chat", "!where").await.unwrap();
        send(&f, "#chat", "@dice").await.unwrap();
        assert_eq!(f.counter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(next_line(&mut f), "PRIVMSG #chat :alice: ran\r\n");
    }

    #[tokio::test]
    async fn missing_params_reply_with_usage() {
        let mut f = fixture();
        send(&f, "quarid", "!ping").await.unwrap();
        assert_eq!(f.counter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            next_line(&mut f),
            "PRIVMSG alice :Not enough params. Usage: PING <what> [extra]\r\n"
        );
    }

    #[tokio::test]
    async fn channel_only_command_is_silent_in_private() {
        let mut f = fixture();
        send(&f, "quarid", "!where").await.unwrap();
        assert_eq!(f.counter.calls.load(Ordering::SeqCst), 0);
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_command_replies_once() {
        let mut f = fixture();
        send(&f, "#chat", "!nope").await.unwrap();
        assert_eq!(next_line(&mut f), "PRIVMSG #chat :alice: Unknown command: NOPE\r\n");
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unprefixed_chatter_is_ignored() {
        let mut f = fixture();
        send(&f, "#chat", "hello everyone").await.unwrap();
        send(&f, "quarid", "ping x").await.unwrap();
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn store_failure_gets_generic_reply_and_is_reported() {
        let mut f = fixture();
        let err = send(&f, "#chat", "!broken").await.unwrap_err();
        assert_eq!(err.error_code(), "store_error");
        assert_eq!(next_line(&mut f), format!("PRIVMSG #chat :alice: {GENERIC_FAILURE}\r\n"));
    }

    #[tokio::test]
    async fn help_lists_namespace_and_describes_commands() {
        let mut f = fixture();
        send(&f, "quarid", "!help").await.unwrap();
        assert_eq!(
            next_line(&mut f),
            "PRIVMSG alice :Commands: !PING, !WHERE, !BROKEN (see !HELP <command>)\r\n"
        );

        send(&f, "quarid", "!help ping").await.unwrap();
        assert_eq!(
            next_line(&mut f),
            "PRIVMSG alice :Usage: !PING <what> [extra] - answers\r\n"
        );

        send(&f, "quarid", "@help").await.unwrap();
        assert_eq!(
            next_line(&mut f),
            "PRIVMSG alice :Commands: @DICE (see @HELP <command>)\r\n"
        );
    }
}
