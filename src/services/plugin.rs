//! Exposes loaded plugins as commands.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandHandler, CommandInvocation, GENERIC_FAILURE, Service, ServiceContext};
use crate::client::Responder;
use crate::error::HandlerError;
use crate::plugins::{PluginHost, ScriptVars};

/// One command per loaded plugin, named after it.
pub fn service(prefix: &str, host: &PluginHost) -> Service {
    host.names().into_iter().fold(
        Service::new("Plugins", "Scripted commands", prefix),
        |svc, name| {
            let description = format!("Runs the {name} plugin");
            let command = Command::new(&name, &description, Arc::new(RunPlugin { name: name.clone() }));
            svc.command(command)
        },
    )
}

pub struct RunPlugin {
    name: String,
}

#[async_trait]
impl CommandHandler for RunPlugin {
    async fn call(
        &self,
        ctx: &ServiceContext,
        inv: &CommandInvocation,
        responder: &Responder,
    ) -> Result<(), HandlerError> {
        let vars = ScriptVars {
            nick: inv.nick().to_string(),
            channel: inv.channel.clone(),
        };
        let output = match ctx.plugins.run(&self.name, &vars) {
            Ok(output) => output,
            Err(e) => {
                inv.respond(responder, GENERIC_FAILURE).await?;
                return Err(e.into());
            }
        };
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            inv.respond(responder, line).await?;
        }
        Ok(())
    }
}
