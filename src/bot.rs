//! Wiring: store, authorizer, services, dispatcher and connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quarid_proto::{Event, command};
use tracing::{info, warn};

use crate::authz::Authorizer;
use crate::client::{Connection, ConnectionConfig, Responder};
use crate::config::{Config, OperCredentials};
use crate::db::Store;
use crate::dispatch::{Dispatcher, Filter, Handler};
use crate::error::{ConnectionError, HandlerError};
use crate::plugins::PluginHost;
use crate::services::nickbot::SeenTracker;
use crate::services::{Router, ServiceContext, chanbot, nickbot, plugin};

/// Sends `OPER` and joins the configured channels once the server
/// welcomes us.
pub struct OnWelcome {
    oper: Option<OperCredentials>,
    channels: Vec<String>,
}

#[async_trait]
impl Handler for OnWelcome {
    fn name(&self) -> &'static str {
        "on-welcome"
    }

    async fn handle(&self, _event: &Event, responder: &Responder) -> Result<(), HandlerError> {
        if let Some(oper) = &self.oper {
            info!(name = %oper.name, "Requesting operator status");
            responder.write(Event::oper(&oper.name, &oper.password)).await?;
        }
        for channel in &self.channels {
            info!(channel = %channel, "Joining");
            responder.write(Event::join(channel)).await?;
        }
        Ok(())
    }
}

/// Logs server numerics worth an operator's attention.
pub struct ServerNotices;

#[async_trait]
impl Handler for ServerNotices {
    fn name(&self) -> &'static str {
        "server-notices"
    }

    async fn handle(&self, event: &Event, _responder: &Responder) -> Result<(), HandlerError> {
        match event.command.as_str() {
            command::RPL_MYINFO => {
                info!(
                    server = event.param(1).unwrap_or_default(),
                    version = event.param(2).unwrap_or_default(),
                    "Server info"
                );
            }
            command::RPL_YOUREOPER => info!("Operator status granted"),
            command::ERR_PASSWDMISMATCH => warn!("Operator credentials rejected"),
            _ => {}
        }
        Ok(())
    }
}

pub struct Bot {
    connection: Connection,
    ctx: ServiceContext,
}

impl Bot {
    /// Build the bot, loading plugins from the configured directories.
    /// Plugin load failures are logged and skipped.
    pub fn new(config: &Config, store: Store) -> Self {
        let plugins = PluginHost::default();
        plugins.load_plugins(&config.plugins.dirs);
        Self::with_plugins(config, store, plugins)
    }

    pub fn with_plugins(config: &Config, store: Store, plugins: PluginHost) -> Self {
        let authz = Authorizer::new(
            store,
            config.irc.admins.clone(),
            Duration::from_secs(config.services.session_window_secs),
        );
        let ctx = ServiceContext {
            authz: Arc::new(authz),
            plugins: Arc::new(plugins),
        };

        let mut services = vec![
            nickbot::service(&config.services.nickbot_prefix),
            chanbot::service(&config.services.chanbot_prefix),
        ];
        if !ctx.plugins.names().is_empty() {
            services.push(plugin::service(&config.plugins.prefix, &ctx.plugins));
        }

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            vec![Filter::command(command::RPL_WELCOME)],
            Arc::new(OnWelcome {
                oper: config.irc.oper.clone(),
                channels: config.irc.channels.clone(),
            }),
        );
        dispatcher.register(
            vec![Filter::predicate(|e| {
                matches!(
                    e.command.as_str(),
                    command::RPL_MYINFO | command::RPL_YOUREOPER | command::ERR_PASSWDMISMATCH
                )
            })],
            Arc::new(ServerNotices),
        );
        dispatcher.register(
            vec![Filter::command(command::PRIVMSG)],
            Arc::new(Router::new(ctx.clone(), services)),
        );
        dispatcher.register(
            vec![Filter::command(command::PRIVMSG), Filter::ChannelTarget],
            Arc::new(SeenTracker::new(ctx.clone())),
        );

        let connection = Connection::new(ConnectionConfig::from_irc(&config.irc), Arc::new(dispatcher));
        Self { connection, ctx }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    pub async fn disconnect(&self, reason: &str) {
        self.connection.disconnect(reason).await;
    }

    /// Resolve when the connection ends.
    pub async fn wait(&self) {
        self.connection.wait().await;
    }
}
