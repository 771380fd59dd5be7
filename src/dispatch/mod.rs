//! Event dispatcher.
//!
//! Routes are `(filters, handler)` pairs. Every decoded event is checked
//! against every route and each matching handler runs in its own tokio
//! task, so a slow handler stalls neither the read loop nor its siblings.
//! Handler errors stop at this boundary: they are logged and dispatch to
//! the other routes carries on.

mod filter;

pub use filter::Filter;

use std::sync::Arc;

use async_trait::async_trait;
use quarid_proto::Event;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::Responder;
use crate::error::HandlerError;

/// Something that reacts to events.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &Event, responder: &Responder) -> Result<(), HandlerError>;
}

struct Route {
    filters: Vec<Filter>,
    handler: Arc<dyn Handler>,
}

impl Route {
    fn matches(&self, event: &Event) -> bool {
        self.filters.iter().all(|f| f.matches(event))
    }
}

#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. A route with no filters receives every event.
    pub fn register(&mut self, filters: Vec<Filter>, handler: Arc<dyn Handler>) {
        debug!(handler = handler.name(), filters = ?filters, "Route registered");
        self.routes.push(Route { filters, handler });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Spawn every matching handler. The returned handles complete when
    /// each handler does; the connection ignores them, tests await them.
    pub fn dispatch(&self, event: Arc<Event>, responder: &Responder) -> Vec<JoinHandle<()>> {
        self.routes
            .iter()
            .filter(|route| route.matches(&event))
            .map(|route| {
                let handler = Arc::clone(&route.handler);
                let event = Arc::clone(&event);
                let responder = responder.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.handle(&event, &responder).await {
                        warn!(
                            handler = handler.name(),
                            command = %event.command,
                            code = e.error_code(),
                            error = %e,
                            "Handler failed"
                        );
                    }
                })
            })
            .collect()
    }
}
