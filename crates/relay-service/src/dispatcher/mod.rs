//! Update dispatcher
//!
//! Routes every update through an ordered table of `(predicate, handler)`
//! pairs. The first route whose predicate holds handles the update; updates no
//! route accepts are dropped.

mod routes;
mod sequencer;

use std::sync::Arc;

use futures::future::BoxFuture;
use relay_core::{OutgoingText, Update};
use tracing::{debug, error, warn};

use crate::services::{ServiceContext, ServiceResult};

pub use routes::default_routes;
pub use sequencer::{SequenceKey, Sequencer, Turn};

const HANDLER_FAILURE_NOTICE: &str = "Bot error, check the logs";

/// Future returned by a route handler, borrowing the context and the update
pub type HandlerFuture<'a> = BoxFuture<'a, ServiceResult<()>>;

/// Whether a route accepts an update
pub type Predicate = fn(&ServiceContext, &Update) -> bool;

/// Handles an accepted update
pub type Handler = for<'a> fn(&'a ServiceContext, &'a Update) -> HandlerFuture<'a>;

/// One entry of the route table
#[derive(Clone, Copy)]
pub struct Route {
    pub name: &'static str,
    pub predicate: Predicate,
    pub handler: Handler,
}

impl Route {
    pub const fn new(name: &'static str, predicate: Predicate, handler: Handler) -> Self {
        Self {
            name,
            predicate,
            handler,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("name", &self.name).finish()
    }
}

/// Ordered route table bound to a service context
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: Arc<ServiceContext>,
    routes: Vec<Route>,
    sequencer: Arc<Sequencer>,
}

impl Dispatcher {
    /// Dispatcher with the standard route table
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self::with_routes(ctx, default_routes())
    }

    pub fn with_routes(ctx: Arc<ServiceContext>, routes: Vec<Route>) -> Self {
        Self {
            ctx,
            routes,
            sequencer: Arc::new(Sequencer::new()),
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Queue `update` behind earlier updates of its conversation
    ///
    /// Call in arrival order, then hand the turn to `dispatch_in_turn` on the
    /// update's own task.
    pub fn enqueue(&self, update: &Update) -> Turn {
        self.sequencer.enqueue(update)
    }

    /// Wait for `turn`, then dispatch; the next update of the conversation
    /// starts once this one is handled
    pub async fn dispatch_in_turn(
        &self,
        update: &Update,
        mut turn: Turn,
    ) -> Option<&'static str> {
        turn.ready().await;
        let route = self.dispatch(update).await;
        drop(turn);
        route
    }

    /// First route accepting `update`
    pub fn route_for(&self, update: &Update) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| (route.predicate)(&self.ctx, update))
    }

    /// Run the matching handler, returning the name of the route taken
    ///
    /// Handler failures are logged and announced in the staff chat; they never
    /// reach the caller.
    pub async fn dispatch(&self, update: &Update) -> Option<&'static str> {
        let Some(route) = self.route_for(update) else {
            debug!("No route accepts the update");
            return None;
        };
        debug!(route = route.name, "Dispatching update");

        if let Err(err) = (route.handler)(&self.ctx, update).await {
            error!(
                route = route.name,
                error = %err,
                error_code = err.error_code(),
                "Handler failed"
            );
            let notice = OutgoingText::new(self.ctx.staff_chat_id(), HANDLER_FAILURE_NOTICE);
            if let Err(send_err) = self.ctx.gateway().send_text(notice).await {
                warn!(error = %send_err, "Failed to report handler failure to staff");
            }
        }
        Some(route.name)
    }
}
