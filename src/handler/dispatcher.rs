use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::context::ServerContext;
use crate::handler::{Handler, HandlerRegistry};
use crate::http::error::HttpError;
use crate::http::request::Request;
use crate::http::response::Response;

/// Routes a request to the handler registered for its exact URI, or to the
/// default handler.
pub struct Dispatcher {
    registry: HandlerRegistry,
    default_handler: Arc<dyn Handler>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, default_handler: Arc<dyn Handler>) -> Self {
        Self {
            registry,
            default_handler,
        }
    }

    /// Runs the chosen handler.
    ///
    /// An `HttpError` from the handler comes back unchanged; anything else,
    /// panics included, is reported as `HandlingFailed` for the URI.
    pub fn handle(&self, context: &ServerContext, request: &Request, response: &mut Response) -> Result<(), HttpError> {
        let handler = match self.registry.get(request.uri()) {
            Some(handler) => handler,
            None => {
                tracing::trace!(uri = request.uri(), "No handler registered, using default");
                &self.default_handler
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(context, request, response)));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => match err.downcast::<HttpError>() {
                Ok(http) => Err(http),
                Err(other) => Err(HttpError::handling_failed(request.uri(), other)),
            },
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                Err(HttpError::HandlingFailed {
                    uri: request.uri().to_string(),
                    message,
                    source: None,
                })
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("registry", &self.registry).finish()
    }
}
