//! Request handlers and the registry that maps URIs to them.
//!
//! A handler fills in the [`Response`] it is given. Returning an
//! [`HttpError`](crate::http::error::HttpError) inside the `anyhow::Error`
//! selects the response status; any other error becomes a 500.

pub mod dispatcher;
pub mod hello;
pub mod server_info;
pub mod static_files;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::context::ServerContext;
use crate::http::request::Request;
use crate::http::response::Response;

pub trait Handler: Send + Sync {
    fn handle(&self, context: &ServerContext, request: &Request, response: &mut Response) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&ServerContext, &Request, &mut Response) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, context: &ServerContext, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        self(context, request, response)
    }
}

/// URI to handler table, immutable once the server is built.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for an exact `uri`.
    ///
    /// # Returns
    ///
    /// `ConfigError::DuplicateHandler` if the URI is already taken.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::handler::HandlerRegistry;
    /// # use rawhttp::handler::hello::HelloHandler;
    /// let registry = HandlerRegistry::new().register("/hello", HelloHandler).unwrap();
    /// assert!(registry.get("/hello").is_some());
    /// assert!(registry.register("/hello", HelloHandler).is_err());
    /// ```
    pub fn register(mut self, uri: impl Into<String>, handler: impl Handler + 'static) -> Result<Self, ConfigError> {
        let uri = uri.into();
        if self.handlers.contains_key(&uri) {
            return Err(ConfigError::DuplicateHandler(uri));
        }
        tracing::debug!(uri = %uri, "Handler registered");
        self.handlers.insert(uri, Arc::new(handler));
        Ok(self)
    }

    pub fn get(&self, uri: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(uri)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut uris: Vec<&String> = self.handlers.keys().collect();
        uris.sort();
        f.debug_struct("HandlerRegistry").field("uris", &uris).finish()
    }
}
