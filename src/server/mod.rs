//! Server core: builds the request pipeline, owns the listening socket and
//! the worker pool, and drives the `New -> Running -> Stopped` lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use rawhttp::config::Config;
//! use rawhttp::handler::hello::{HELLO_URI, HelloHandler};
//! use rawhttp::server::ServerBuilder;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut server = ServerBuilder::new(Config::load()?)
//!     .handler(HELLO_URI, HelloHandler)?
//!     .bind()?;
//! let shutdown = server.start()?;
//! // ... later, from any thread
//! shutdown.stop();
//! # Ok(())
//! # }
//! ```

pub mod listener;
pub mod pool;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::context::{DataSource, ServerContext};
use crate::handler::dispatcher::Dispatcher;
use crate::handler::static_files::StaticFiles;
use crate::handler::{Handler, HandlerRegistry};
use crate::http::connection::Pipeline;
use crate::http::response::ResponseBuilder;
use crate::http::writer::ResponseWriter;
use crate::resources::{EmbeddedResources, ResourceLoader};
use crate::server::pool::WorkerPool;
use crate::template::TemplateManager;

const ACCEPT_THREAD: &str = "main-server-thread";
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    New,
    Running,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server can not be started in state {0:?}")]
    InvalidState(ServerState),
    #[error("can not spawn accept thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Collects the collaborators of a server and binds it.
pub struct ServerBuilder {
    config: Config,
    registry: HandlerRegistry,
    resources: Arc<dyn ResourceLoader>,
    clock: Arc<dyn Clock>,
    data_source: Option<Arc<dyn DataSource>>,
    default_handler: Option<Arc<dyn Handler>>,
}

impl ServerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            resources: Arc::new(EmbeddedResources),
            clock: Arc::new(SystemClock),
            data_source: None,
            default_handler: None,
        }
    }

    /// Registers a handler for an exact URI.
    pub fn handler(mut self, uri: impl Into<String>, handler: impl Handler + 'static) -> Result<Self, ConfigError> {
        self.registry = self.registry.register(uri, handler)?;
        Ok(self)
    }

    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Where templates are loaded from. Defaults to the built-in set.
    pub fn resource_loader(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
        self.resources = resources;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Handler for URIs nothing is registered for. Defaults to [`StaticFiles`].
    pub fn default_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Validates the configuration, binds the listening socket and creates
    /// the worker pool. The server does not accept connections until
    /// [`HttpServer::start`].
    pub fn bind(self) -> Result<HttpServer, ConfigError> {
        let root = &self.config.static_files.root;
        if !root.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "static root {} is not a directory",
                root.display()
            )));
        }

        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ConfigError::Bind {
            address: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| ConfigError::Bind {
            address: address.clone(),
            source,
        })?;
        let socket = listener
            .try_clone()
            .map_err(|source| ConfigError::Bind { address, source })?;

        let pool = pool::from_thread_count(self.config.server.thread_count)
            .map_err(|e| ConfigError::Invalid(format!("can not create worker pool: {e}")))?;

        let config = Arc::new(self.config);
        let templates = Arc::new(TemplateManager::new(self.resources)?);
        let default_handler = self
            .default_handler
            .unwrap_or_else(|| Arc::new(StaticFiles::new(Arc::clone(&self.clock))));

        let pipeline = Pipeline {
            responses: ResponseBuilder::new(
                config.server.name.clone(),
                self.clock,
                config.statuses.clone(),
                Arc::clone(&templates),
            ),
            writer: ResponseWriter::new(config.statuses.clone()),
            dispatcher: Dispatcher::new(self.registry, default_handler),
            context: ServerContext::new(Arc::clone(&config), templates, self.data_source),
        };

        tracing::debug!(address = %local_addr, threads = config.server.thread_count, "Server socket bound");

        Ok(HttpServer {
            shared: Arc::new(Shared {
                pool,
                pipeline: Arc::new(pipeline),
                local_addr,
                socket: Mutex::new(Some(socket)),
                stopping: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                accept_thread: Mutex::new(None),
            }),
            listener: Some(listener),
        })
    }
}

/// State shared by the server, the accept thread and shutdown handles.
pub(crate) struct Shared {
    pub(crate) pool: Box<dyn WorkerPool>,
    pub(crate) pipeline: Arc<Pipeline>,
    local_addr: SocketAddr,
    /// Second handle on the listening socket, used to close it from `stop`.
    socket: Mutex<Option<TcpListener>>,
    pub(crate) stopping: AtomicBool,
    stopped: AtomicBool,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Releases the pool and the data source. Runs at most once.
    pub(crate) fn teardown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.shutdown();
        if let Some(data_source) = self.pipeline.context.owned_data_source() {
            match data_source.close() {
                Ok(()) => tracing::debug!(data_source = data_source.name(), "Data source closed"),
                Err(e) => tracing::error!(data_source = data_source.name(), error = %e, "Failed to close data source"),
            }
        }
        tracing::info!("Server stopped");
    }

    fn stop(&self) {
        if self.stopping.swap(true, Ordering::AcqRel) {
            return;
        }

        let accept_thread = self
            .accept_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let socket = self.socket.lock().unwrap_or_else(PoisonError::into_inner).take();
        let closed = socket.as_ref().is_some_and(|socket| self.close_listener(socket));

        if let Some(handle) = accept_thread {
            if !closed {
                self.wake_accept();
            }
            if handle.join().is_err() {
                tracing::error!("Accept thread panicked");
            }
        }
        drop(socket);
        self.teardown();
    }

    /// Shuts the listening socket down so a blocked `accept` returns.
    fn close_listener(&self, socket: &TcpListener) -> bool {
        match socket2::SockRef::from(socket).shutdown(Shutdown::Both) {
            Ok(()) => {
                tracing::debug!(address = %self.local_addr, "Server socket shut down");
                true
            }
            Err(e) => {
                tracing::warn!(address = %self.local_addr, error = %e, "Can not shut down server socket");
                false
            }
        }
    }

    /// Fallback for platforms where shutting down a listener does not
    /// interrupt `accept`: the loop sees the stop flag on this connection.
    fn wake_accept(&self) {
        let target = wake_address(self.local_addr);
        if let Err(e) = TcpStream::connect_timeout(&target, WAKE_TIMEOUT) {
            tracing::error!(address = %target, error = %e, "Can not wake the accept thread");
        }
    }
}

fn wake_address(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

/// A bound HTTP server.
///
/// Dropping it stops the server the same way [`HttpServer::stop`] does.
pub struct HttpServer {
    shared: Arc<Shared>,
    listener: Option<TcpListener>,
}

impl HttpServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }

    pub fn state(&self) -> ServerState {
        if self.shared.stopped.load(Ordering::Acquire) {
            ServerState::Stopped
        } else if self.listener.is_some() {
            ServerState::New
        } else {
            ServerState::Running
        }
    }

    /// Spawns the accept loop.
    ///
    /// # Returns
    ///
    /// A [`ShutdownHandle`] that stops the server from any thread, or
    /// `ServerError::InvalidState` unless the server is still `New`.
    pub fn start(&mut self) -> Result<ShutdownHandle, ServerError> {
        let state = self.state();
        let listener = match (state, self.listener.take()) {
            (ServerState::New, Some(listener)) => listener,
            _ => return Err(ServerError::InvalidState(state)),
        };

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(ACCEPT_THREAD.to_string())
            .spawn(move || listener::run(listener, shared))?;
        *self
            .shared
            .accept_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        let info = self.shared.pipeline.context.server_info();
        tracing::info!(
            name = %info.name,
            address = %self.shared.local_addr,
            threads = info.thread_count,
            "Server started"
        );
        Ok(self.shutdown_handle())
    }

    /// Stops accepting connections and releases server resources.
    /// Connections already being served run to completion.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("local_addr", &self.shared.local_addr)
            .field("state", &self.state())
            .finish()
    }
}

/// Stops a running server from another thread or a signal handler.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
