//! Read-only view of the server handed to every handler.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::http::request::Method;
use crate::http::status::StatusTable;
use crate::template::TemplateManager;

/// A pooled connection to some backing store, owned by the server and
/// closed once during teardown.
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    fn close(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub port: u16,
    /// 0 means a thread per connection.
    pub thread_count: usize,
}

pub struct ServerContext {
    config: Arc<Config>,
    templates: Arc<TemplateManager>,
    data_source: Option<Arc<dyn DataSource>>,
    info: ServerInfo,
}

impl ServerContext {
    pub fn new(
        config: Arc<Config>,
        templates: Arc<TemplateManager>,
        data_source: Option<Arc<dyn DataSource>>,
    ) -> Self {
        let info = ServerInfo {
            name: config.server.name.clone(),
            port: config.server.port,
            thread_count: config.server.thread_count,
        };
        Self {
            config,
            templates,
            data_source,
            info,
        }
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn supported_methods(&self) -> &'static [Method] {
        &Method::ALLOWED
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.config.statuses
    }

    /// The configured data source.
    ///
    /// # Returns
    ///
    /// `ConfigError::DataSourceNotConfigured` when the server was built without one.
    pub fn data_source(&self) -> Result<&Arc<dyn DataSource>, ConfigError> {
        self.data_source.as_ref().ok_or(ConfigError::DataSourceNotConfigured)
    }

    pub fn root_path(&self) -> &Path {
        &self.config.static_files.root
    }

    /// Content type for a file by its extension, `text/plain` when unknown.
    pub fn content_type(&self, path: &Path) -> &str {
        self.config.mime_types.for_path(path)
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    /// Cache lifetime in days for `extension`, `None` when it is not cached.
    pub fn expires_days(&self, extension: &str) -> Option<u32> {
        self.config.expires_days(extension)
    }

    pub(crate) fn owned_data_source(&self) -> Option<&Arc<dyn DataSource>> {
        self.data_source.as_ref()
    }
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerContext")
            .field("info", &self.info)
            .field("root", &self.root_path())
            .field("data_source", &self.data_source.as_ref().map(|ds| ds.name().to_string()))
            .finish()
    }
}
