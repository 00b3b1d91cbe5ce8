//! Server configuration.
//!
//! Three YAML documents are read through a [`ResourceLoader`]:
//!
//! - `server.yaml`: server identity, bind address, worker threads, static root
//! - `statuses.yaml`: status code to reason phrase
//! - `mime-types.yaml`: file extension to content type
//!
//! Environment variables are applied on top:
//!
//! | Variable            | Overrides                   |
//! |---------------------|-----------------------------|
//! | `RAWHTTP_RESOURCES` | directory to load from      |
//! | `RAWHTTP_NAME`      | `server.name`               |
//! | `RAWHTTP_HOST`      | `server.host`               |
//! | `RAWHTTP_PORT`      | `server.port`               |
//! | `RAWHTTP_THREADS`   | `server.thread_count`       |
//! | `RAWHTTP_ROOT`      | `static.root`               |

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::http::mime::MimeTypes;
use crate::http::status::StatusTable;
use crate::resources::{DirResources, EmbeddedResources, ResourceLoader};

pub const SERVER_DOCUMENT: &str = "server.yaml";
pub const STATUSES_DOCUMENT: &str = "statuses.yaml";
pub const MIME_TYPES_DOCUMENT: &str = "mime-types.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("can not read resource {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML in {name}: {source}")]
    Yaml {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("http handler already exists for resource url={0}")]
    DuplicateHandler(String),

    #[error("datasource is not configured for this context")]
    DataSourceNotConfigured,

    #[error("can not render template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("can not create server socket on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Worker threads; 0 spawns a thread per connection.
    #[serde(default)]
    pub thread_count: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StaticSettings {
    pub root: PathBuf,
    #[serde(default)]
    pub expires_days: u32,
    #[serde(default)]
    pub expires_extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ServerDocument {
    server: ServerSettings,
    #[serde(rename = "static")]
    static_files: StaticSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Immutable server configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerSettings,
    pub static_files: StaticSettings,
    pub statuses: StatusTable,
    pub mime_types: MimeTypes,
}

impl Config {
    /// Loads the configuration the way the binary does: resources from
    /// `RAWHTTP_RESOURCES` (built-in defaults when unset), then environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("RAWHTTP_RESOURCES") {
            Ok(dir) => {
                tracing::info!(dir = %dir, "Loading server resources from directory");
                Self::from_loader(&DirResources::new(dir))?
            }
            Err(_) => Self::from_loader(&EmbeddedResources)?,
        };
        cfg.apply_env_overrides()?;
        cfg.log_settings();
        Ok(cfg)
    }

    pub fn from_loader(loader: &dyn ResourceLoader) -> Result<Self, ConfigError> {
        let document: ServerDocument = parse_document(loader, SERVER_DOCUMENT)?;
        let statuses: BTreeMap<u16, String> = parse_document(loader, STATUSES_DOCUMENT)?;
        let mime_types: HashMap<String, String> = parse_document(loader, MIME_TYPES_DOCUMENT)?;

        Ok(Self {
            server: document.server,
            static_files: document.static_files,
            statuses: StatusTable::new(statuses),
            mime_types: MimeTypes::new(mime_types),
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = env_value::<String>("RAWHTTP_NAME")? {
            self.server.name = name;
        }
        if let Some(host) = env_value::<String>("RAWHTTP_HOST")? {
            self.server.host = host;
        }
        if let Some(port) = env_value::<u16>("RAWHTTP_PORT")? {
            self.server.port = port;
        }
        if let Some(threads) = env_value::<usize>("RAWHTTP_THREADS")? {
            self.server.thread_count = threads;
        }
        if let Some(root) = env_value::<PathBuf>("RAWHTTP_ROOT")? {
            self.static_files.root = root;
        }
        Ok(())
    }

    /// Address to bind, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Days a resource with `extension` may be cached, if it is cacheable.
    pub fn expires_days(&self, extension: &str) -> Option<u32> {
        self.static_files
            .expires_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
            .then_some(self.static_files.expires_days)
    }

    fn log_settings(&self) {
        tracing::debug!(
            name = %self.server.name,
            address = %self.address(),
            threads = self.server.thread_count,
            root = %self.static_files.root.display(),
            expires_days = self.static_files.expires_days,
            "Server configuration loaded"
        );
    }
}

fn parse_document<T: DeserializeOwned>(loader: &dyn ResourceLoader, name: &str) -> Result<T, ConfigError> {
    let raw = loader.load_config(name)?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
        name: name.to_string(),
        source,
    })
}

fn env_value<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Docs(&'static str);

    impl ResourceLoader for Docs {
        fn load_config(&self, name: &str) -> Result<String, ConfigError> {
            match name {
                SERVER_DOCUMENT => Ok(self.0.to_string()),
                STATUSES_DOCUMENT => Ok("200: OK\n500: Internal Server Error\n".to_string()),
                MIME_TYPES_DOCUMENT => Ok("html: text/html\n".to_string()),
                other => Err(ConfigError::ResourceNotFound(other.to_string())),
            }
        }

        fn load_template(&self, name: &str) -> Result<String, ConfigError> {
            Err(ConfigError::ResourceNotFound(name.to_string()))
        }
    }

    const MINIMAL: &str = "server:\n  name: test\n  port: 8081\nstatic:\n  root: /srv\n";

    #[test]
    fn defaults_for_optional_fields() {
        let cfg = Config::from_loader(&Docs(MINIMAL)).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.thread_count, 0);
        assert_eq!(cfg.static_files.expires_days, 0);
        assert_eq!(cfg.address(), "0.0.0.0:8081");
        assert_eq!(cfg.statuses.message(200), "OK");
        assert_eq!(cfg.mime_types.content_type("html"), "text/html");
    }

    #[test]
    fn malformed_document_names_the_file() {
        let err = Config::from_loader(&Docs("server: [")).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { ref name, .. } if name == SERVER_DOCUMENT));
    }

    #[test]
    fn expiry_only_for_listed_extensions() {
        let doc = "server:\n  name: t\n  port: 1\nstatic:\n  root: .\n  expires_days: 3\n  expires_extensions: [css]\n";
        let cfg = Config::from_loader(&Docs(doc)).unwrap();
        assert_eq!(cfg.expires_days("css"), Some(3));
        assert_eq!(cfg.expires_days("CSS"), Some(3));
        assert_eq!(cfg.expires_days("html"), None);
    }

    #[test]
    fn env_overrides_apply() {
        temp_env::with_vars(
            [
                ("RAWHTTP_PORT", Some("7070")),
                ("RAWHTTP_THREADS", Some("4")),
                ("RAWHTTP_ROOT", Some("/tmp/www")),
            ],
            || {
                let mut cfg = Config::from_loader(&Docs(MINIMAL)).unwrap();
                cfg.apply_env_overrides().unwrap();
                assert_eq!(cfg.server.port, 7070);
                assert_eq!(cfg.server.thread_count, 4);
                assert_eq!(cfg.static_files.root, PathBuf::from("/tmp/www"));
            },
        );
    }

    #[test]
    fn negative_thread_count_is_rejected() {
        temp_env::with_var("RAWHTTP_THREADS", Some("-1"), || {
            let mut cfg = Config::from_loader(&Docs(MINIMAL)).unwrap();
            let err = cfg.apply_env_overrides().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(ref m) if m.starts_with("RAWHTTP_THREADS")));
        });
    }
}
