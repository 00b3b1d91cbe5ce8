//! Loading of configuration documents and HTML templates.
//!
//! The server ships a complete set of defaults compiled into the binary
//! ([`EmbeddedResources`]). A deployment can point `RAWHTTP_RESOURCES` at a
//! directory with the same layout to replace them ([`DirResources`]).

use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

const TEMPLATE_DIR: &str = "templates";

pub trait ResourceLoader: Send + Sync {
    /// Loads a named configuration document, e.g. `server.yaml`.
    fn load_config(&self, name: &str) -> Result<String, ConfigError>;

    /// Loads a named HTML template, e.g. `error.html`.
    fn load_template(&self, name: &str) -> Result<String, ConfigError>;
}

/// Built-in resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedResources;

impl ResourceLoader for EmbeddedResources {
    fn load_config(&self, name: &str) -> Result<String, ConfigError> {
        let content = match name {
            "server.yaml" => include_str!("../resources/server.yaml"),
            "statuses.yaml" => include_str!("../resources/statuses.yaml"),
            "mime-types.yaml" => include_str!("../resources/mime-types.yaml"),
            _ => return Err(ConfigError::ResourceNotFound(name.to_string())),
        };
        Ok(content.to_string())
    }

    fn load_template(&self, name: &str) -> Result<String, ConfigError> {
        let content = match name {
            "error.html" => include_str!("../resources/templates/error.html"),
            "server-info.html" => include_str!("../resources/templates/server-info.html"),
            _ => return Err(ConfigError::ResourceNotFound(format!("{TEMPLATE_DIR}/{name}"))),
        };
        Ok(content.to_string())
    }
}

/// Resources read from a directory on disk.
///
/// Config documents live at the top level, templates under `templates/`.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, relative: PathBuf) -> Result<String, ConfigError> {
        let path = self.root.join(&relative);
        let display = relative.display().to_string();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(resource = %path.display(), "Loaded resource");
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ConfigError::ResourceNotFound(display)),
            Err(source) => Err(ConfigError::Io { name: display, source }),
        }
    }
}

impl ResourceLoader for DirResources {
    fn load_config(&self, name: &str) -> Result<String, ConfigError> {
        self.read(PathBuf::from(name))
    }

    fn load_template(&self, name: &str) -> Result<String, ConfigError> {
        self.read(Path::new(TEMPLATE_DIR).join(name))
    }
}
