use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;

use crate::clock::{Clock, SystemClock};
use crate::context::ServerContext;
use crate::handler::Handler;
use crate::http::mime::extension_of;
use crate::http::request::Request;
use crate::http::response::Response;

/// Serves files and directory listings from the static root.
///
/// Used as the default handler: every URI without a registered handler
/// ends up here.
pub struct StaticFiles {
    clock: Arc<dyn Clock>,
}

impl Default for StaticFiles {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl StaticFiles {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn serve_file(&self, context: &ServerContext, path: &Path, response: &mut Response) -> anyhow::Result<()> {
        response.set_header("Content-Type", context.content_type(path))?;

        let modified = fs::metadata(path)?.modified()?;
        response.set_header("Last-Modified", modified)?;

        if let Some(days) = context.expires_days(extension_of(path)) {
            response.set_header("Expires", self.clock.now() + Duration::days(i64::from(days)))?;
        }

        response.set_body_from_reader(fs::File::open(path)?)?;
        Ok(())
    }
}

impl Handler for StaticFiles {
    fn handle(&self, context: &ServerContext, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        let root = context.root_path();
        let Some(path) = resolve(root, request.uri()) else {
            tracing::debug!(uri = request.uri(), "Static resource path escapes the root");
            response.set_status(404);
            return Ok(());
        };

        if path.is_file() {
            self.serve_file(context, &path, response)?;
            tracing::debug!(uri = request.uri(), "Static resource found");
        } else if path.is_dir() {
            let entries = list_directory(root, &path)?;
            if entries.is_empty() {
                tracing::debug!(uri = request.uri(), "Static resource is an empty directory");
            } else {
                response.set_body(format!("<ul>{}</ul>", entries.concat()));
                tracing::debug!(uri = request.uri(), entries = entries.len(), "Static resource is a directory");
            }
        } else {
            response.set_status(404);
            tracing::debug!(uri = request.uri(), "Static resource not found");
        }
        Ok(())
    }
}

/// Maps a request URI onto the file system below `root`.
///
/// Returns `None` for URIs with `..` segments.
fn resolve(root: &Path, uri: &str) -> Option<PathBuf> {
    let relative = Path::new(uri.trim_start_matches('/'));
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

fn list_directory(root: &Path, dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    Ok(entries
        .iter()
        .map(|entry| {
            let path = entry.path();
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                name.push('/');
            }
            let href = path
                .strip_prefix(root)
                .map(|rel| {
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .unwrap_or_default();
            format!("<li><a href='/{href}'>{name}</a></li>")
        })
        .collect())
}
