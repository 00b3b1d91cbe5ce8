//! MIME type detection based on file extensions.

use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeTypes {
    by_extension: HashMap<String, String>,
}

impl MimeTypes {
    pub fn new(by_extension: HashMap<String, String>) -> Self {
        let by_extension = by_extension
            .into_iter()
            .map(|(ext, mime)| (ext.to_ascii_lowercase(), mime))
            .collect();
        Self { by_extension }
    }

    /// Content type registered for `extension`, or `text/plain`.
    pub fn content_type(&self, extension: &str) -> &str {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn for_path(&self, path: &Path) -> &str {
        self.content_type(extension_of(path))
    }
}

/// Extension of `path` without the dot, empty when there is none.
pub fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MimeTypes {
        MimeTypes::new(
            [
                ("html".to_string(), "text/html".to_string()),
                ("PNG".to_string(), "image/png".to_string()),
            ]
            .into(),
        )
    }

    #[test]
    fn known_and_unknown_extensions() {
        let mime = table();
        assert_eq!(mime.content_type("html"), "text/html");
        assert_eq!(mime.content_type("png"), "image/png");
        assert_eq!(mime.content_type("HTML"), "text/html");
        assert_eq!(mime.content_type("exe"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn path_lookup() {
        let mime = table();
        assert_eq!(mime.for_path(Path::new("/var/www/index.html")), "text/html");
        assert_eq!(mime.for_path(Path::new("/var/www/README")), DEFAULT_CONTENT_TYPE);
        assert_eq!(extension_of(Path::new("a/b.tar.gz")), "gz");
    }
}
