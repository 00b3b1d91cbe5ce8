/// Normalizes a header name to `Title-Case-With-Hyphens`.
///
/// The first letter of every hyphen-separated segment is upper-cased, the
/// rest are lower-cased; surrounding whitespace is dropped.
///
/// # Example
///
/// ```
/// # use rawhttp::http::headers::normalize_header_name;
/// assert_eq!(normalize_header_name("content-length"), "Content-Length");
/// assert_eq!(normalize_header_name(" X-FORWARDED-FOR "), "X-Forwarded-For");
/// ```
pub fn normalize_header_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut segment_start = true;
    for ch in name.trim().chars() {
        if segment_start {
            normalized.extend(ch.to_uppercase());
        } else {
            normalized.extend(ch.to_lowercase());
        }
        segment_start = ch == '-';
    }
    normalized
}

/// Ordered header map with normalized names.
///
/// Names are unique under case-insensitive comparison. Setting a header that
/// already exists replaces its value in place, so the first-seen order is
/// what gets written on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header and returns the normalized name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> String {
        let name = normalize_header_name(name);
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name.clone(), value)),
        }
        name
    }

    /// Appends `more` to the value of an existing header.
    ///
    /// Returns `false` when no header with that name exists.
    pub fn append_to(&mut self, name: &str, more: &str) -> bool {
        match self.position(&normalize_header_name(name)) {
            Some(idx) => {
                self.entries[idx].1.push_str(more);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(&normalize_header_name(name))
            .map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(&normalize_header_name(name))
            .map(|idx| self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == normalized)
    }
}
