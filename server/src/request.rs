use std::collections::HashMap;
use url::form_urlencoded;

/// A parsed request: the raw URI plus its header map. Header names and values
/// are trimmed and lowercased on insert, and a repeated header keeps the last
/// occurrence. Because values are lowercased too, case-sensitive header
/// values will not round-trip.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    uri: String,
    headers: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            headers: HashMap::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI with any query string stripped.
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    /// Decoded query-string arguments. A repeated key keeps the last value.
    pub fn args(&self) -> HashMap<String, String> {
        let query = match self.uri.split_once('?') {
            Some((_, query)) => query,
            None => return HashMap::new(),
        };
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.trim().to_lowercase(), value.trim().to_lowercase());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn num_headers(&self) -> usize {
        self.headers.len()
    }
}
