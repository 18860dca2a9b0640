/// A response under construction: status line parts, content type, and an
/// append-only body. Built fresh per request by the router, serialized once.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    protocol: String,
    status_code: u16,
    message: String,
    content_type: String,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status_code: u16, message: &str) -> Self {
        Self {
            protocol: "HTTP/1.1".to_string(),
            status_code,
            message: message.to_string(),
            content_type: "text/html".to_string(),
            body: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.content_type = content_type.to_string();
    }

    pub fn append_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Serialize to the wire: status line, Content-Type, a Content-Length
    /// matching the body byte length, blank line, raw body bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "{} {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.protocol,
            self.status_code,
            self.message,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}
