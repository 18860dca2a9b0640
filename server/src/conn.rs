use crate::request::HttpRequest;
use crate::response::HttpResponse;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const HEADER_END: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 4096;

/// One client connection: the stream plus bytes read but not yet consumed by
/// a parsed request. The carry-over buffer is what makes pipelined
/// back-to-back requests on one connection work.
///
/// Generic over the stream so tests can drive it with an in-memory duplex.
pub struct HttpConnection<S> {
    stream: S,
    buffer: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> HttpConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
        }
    }

    /// Frame and parse the next request. `None` means the connection is done:
    /// clean end-of-stream, a read error, or a malformed header block.
    ///
    /// The buffer is scanned before reading, so a pipelined request that
    /// already arrived is served without touching the socket. Everything
    /// after the header terminator stays buffered for the next call.
    pub async fn next_request(&mut self) -> Option<HttpRequest> {
        loop {
            if let Some(end) = find_header_end(&self.buffer) {
                let rest = self.buffer.split_off(end + HEADER_END.len());
                let block = std::mem::replace(&mut self.buffer, rest);
                return parse_request(&block);
            }
            let mut chunk = [0u8; READ_CHUNK];
            match self.stream.read(&mut chunk).await {
                Ok(0) => return None,
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "connection read failed");
                    return None;
                }
            }
        }
    }

    /// Serialize `response` and write it out in full. On error the caller
    /// must close the connection.
    pub async fn write_response(&mut self, response: &HttpResponse) -> Result<()> {
        self.stream.write_all(&response.to_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < HEADER_END.len() {
        return None;
    }
    buffer
        .windows(HEADER_END.len())
        .position(|w| w == HEADER_END)
}

/// Parse one header block (request line, header lines, trailing blank line).
/// The request line must carry at least method, target, and version; only the
/// target is kept — method and version are deliberately not validated against
/// a fixed set. Every other non-blank line must be a `name: value` pair,
/// split at the first colon; a line without a colon invalidates the block.
pub fn parse_request(block: &[u8]) -> Option<HttpRequest> {
    let text = std::str::from_utf8(block).ok()?;
    let mut lines = text.split("\r\n");

    let first = lines.next()?;
    let mut tokens = first.split_whitespace();
    let _method = tokens.next()?;
    let uri = tokens.next()?;
    tokens.next()?;

    let mut request = HttpRequest::new(uri);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':')?;
        request.add_header(name, value);
    }
    Some(request)
}
