pub mod conn;
pub mod files;
pub mod listener;
pub mod pool;
pub mod request;
pub mod response;
pub mod router;

use crate::listener::{AddrFamily, Listener};
use crate::pool::{ConnTask, WorkerPool};
use anyhow::Result;
use search_core::WordIndex;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// The assembled server: a bound listener plus the shared, read-only state
/// every worker gets a handle to.
pub struct HttpServer {
    listener: Listener,
    base_dir: Arc<PathBuf>,
    index: Arc<WordIndex>,
    workers: usize,
}

impl HttpServer {
    /// Bind the listening socket. The index must already be fully built; the
    /// server only ever reads it.
    pub fn bind(
        port: u16,
        family: AddrFamily,
        base_dir: PathBuf,
        index: Arc<WordIndex>,
        workers: usize,
    ) -> Result<Self> {
        let listener = Listener::bind_and_listen(port, family)?;
        Ok(Self {
            listener,
            base_dir: Arc::new(base_dir),
            index,
            workers,
        })
    }

    /// Bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections and hand each to the worker pool. A fatal accept
    /// error stops serving gracefully; everything connection-scoped is
    /// handled inside the workers.
    pub async fn serve(&self) -> Result<()> {
        let pool = WorkerPool::new(self.workers);
        loop {
            match self.listener.accept_client().await {
                Ok((stream, client)) => {
                    let task = ConnTask {
                        stream,
                        client,
                        base_dir: Arc::clone(&self.base_dir),
                        index: Arc::clone(&self.index),
                    };
                    if pool.dispatch(task).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed, shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}
