use crate::conn::HttpConnection;
use crate::listener::ClientInfo;
use crate::router::route;
use anyhow::{anyhow, Result};
use search_core::WordIndex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

/// Everything a worker needs to serve one accepted connection. Moved into
/// exactly one worker, which owns the connection for its whole lifetime.
pub struct ConnTask {
    pub stream: TcpStream,
    pub client: ClientInfo,
    pub base_dir: Arc<PathBuf>,
    pub index: Arc<WordIndex>,
}

/// A fixed pool of long-lived workers fed from a bounded queue. When every
/// worker is busy and the queue is full, `dispatch` suspends the caller, so
/// overload backs up into the kernel accept backlog instead of growing an
/// unbounded queue.
pub struct WorkerPool {
    queue: mpsc::Sender<ConnTask>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel::<ConnTask>(workers);
        let rx = Arc::new(Mutex::new(rx));
        for id in 0..workers {
            let rx = Arc::clone(&rx);
            tokio::spawn(worker_loop(id, rx));
        }
        Self { queue: tx }
    }

    /// Hand a connection to the pool.
    pub async fn dispatch(&self, task: ConnTask) -> Result<()> {
        self.queue
            .send(task)
            .await
            .map_err(|_| anyhow!("worker pool is shut down"))
    }
}

async fn worker_loop(id: usize, queue: Arc<Mutex<mpsc::Receiver<ConnTask>>>) {
    loop {
        let task = queue.lock().await.recv().await;
        match task {
            Some(task) => handle_connection(id, task).await,
            None => break,
        }
    }
}

/// The per-connection request loop: strictly sequential request/response
/// cycles until the client disconnects, asks to close, or a write fails.
/// Failures here are contained in the worker and never reach the pool.
async fn handle_connection(worker: usize, task: ConnTask) {
    tracing::info!(
        worker,
        addr = %task.client.client_addr,
        port = task.client.client_port,
        dns = %task.client.client_dns,
        "client connected"
    );
    let mut conn = HttpConnection::new(task.stream);
    while let Some(request) = conn.next_request().await {
        // a close-requesting request gets no response; the connection just ends
        if request.header("connection") == Some("close") {
            break;
        }
        let response = route(&request, &task.base_dir, &task.index);
        if let Err(e) = conn.write_response(&response).await {
            tracing::debug!(worker, error = %e, "write failed, closing connection");
            break;
        }
    }
    tracing::info!(worker, client = %task.client.client_addr, "client disconnected");
}
