use anyhow::Result;
use clap::Parser;
use search_core::corpus::build_from_dir;
use searchd::listener::AddrFamily;
use searchd::HttpServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searchd")]
#[command(about = "Serve keyword search over a static file corpus")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Base directory for /static/ file serving
    #[arg(long, default_value = "./static")]
    static_dir: PathBuf,
    /// Directory to build the index from (defaults to the static dir)
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Number of pool workers
    #[arg(long, default_value_t = 100)]
    workers: usize,
    /// Address family to bind
    #[arg(long, value_enum, default_value = "any")]
    addr_family: AddrFamily,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let corpus = args
        .corpus
        .clone()
        .unwrap_or_else(|| args.static_dir.clone());
    tracing::info!(corpus = %corpus.display(), "building index");
    let index = Arc::new(build_from_dir(&corpus)?);
    tracing::info!(
        words = index.num_words(),
        docs = index.num_docs(),
        "index ready"
    );

    let server = HttpServer::bind(
        args.port,
        args.addr_family,
        args.static_dir,
        index,
        args.workers,
    )?;
    tracing::info!(
        addr = %server.local_addr()?,
        workers = args.workers,
        "accepting connections"
    );
    server.serve().await
}
