use anyhow::{bail, Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};

/// Which address family to bind. `Any` prefers a dual-stack IPv6 socket and
/// falls back to IPv4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AddrFamily {
    V4,
    V6,
    Any,
}

/// Peer and local metadata for one accepted connection.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_addr: String,
    pub client_port: u16,
    pub client_dns: String,
    pub server_addr: String,
    pub server_dns: String,
}

const DNS_FALLBACK: &str = "[reverse DNS failed]";

/// The server's listening socket.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Create the listening socket: address reuse on, dual-stack enabled for
    /// IPv6 sockets so v4-mapped clients are accepted, maximum backlog.
    /// Candidate addresses are tried in order; failing to bind all of them is
    /// an error and leaves no partial state behind.
    pub fn bind_and_listen(port: u16, family: AddrFamily) -> Result<Self> {
        let candidates: Vec<SocketAddr> = match family {
            AddrFamily::V4 => vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)],
            AddrFamily::V6 => vec![SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)],
            AddrFamily::Any => vec![
                SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            ],
        };

        let mut last_err = None;
        for addr in candidates {
            match try_bind(addr) {
                Ok(listener) => return Ok(Self { inner: listener }),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "bind candidate failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e).context("couldn't bind to any address"),
            None => bail!("no bind candidates for the requested address family"),
        }
    }

    /// Bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Block until a client connects. Interrupted and would-block accepts
    /// retry silently; any other accept error is fatal to the listener and
    /// propagates to the caller.
    pub async fn accept_client(&self) -> Result<(TcpStream, ClientInfo)> {
        loop {
            match self.inner.accept().await {
                Ok((stream, peer)) => {
                    let info = client_info(&stream, peer).await;
                    return Ok((stream, info));
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(e).context("accept failed"),
            }
        }
    }
}

fn try_bind(addr: SocketAddr) -> Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.bind(&addr.into())?;
    socket.listen(libc::SOMAXCONN)?;
    socket.set_nonblocking(true)?;
    Ok(TcpListener::from_std(socket.into())?)
}

async fn client_info(stream: &TcpStream, peer: SocketAddr) -> ClientInfo {
    let client_dns = reverse_dns(peer.ip())
        .await
        .unwrap_or_else(|| DNS_FALLBACK.to_string());
    let (server_addr, server_dns) = match stream.local_addr() {
        Ok(local) => {
            let name = reverse_dns(local.ip())
                .await
                .unwrap_or_else(|| local.ip().to_string());
            (local.ip().to_string(), name)
        }
        Err(_) => (String::new(), String::new()),
    };
    ClientInfo {
        client_addr: peer.ip().to_string(),
        client_port: peer.port(),
        client_dns,
        server_addr,
        server_dns,
    }
}

/// Best-effort reverse lookup; never fatal.
async fn reverse_dns(ip: IpAddr) -> Option<String> {
    tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&ip).ok())
        .await
        .ok()
        .flatten()
}
