//! SocketConnector: waits for exactly one Client on the Host port.
//!
//! The listening socket only lives until a Client connects; a Host serves a
//! single Client at a time and binds again once that session is over.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use rccar_core::domain::ConnectionParameter;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("accepting a client failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
}

/// A bound, not yet accepted Host port.
pub struct SocketConnector {
    listener: TcpListener,
}

impl SocketConnector {
    /// Binds `bind_address:port`. Port 0 picks a free port.
    pub async fn bind(bind_address: &str, port: u16) -> Result<Self, NetworkError> {
        let ip: IpAddr = bind_address
            .parse()
            .map_err(|_| NetworkError::InvalidBindAddress(bind_address.to_string()))?;
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::BindFailed { addr, source })?;
        info!(%addr, "waiting for a client");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// What a Client needs to reach this Host: the machine's LAN address,
    /// the bound port and the password.
    pub fn connection_parameter(&self, password: Option<String>) -> ConnectionParameter {
        let port = self.local_addr().map_or(0, |a| a.port());
        let host = local_ipv4().unwrap_or(Ipv4Addr::LOCALHOST);
        ConnectionParameter::new(host.to_string(), port, password)
    }

    /// Accepts one Client and releases the port.
    pub async fn accept(self) -> Result<(TcpStream, SocketAddr), NetworkError> {
        let (stream, peer) = self.listener.accept().await.map_err(NetworkError::Accept)?;
        info!(%peer, "client connected");
        Ok((stream, peer))
    }
}

/// The IPv4 address this machine uses to reach other hosts.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outgoing interface.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        other => {
            debug!(?other, "no usable IPv4 address");
            None
        }
    }
}
