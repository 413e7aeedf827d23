//! Network infrastructure: connecting to a Host.

use std::time::Duration;

use rccar_core::domain::ConnectionParameter;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::info;

/// How long to wait for the Host to accept.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connecting to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {0} timed out")]
    Timeout(String),
}

/// Opens the TCP connection to the Host described by `parameter`.
pub async fn connect(parameter: &ConnectionParameter) -> Result<TcpStream, NetworkError> {
    connect_with_timeout(parameter, CONNECT_TIMEOUT).await
}

pub async fn connect_with_timeout(
    parameter: &ConnectionParameter,
    limit: Duration,
) -> Result<TcpStream, NetworkError> {
    let target = format!("{}:{}", parameter.host, parameter.port);
    let connecting = TcpStream::connect((parameter.host.as_str(), parameter.port));
    let stream = tokio::time::timeout(limit, connecting)
        .await
        .map_err(|_| NetworkError::Timeout(target.clone()))?
        .map_err(|source| NetworkError::Connect {
            target: target.clone(),
            source,
        })?;
    info!(%target, "connected to host");
    Ok(stream)
}
