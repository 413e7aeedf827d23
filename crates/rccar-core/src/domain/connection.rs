//! Where and how a Client reaches a Host.
//!
//! A [`ConnectionParameter`] can be written three ways:
//!
//! - explicitly, field by field;
//! - as the shorthand `host[:port]` typed by a user;
//! - as a sharing URL
//!   `http://androidrccar.sven.to/connect/?host=H&port=P&password=W`
//!   that a Host shows so a Client can connect with a single scan or click.

use std::fmt;

use thiserror::Error;
use url::{form_urlencoded, Url};

/// Port a Host listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 4253;

/// Base of every connection sharing URL.
pub const CONNECTION_URL_BASE: &str = "http://androidrccar.sven.to/connect/";

/// Errors produced while decoding a connection parameter.
#[derive(Debug, Error, PartialEq)]
pub enum ConnectionParameterError {
    /// The sharing URL is not a URL at all.
    #[error("invalid connection url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A required query field is absent.
    #[error("connection url is missing the `{0}` field")]
    MissingField(&'static str),

    /// The host part is empty.
    #[error("host must not be empty")]
    EmptyHost,

    /// The port is not a number in `1..=65535`.
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}

/// Host address, port and optional password of a Host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameter {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl ConnectionParameter {
    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password,
        }
    }

    /// Parses the shorthand `host` or `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionParameterError::InvalidPort`] for a non-numeric port
    /// and [`ConnectionParameterError::EmptyHost`] for an empty host.
    pub fn from_host_with_port(
        host_with_port: &str,
        password: Option<String>,
    ) -> Result<Self, ConnectionParameterError> {
        let (host, port) = match host_with_port.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (host_with_port, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(ConnectionParameterError::EmptyHost);
        }
        Ok(Self::new(host, port, password))
    }

    /// Decodes a sharing URL. All three fields are percent-decoded; the
    /// password is optional.
    ///
    /// # Errors
    ///
    /// Fails when the URL does not parse, when `host` or `port` is missing,
    /// or when `port` is not a valid port number.
    pub fn from_connection_url(connection_url: &str) -> Result<Self, ConnectionParameterError> {
        let url = Url::parse(connection_url)?;

        let mut host = None;
        let mut port = None;
        let mut password = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "host" => host = Some(value.into_owned()),
                "port" => port = Some(value.into_owned()),
                "password" => password = Some(value.into_owned()),
                _ => {}
            }
        }

        let host = host.ok_or(ConnectionParameterError::MissingField("host"))?;
        if host.is_empty() {
            return Err(ConnectionParameterError::EmptyHost);
        }
        let port = parse_port(&port.ok_or(ConnectionParameterError::MissingField("port"))?)?;

        Ok(Self::new(host, port, password))
    }

    /// Renders the sharing URL. The `password` field is left out when there
    /// is no password.
    pub fn to_connection_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("host", &self.host)
            .append_pair("port", &self.port.to_string());
        if let Some(password) = &self.password {
            query.append_pair("password", password);
        }
        format!("{CONNECTION_URL_BASE}?{}", query.finish())
    }
}

impl fmt::Display for ConnectionParameter {
    /// `host` when the port is the default, `host:port` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_PORT {
            write!(f, "{}", self.host)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, ConnectionParameterError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConnectionParameterError::InvalidPort(raw.to_string())),
    }
}
