//! Client-side errors: per-session failures and the facade error type.

use std::io;
use std::time::Duration;

use thiserror::Error;

use multimcp_core::{ConfigError, RoutingError, ShutdownError};

/// Failure of a single server session: establishing it, invoking through it,
/// or shutting it down. Always reported tagged with the owning server name.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid command line `{command}`: {reason}")]
    Command { command: String, reason: String },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// A request on an established session failed. Surfaced verbatim from the
    /// protocol layer; the core never retries.
    #[error(transparent)]
    Rpc(#[from] rmcp::service::ServiceError),

    #[error("shutdown failed: {0}")]
    Shutdown(String),
}

/// Errors surfaced by [`MultiServerClient`](crate::MultiServerClient).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every configured server failed to open. Partial connectivity is a
    /// normal operating state; total failure is not (unless opted into via
    /// [`ClientBuilder::allow_no_servers`](crate::ClientBuilder::allow_no_servers)).
    #[error(
        "all {attempted} configured server(s) failed to connect: {}",
        .failures.iter().map(|(server, reason)| format!("{server}: {reason}")).collect::<Vec<_>>().join("; ")
    )]
    AllServersUnavailable {
        attempted: usize,
        failures: Vec<(String, String)>,
    },

    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The owning server's own call/read/get failed; passed through
    /// unmodified, tagged with the server name.
    #[error("server '{server}': {source}")]
    Server {
        server: String,
        #[source]
        source: SessionError,
    },

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

impl ClientError {
    /// The server a pass-through failure originated from, if any.
    pub fn server(&self) -> Option<&str> {
        match self {
            ClientError::Server { server, .. } => Some(server),
            _ => None,
        }
    }
}
