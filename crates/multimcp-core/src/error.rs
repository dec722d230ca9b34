//! Error taxonomy for the multimcp workspace.
//!
//! Configuration problems are fatal at load time. Routing failures are
//! recoverable: they carry enough context (kind, identifier, candidate
//! servers) for the caller to retry with an explicit server name or a
//! namespaced identifier. Close-time failures are aggregated and reported
//! once, after every session had its close attempted.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::capability::CapabilityKind;

/// A problem with the server configuration. Always fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate server name '{name}'")]
    DuplicateServer { name: String },

    #[error("server '{name}' defines neither a command nor a url")]
    MissingTransport { name: String },

    #[error("server '{name}' defines both a command and a url; pick one transport")]
    AmbiguousTransport { name: String },

    #[error("server '{name}' has an invalid url: {source}")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },
}

/// A call could not be resolved to exactly one owning server.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The explicitly requested server is not connected.
    #[error("unknown server '{name}'")]
    UnknownServer { name: String },

    /// No connected server provides the capability.
    #[error("no connected server provides {kind} '{identifier}'")]
    NotFound {
        kind: CapabilityKind,
        identifier: String,
    },

    /// Two or more servers provide the capability and nothing disambiguates.
    #[error(
        "{kind} '{identifier}' is provided by multiple servers ({}); \
         retry with an explicit server name or a namespaced identifier",
        .candidates.join(", ")
    )]
    Ambiguous {
        kind: CapabilityKind,
        identifier: String,
        candidates: Vec<String>,
    },
}

/// Aggregate of per-server close failures, surfaced once after every close
/// was attempted.
#[derive(Debug, Error)]
#[error(
    "failed to close {} session(s): {}",
    .failures.len(),
    .failures.iter().map(|(server, reason)| format!("{server}: {reason}")).collect::<Vec<_>>().join("; ")
)]
pub struct ShutdownError {
    /// `(server name, failure reason)` pairs.
    pub failures: Vec<(String, String)>,
}
