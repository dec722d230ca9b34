//! # multimcp Core Library
//!
//! Domain types shared by the multimcp workspace.
//!
//! ## Modules
//!
//! - `capability` - Capability kinds advertised by MCP servers
//! - `config` - Server configuration in the standard `mcpServers` format
//! - `error` - Error taxonomy (configuration, routing, shutdown)
//! - `uri` - Namespace and URI-template helpers

pub mod capability;
pub mod config;
pub mod error;
pub mod uri;

// Re-export commonly used types
pub use capability::CapabilityKind;
pub use config::{McpServersConfig, ServerConfig, ServerEntry, TransportConfig};
pub use error::{ConfigError, RoutingError, ShutdownError};
