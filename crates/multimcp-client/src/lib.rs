//! # multimcp Client
//!
//! One logical MCP endpoint over many servers: call a tool by name, read a
//! resource by URI, fetch a prompt by name, without tracking which server
//! implements it.
//!
//! ## Modules
//!
//! - `session` - One connection to one server, on the rmcp SDK
//! - `manager` - Opens/closes all sessions with partial-failure tolerance
//! - `registry` - Aggregated capability snapshot with collision bookkeeping
//! - `router` - Resolution: explicit override > namespaced URI > unique name
//! - `client` - The [`MultiServerClient`] facade
//! - `openai` - Tool listing conversion to OpenAI function-calling format
//!
//! ## Example
//!
//! ```no_run
//! use multimcp_client::{McpServersConfig, MultiServerClient};
//!
//! # async fn run() -> Result<(), multimcp_client::ClientError> {
//! let config = McpServersConfig::load("mcp_servers.json")?;
//! let client = MultiServerClient::connect(config).await?;
//!
//! for tool in client.list_tools() {
//!     println!("{} (from {})", tool.identifier(), tool.server);
//! }
//!
//! let result = client.call_tool("search", None, None).await?;
//! println!("{result:?}");
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod manager;
pub mod openai;
pub mod registry;
pub mod router;
pub mod session;

// Re-export the public surface
pub use client::{ClientBuilder, MultiServerClient};
pub use error::{ClientError, SessionError};
pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
pub use registry::{
    Aggregated, Capability, CapabilityRegistry, RegistryEntry, RegistryIndex, ServerInventory,
};
pub use router::{Route, Router};
pub use session::{Arguments, Connect, MuxClientHandler, ServerSession, TransportConnector};

// Domain types callers need alongside the client
pub use multimcp_core::{
    CapabilityKind, ConfigError, McpServersConfig, RoutingError, ServerConfig, ShutdownError,
    TransportConfig,
};
