//! Server configuration in the standard `mcpServers` format.
//!
//! This is the format shared by VS Code, Cursor and Claude Desktop: transport
//! fields live at the top level of each entry: `command`/`args`/`env` for a
//! stdio server, `url`/`headers` for a streamable HTTP server. There is no
//! `transport: {}` wrapper.
//!
//! Entry order is significant: it is the order servers are opened and
//! discovered in, and therefore the "first configured server wins" tie-break
//! order for ambiguous listings. `serde_json`'s `preserve_order` feature keeps
//! the file order intact through parsing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Transport used to reach one MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Local child process speaking MCP over stdio.
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    /// Remote server speaking MCP over streamable HTTP.
    Http {
        url: String,
        headers: HashMap<String, String>,
    },
}

/// One configured server: a unique, user-chosen name plus its launch or
/// connection descriptor. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub transport: TransportConfig,
}

/// A raw entry as written in a configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerEntry {
    // Stdio transport (command-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    // HTTP transport (URL-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl ServerEntry {
    /// Determine the transport from the top-level fields. Exactly one of
    /// `command` and `url` must be present.
    fn resolve(self, name: &str) -> Result<TransportConfig, ConfigError> {
        match (self.command, self.url) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousTransport { name: name.to_string() }),
            (None, None) => Err(ConfigError::MissingTransport { name: name.to_string() }),
            (Some(command), None) => Ok(TransportConfig::Stdio {
                command,
                args: self.args,
                env: self.env,
            }),
            (None, Some(url)) => {
                url::Url::parse(&url).map_err(|source| ConfigError::InvalidUrl {
                    name: name.to_string(),
                    source,
                })?;
                Ok(TransportConfig::Http {
                    url,
                    headers: self.headers,
                })
            }
        }
    }
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "mcpServers")]
    mcp_servers: serde_json::Map<String, Value>,
}

/// The full, ordered server set for one client instance.
#[derive(Debug, Clone, Default)]
pub struct McpServersConfig {
    servers: Vec<ServerConfig>,
}

impl McpServersConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file in the `mcpServers` format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.to_path_buf() });
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&data)?;
        tracing::debug!(path = %path.display(), servers = config.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse from a JSON string in the `mcpServers` format.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(data)?;
        Self::from_raw(raw)
    }

    /// Build from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (name, value) in raw.mcp_servers {
            let entry: ServerEntry = serde_json::from_value(value)?;
            let transport = entry.resolve(&name)?;
            config.push(ServerConfig { name, transport })?;
        }
        Ok(config)
    }

    /// Append a server, rejecting duplicate names.
    pub fn push(&mut self, server: ServerConfig) -> Result<(), ConfigError> {
        if self.get(&server.name).is_some() {
            return Err(ConfigError::DuplicateServer { name: server.name });
        }
        self.servers.push(server);
        Ok(())
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_server(
        mut self,
        name: impl Into<String>,
        transport: TransportConfig,
    ) -> Result<Self, ConfigError> {
        self.push(ServerConfig { name: name.into(), transport })?;
        Ok(self)
    }

    /// All servers, in configuration order.
    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Server names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
