//! Server sessions on top of the rmcp client SDK.
//!
//! A [`ServerSession`] is one live connection to one MCP server. The wire
//! protocol, framing and handshake all belong to rmcp; this layer only picks
//! the transport (stdio child process or streamable HTTP), tags everything
//! with the server name, and gives close exactly-once semantics.

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo,
        GetPromptRequestParams, GetPromptResult, Implementation, Prompt,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceTemplate, Tool,
    },
    service::{Peer, RunningService},
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig, ConfigureCommandExt,
        IntoTransport, StreamableHttpClientTransport, TokioChildProcess,
    },
    ClientHandler, RoleClient, ServiceExt,
};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use multimcp_core::{ServerConfig, TransportConfig};

/// Arguments for tool calls and prompt requests.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// Type alias for the running rmcp client service.
pub type RunningClient = RunningService<RoleClient, MuxClientHandler>;

/// Client handler identifying this crate to the servers it connects to.
#[derive(Clone)]
pub struct MuxClientHandler {
    info: ClientInfo,
}

impl MuxClientHandler {
    pub fn new(server_name: &str) -> Self {
        Self {
            info: ClientInfo {
                protocol_version: Default::default(),
                capabilities: ClientCapabilities::default(),
                client_info: Implementation {
                    name: format!("multimcp-{}", server_name),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }
}

impl ClientHandler for MuxClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }
}

/// One live connection to one MCP server.
///
/// Requests go through a cloned [`Peer`]; the service handle itself sits
/// behind a mutex so [`close`](Self::close) can run on `&self` and later
/// calls become no-ops.
pub struct ServerSession {
    name: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningClient>>,
}

impl ServerSession {
    /// Open a session for `transport`, spawning a child process or dialing
    /// a streamable HTTP endpoint.
    pub async fn connect(name: &str, transport: &TransportConfig) -> Result<Self, SessionError> {
        match transport {
            TransportConfig::Stdio { command, args, env } => {
                Self::connect_stdio(name, command, args, env).await
            }
            TransportConfig::Http { url, headers } => Self::connect_http(name, url, headers).await,
        }
    }

    async fn connect_stdio(
        name: &str,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, SessionError> {
        // The command string may carry embedded arguments ("npx -y @scope/srv"),
        // common in configs copied from Cursor or Claude Desktop.
        let (executable, argv) = parse_command(command, args)?;

        info!(
            server = %name,
            executable = %executable,
            args = ?argv,
            "spawning stdio MCP server"
        );

        let env = env.clone();
        let argv_for_cmd = argv.clone();
        let transport = TokioChildProcess::new(Command::new(&executable).configure(move |cmd| {
            cmd.args(&argv_for_cmd)
                .envs(&env)
                .stderr(Stdio::null())
                .kill_on_drop(true);

            // Unix: new process group so terminal signals (SIGINT, SIGTSTP)
            // sent to the parent don't propagate to server child processes.
            #[cfg(unix)]
            {
                cmd.process_group(0);
            }
        }))
        .map_err(|source| SessionError::Spawn {
            command: executable.clone(),
            source,
        })?;

        Self::serve(name, transport).await
    }

    async fn connect_http(
        name: &str,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self, SessionError> {
        info!(server = %name, url = %url, "connecting to streamable HTTP MCP server");

        if headers.keys().any(|key| key != "Authorization") {
            // The streamable HTTP transport only exposes the auth header.
            warn!(server = %name, "ignoring configured headers other than Authorization");
        }

        let transport = match headers.get("Authorization") {
            Some(auth) => {
                let mut config = StreamableHttpClientTransportConfig::with_uri(url.to_string());
                config.auth_header = Some(auth.clone());
                StreamableHttpClientTransport::from_config(config)
            }
            None => StreamableHttpClientTransport::from_uri(url.to_string()),
        };

        Self::serve(name, transport).await
    }

    /// Establish a session over an arbitrary rmcp transport and run the
    /// initialize handshake.
    pub async fn serve<T, E, A>(name: impl Into<String>, transport: T) -> Result<Self, SessionError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let name = name.into();
        let handler = MuxClientHandler::new(&name);
        let service = handler
            .serve(transport)
            .await
            .map_err(|e| SessionError::Handshake(e.to_string()))?;

        debug!(server = %name, peer_info = ?service.peer_info(), "session established");

        let peer = service.peer().clone();
        Ok(Self {
            name,
            peer,
            service: Mutex::new(Some(service)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>, SessionError> {
        Ok(self.peer.list_all_tools().await?)
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, SessionError> {
        Ok(self.peer.list_all_resources().await?)
    }

    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>, SessionError> {
        Ok(self.peer.list_all_resource_templates().await?)
    }

    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, SessionError> {
        Ok(self.peer.list_all_prompts().await?)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Arguments>,
    ) -> Result<CallToolResult, SessionError> {
        debug!(server = %self.name, tool = %name, "calling tool");
        Ok(self
            .peer
            .call_tool(CallToolRequestParams {
                name: name.to_string().into(),
                arguments,
                task: None,
                meta: None,
            })
            .await?)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, SessionError> {
        debug!(server = %self.name, uri = %uri, "reading resource");
        Ok(self
            .peer
            .read_resource(ReadResourceRequestParams {
                uri: uri.to_string(),
                meta: None,
            })
            .await?)
    }

    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Arguments>,
    ) -> Result<GetPromptResult, SessionError> {
        debug!(server = %self.name, prompt = %name, "getting prompt");
        Ok(self
            .peer
            .get_prompt(GetPromptRequestParams {
                name: name.to_string(),
                arguments,
                meta: None,
            })
            .await?)
    }

    /// Cancel the underlying service, closing the connection. Exactly-once:
    /// a second call is a no-op.
    pub async fn close(&self) -> Result<(), SessionError> {
        let service = self.service.lock().take();
        if let Some(service) = service {
            info!(server = %self.name, "closing session");
            service
                .cancel()
                .await
                .map_err(|e| SessionError::Shutdown(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.service.lock().is_none()
    }
}

/// Split a command that may carry embedded arguments.
///
/// Separate `args` take precedence (the command is then just the executable);
/// otherwise a command containing spaces is shell-split with proper quoting.
fn parse_command(command: &str, args: &[String]) -> Result<(String, Vec<String>), SessionError> {
    if !args.is_empty() {
        return Ok((command.to_string(), args.to_vec()));
    }

    if command.contains(' ') {
        let mut parts = shell_words::split(command)
            .map_err(|e| SessionError::Command {
                command: command.to_string(),
                reason: e.to_string(),
            })?
            .into_iter();

        match parts.next() {
            Some(executable) => Ok((executable, parts.collect())),
            None => Err(SessionError::Command {
                command: command.to_string(),
                reason: "empty command".to_string(),
            }),
        }
    } else {
        Ok((command.to_string(), Vec::new()))
    }
}

/// Strategy for establishing server sessions.
///
/// The production implementation is [`TransportConnector`]; tests substitute
/// their own to dial in-process fixtures.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, config: &ServerConfig) -> Result<ServerSession, SessionError>;
}

/// Default connector: stdio child processes and streamable HTTP.
#[derive(Debug, Default)]
pub struct TransportConnector;

#[async_trait]
impl Connect for TransportConnector {
    async fn connect(&self, config: &ServerConfig) -> Result<ServerSession, SessionError> {
        ServerSession::connect(&config.name, &config.transport).await
    }
}
