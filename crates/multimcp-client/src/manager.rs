//! Connection lifecycle for the configured server set.
//!
//! The manager is the only component that opens or closes sessions. Every
//! attempt is independent: opening fans out concurrently, failures are
//! recorded per server instead of raised, and close is best-effort across
//! all sessions with one aggregate report at the end.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::registry::ServerInventory;
use crate::session::{Connect, ServerSession};
use multimcp_core::{CapabilityKind, McpServersConfig, ServerConfig, ShutdownError};

/// Default per-server connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

enum SessionState {
    Open(ServerSession),
    Failed(SessionError),
}

struct ManagedServer {
    config: ServerConfig,
    state: SessionState,
}

/// Owns every configured server and its session lifecycle.
///
/// The entry order is the configuration order; it is stable for the lifetime
/// of the manager and defines discovery order (and with it the deterministic
/// collision tie-break).
pub struct ConnectionManager {
    servers: Vec<ManagedServer>,
}

impl ConnectionManager {
    /// Attempt to open a session for every configured server, concurrently.
    ///
    /// A failure to open one server never prevents another from opening; the
    /// outcome of each attempt is recorded. This call itself never fails;
    /// the caller decides what zero successes means.
    pub async fn open(
        config: McpServersConfig,
        connector: Arc<dyn Connect>,
        connect_timeout: Duration,
    ) -> Self {
        info!(servers = config.len(), "opening sessions");

        let attempts = config.servers().iter().map(|server| {
            let connector = Arc::clone(&connector);
            async move {
                match tokio::time::timeout(connect_timeout, connector.connect(server)).await {
                    Ok(Ok(session)) => {
                        info!(server = %server.name, "connected");
                        SessionState::Open(session)
                    }
                    Ok(Err(error)) => {
                        warn!(server = %server.name, %error, "failed to connect");
                        SessionState::Failed(error)
                    }
                    Err(_) => {
                        warn!(server = %server.name, timeout = ?connect_timeout, "connect timed out");
                        SessionState::Failed(SessionError::Timeout(connect_timeout))
                    }
                }
            }
        });

        // join_all keeps input order, so states line up with the config.
        let states = join_all(attempts).await;
        let servers: Vec<ManagedServer> = config
            .servers()
            .iter()
            .cloned()
            .zip(states)
            .map(|(config, state)| ManagedServer { config, state })
            .collect();

        let connected = servers
            .iter()
            .filter(|s| matches!(s.state, SessionState::Open(_)))
            .count();
        info!(connected, total = servers.len(), "connection pass complete");

        Self { servers }
    }

    /// Names of all configured servers, in configuration order.
    pub fn configured_names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.config.name.clone()).collect()
    }

    /// Names of servers with a live session, in configuration order.
    pub fn connected_names(&self) -> Vec<String> {
        self.servers
            .iter()
            .filter(|s| matches!(s.state, SessionState::Open(_)))
            .map(|s| s.config.name.clone())
            .collect()
    }

    /// Per-server connection failures recorded during open.
    pub fn failures(&self) -> Vec<(&str, &SessionError)> {
        self.servers
            .iter()
            .filter_map(|s| match &s.state {
                SessionState::Failed(error) => Some((s.config.name.as_str(), error)),
                SessionState::Open(_) => None,
            })
            .collect()
    }

    pub fn session(&self, name: &str) -> Option<&ServerSession> {
        self.servers.iter().find_map(|s| match &s.state {
            SessionState::Open(session) if s.config.name == name => Some(session),
            _ => None,
        })
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.session(name).is_some()
    }

    /// Number of configured servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    fn open_sessions(&self) -> impl Iterator<Item = &ServerSession> {
        self.servers.iter().filter_map(|s| match &s.state {
            SessionState::Open(session) => Some(session),
            SessionState::Failed(_) => None,
        })
    }

    /// Query every open session for its full capability set, concurrently.
    ///
    /// Result order matches the manager's server order. A failing listing
    /// degrades that kind for that server only; the pass never aborts.
    pub async fn discover(&self) -> Vec<ServerInventory> {
        let passes = self.open_sessions().map(discover_one);
        join_all(passes).await
    }

    /// Close every open session, best-effort and concurrently.
    ///
    /// A close failure on one session never prevents closing the rest;
    /// failures are aggregated and surfaced once after every close was
    /// attempted. Safe to call more than once; sessions close exactly once.
    pub async fn close(&self) -> Result<(), ShutdownError> {
        let closes = self.open_sessions().map(|session| async move {
            (session.name().to_string(), session.close().await)
        });
        let results = join_all(closes).await;

        let failures: Vec<(String, String)> = results
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| (name, e.to_string())))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(failed = failures.len(), "close pass finished with errors");
            Err(ShutdownError { failures })
        }
    }
}

/// One server's discovery pass: the four capability listings, each tolerated
/// independently so a server without (say) prompt support still contributes
/// its tools.
async fn discover_one(session: &ServerSession) -> ServerInventory {
    let mut inventory = ServerInventory::new(session.name());

    match session.list_tools().await {
        Ok(tools) => {
            info!(server = %session.name(), count = tools.len(), "discovered tools");
            inventory.tools = tools;
        }
        Err(error) => {
            warn!(server = %session.name(), %error, "no tools available");
            inventory.degraded.push(CapabilityKind::Tool);
        }
    }

    match session.list_resources().await {
        Ok(resources) => {
            info!(server = %session.name(), count = resources.len(), "discovered resources");
            inventory.resources = resources;
        }
        Err(error) => {
            warn!(server = %session.name(), %error, "no resources available");
            inventory.degraded.push(CapabilityKind::Resource);
        }
    }

    match session.list_resource_templates().await {
        Ok(templates) => {
            info!(server = %session.name(), count = templates.len(), "discovered resource templates");
            inventory.resource_templates = templates;
        }
        Err(error) => {
            warn!(server = %session.name(), %error, "no resource templates available");
            inventory.degraded.push(CapabilityKind::ResourceTemplate);
        }
    }

    match session.list_prompts().await {
        Ok(prompts) => {
            info!(server = %session.name(), count = prompts.len(), "discovered prompts");
            inventory.prompts = prompts;
        }
        Err(error) => {
            warn!(server = %session.name(), %error, "no prompts available");
            inventory.degraded.push(CapabilityKind::Prompt);
        }
    }

    debug!(
        server = %session.name(),
        total = inventory.total(),
        degraded = ?inventory.degraded,
        "discovery pass complete"
    );
    inventory
}
