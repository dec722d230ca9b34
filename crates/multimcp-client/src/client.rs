//! The MultiServerClient facade.
//!
//! Composes the connection manager, the capability registry snapshot and the
//! router behind one entry point: connect, list, call, read, get, refresh,
//! close. Call payloads and results pass through unmodified; the facade
//! never interprets what a server returns.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use rmcp::model::{
    CallToolResult, GetPromptResult, Prompt, ReadResourceResult, Resource, ResourceTemplate, Tool,
};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
use crate::registry::{Aggregated, CapabilityRegistry};
use crate::router::{Route, Router};
use crate::session::{Arguments, Connect, TransportConnector};
use multimcp_core::{McpServersConfig, RoutingError};

/// Builder for [`MultiServerClient`].
pub struct ClientBuilder {
    config: McpServersConfig,
    connector: Arc<dyn Connect>,
    connect_timeout: Duration,
    allow_no_servers: bool,
}

impl ClientBuilder {
    pub fn new(config: McpServersConfig) -> Self {
        Self {
            config,
            connector: Arc::new(TransportConnector),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            allow_no_servers: false,
        }
    }

    /// Substitute the session-establishment strategy (tests use this to dial
    /// in-process fixtures).
    pub fn with_connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Treat a pass where zero servers opened as reportable rather than
    /// fatal. Off by default: with no live server the client would be an
    /// empty shell, which is usually a deployment mistake.
    pub fn allow_no_servers(mut self, allow: bool) -> Self {
        self.allow_no_servers = allow;
        self
    }

    /// Open all sessions and run the first discovery pass.
    pub async fn connect(self) -> Result<MultiServerClient, ClientError> {
        let manager =
            ConnectionManager::open(self.config, self.connector, self.connect_timeout).await;

        if manager.connected_names().is_empty() && !self.allow_no_servers {
            let failures = manager
                .failures()
                .iter()
                .map(|(name, error)| (name.to_string(), error.to_string()))
                .collect();
            // Nothing opened, so there is nothing to tear down.
            return Err(ClientError::AllServersUnavailable {
                attempted: manager.len(),
                failures,
            });
        }

        let client = MultiServerClient {
            manager,
            registry: RwLock::new(Arc::new(CapabilityRegistry::default())),
        };
        client.refresh().await;
        Ok(client)
    }
}

/// One logical MCP endpoint over many servers.
///
/// Explicitly constructed and caller-scoped: there is no process-wide
/// instance. Either call [`close`](Self::close) when done, or use
/// [`scoped`](Self::scoped) to get close-on-every-exit-path for free.
pub struct MultiServerClient {
    manager: ConnectionManager,
    registry: RwLock<Arc<CapabilityRegistry>>,
}

impl std::fmt::Debug for MultiServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiServerClient").finish_non_exhaustive()
    }
}

impl MultiServerClient {
    /// Connect with default options; one discovery pass completes before
    /// this returns.
    pub async fn connect(config: McpServersConfig) -> Result<Self, ClientError> {
        ClientBuilder::new(config).connect().await
    }

    pub fn builder(config: McpServersConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Connect, run `f` against the client, then close every session:
    /// on the success path, the error path, and everything in between.
    pub async fn scoped<T>(
        config: McpServersConfig,
        f: impl for<'c> FnOnce(&'c MultiServerClient) -> BoxFuture<'c, Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        let client = Self::connect(config).await?;
        let result = f(&client).await;
        let closed = client.close().await;

        match result {
            Ok(value) => closed.map(|()| value),
            Err(error) => {
                if let Err(close_error) = closed {
                    warn!(%close_error, "close reported errors after a failed scope");
                }
                Err(error)
            }
        }
    }

    /// The current registry snapshot. Atomically replaced by
    /// [`refresh`](Self::refresh); holders of an old snapshot keep reading a
    /// consistent view.
    pub fn snapshot(&self) -> Arc<CapabilityRegistry> {
        self.registry.read().clone()
    }

    /// Re-run discovery across all connected servers and swap in a fresh
    /// snapshot. In-flight routing decisions complete against the snapshot
    /// they started with.
    pub async fn refresh(&self) {
        let per_server = self.manager.discover().await;
        let registry = Arc::new(CapabilityRegistry::build(&per_server));
        *self.registry.write() = registry;
        debug!("registry snapshot swapped");
    }

    /// All tools across all servers, each tagged with its owner and whether
    /// the name collides.
    pub fn list_tools(&self) -> Vec<Aggregated<Tool>> {
        self.snapshot().tools().all()
    }

    pub fn list_resources(&self) -> Vec<Aggregated<Resource>> {
        self.snapshot().resources().all()
    }

    pub fn list_resource_templates(&self) -> Vec<Aggregated<ResourceTemplate>> {
        self.snapshot().resource_templates().all()
    }

    pub fn list_prompts(&self) -> Vec<Aggregated<Prompt>> {
        self.snapshot().prompts().all()
    }

    /// Call a tool, routing by name unless `server` pins the target.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Arguments>,
        server: Option<&str>,
    ) -> Result<CallToolResult, ClientError> {
        let route = self.route(|router| router.route_tool(name, server))?;
        info!(tool = %name, server = %route.server, "dispatching tool call");

        self.session(&route)?
            .call_tool(&route.identifier, arguments)
            .await
            .map_err(|source| ClientError::Server {
                server: route.server,
                source,
            })
    }

    /// Read a resource. `uri` may be namespaced (`server:uri`) for
    /// auto-routing; an explicit `server` overrides any namespace.
    pub async fn read_resource(
        &self,
        uri: &str,
        server: Option<&str>,
    ) -> Result<ReadResourceResult, ClientError> {
        let route = self.route(|router| router.route_resource(uri, server))?;
        info!(uri = %route.identifier, server = %route.server, "dispatching resource read");

        self.session(&route)?
            .read_resource(&route.identifier)
            .await
            .map_err(|source| ClientError::Server {
                server: route.server,
                source,
            })
    }

    /// Fetch a prompt, routing by name unless `server` pins the target.
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<Arguments>,
        server: Option<&str>,
    ) -> Result<GetPromptResult, ClientError> {
        let route = self.route(|router| router.route_prompt(name, server))?;
        info!(prompt = %name, server = %route.server, "dispatching prompt request");

        self.session(&route)?
            .get_prompt(&route.identifier, arguments)
            .await
            .map_err(|source| ClientError::Server {
                server: route.server,
                source,
            })
    }

    /// Servers with a live session, in configuration order. Partial
    /// connectivity is a normal operating state; callers can always see
    /// which servers are live.
    pub fn connected_servers(&self) -> Vec<String> {
        self.manager.connected_names()
    }

    /// Servers that failed to open, with the recorded reason.
    pub fn failed_servers(&self) -> Vec<(String, String)> {
        self.manager
            .failures()
            .iter()
            .map(|(name, error)| (name.to_string(), error.to_string()))
            .collect()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.manager.is_connected(name)
    }

    /// `(server, kind)` pairs whose capability listing failed in the pass
    /// behind the current snapshot.
    pub fn degraded_servers(&self) -> Vec<(String, multimcp_core::CapabilityKind)> {
        self.snapshot().degraded().to_vec()
    }

    /// Log a one-shot summary of everything discovered.
    pub fn log_capability_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            servers = ?self.connected_servers(),
            tools = snapshot.tools().len(),
            resources = snapshot.resources().len(),
            resource_templates = snapshot.resource_templates().len(),
            prompts = snapshot.prompts().len(),
            tool_collisions = ?snapshot.tools().collisions(),
            prompt_collisions = ?snapshot.prompts().collisions(),
            "capability summary"
        );
    }

    /// Close every session exactly once, best-effort, reporting an aggregate
    /// error after all closes were attempted. Safe to call repeatedly.
    pub async fn close(&self) -> Result<(), ClientError> {
        Ok(self.manager.close().await?)
    }

    fn route(
        &self,
        resolve: impl FnOnce(&Router<'_>) -> Result<Route, RoutingError>,
    ) -> Result<Route, ClientError> {
        let snapshot = self.snapshot();
        let connected = self.manager.connected_names();
        let router = Router::new(&snapshot, &connected);
        Ok(resolve(&router)?)
    }

    fn session(&self, route: &Route) -> Result<&crate::session::ServerSession, ClientError> {
        self.manager
            .session(&route.server)
            .ok_or_else(|| RoutingError::UnknownServer { name: route.server.clone() }.into())
    }
}
