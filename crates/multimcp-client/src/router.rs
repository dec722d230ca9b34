//! Call resolution: explicit override > namespaced URI > unique name.
//!
//! One algorithm serves all four capability kinds. Resources and resource
//! templates additionally understand the `server:uri` prefix because their
//! identifiers are URIs; tools and prompts disambiguate with an explicit
//! server name only.

use tracing::debug;

use crate::registry::{Capability, CapabilityRegistry, RegistryIndex};
use multimcp_core::{uri::parse_namespace_uri, RoutingError};

/// A resolved call target: the owning server and the identifier to send it.
///
/// For a namespaced URI the identifier is the suffix after the prefix was
/// stripped; in every other case it is the caller's identifier unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub server: String,
    pub identifier: String,
}

/// Resolves identifiers against one registry snapshot and the set of
/// currently connected servers.
///
/// Cheap to construct per operation, so every routing decision is made
/// against a single consistent snapshot even while a refresh swaps in a new
/// one.
pub struct Router<'a> {
    registry: &'a CapabilityRegistry,
    connected: &'a [String],
}

impl<'a> Router<'a> {
    pub fn new(registry: &'a CapabilityRegistry, connected: &'a [String]) -> Self {
        Self { registry, connected }
    }

    pub fn route_tool(&self, name: &str, server: Option<&str>) -> Result<Route, RoutingError> {
        self.route(self.registry.tools(), name, server)
    }

    pub fn route_resource(&self, uri: &str, server: Option<&str>) -> Result<Route, RoutingError> {
        self.route(self.registry.resources(), uri, server)
    }

    pub fn route_resource_template(
        &self,
        uri_template: &str,
        server: Option<&str>,
    ) -> Result<Route, RoutingError> {
        self.route(self.registry.resource_templates(), uri_template, server)
    }

    pub fn route_prompt(&self, name: &str, server: Option<&str>) -> Result<Route, RoutingError> {
        self.route(self.registry.prompts(), name, server)
    }

    /// The single routing algorithm.
    ///
    /// 1. An explicit server always wins, with no collision check; it must be
    ///    connected.
    /// 2. A namespace prefix wins next, but only for URI-identified kinds and
    ///    only when the prefix exactly equals a connected server name;
    ///    otherwise the whole string is the identifier.
    /// 3. Otherwise the registry must know exactly one owner.
    fn route<T: Capability>(
        &self,
        index: &RegistryIndex<T>,
        identifier: &str,
        explicit: Option<&str>,
    ) -> Result<Route, RoutingError> {
        if let Some(server) = explicit {
            if !self.is_connected(server) {
                return Err(RoutingError::UnknownServer { name: server.to_string() });
            }
            debug!(kind = %T::KIND, identifier = %identifier, server = %server, "explicit route");
            return Ok(Route {
                server: server.to_string(),
                identifier: identifier.to_string(),
            });
        }

        if T::KIND.is_uri_identified() {
            if let (Some(prefix), rest) = parse_namespace_uri(identifier) {
                if self.is_connected(prefix) {
                    debug!(kind = %T::KIND, identifier = %rest, server = %prefix, "namespace route");
                    return Ok(Route {
                        server: prefix.to_string(),
                        identifier: rest.to_string(),
                    });
                }
            }
        }

        let (server, _) = index.owner(identifier)?;
        debug!(kind = %T::KIND, identifier = %identifier, server = %server, "registry route");
        Ok(Route {
            server: server.clone(),
            identifier: identifier.to_string(),
        })
    }

    fn is_connected(&self, name: &str) -> bool {
        self.connected.iter().any(|server| server == name)
    }
}
