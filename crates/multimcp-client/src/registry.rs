//! Aggregated capability snapshot with collision bookkeeping.
//!
//! One discovery pass produces one immutable [`CapabilityRegistry`]. The
//! registry is only ever replaced wholesale, never edited in place, so
//! concurrent readers just need a consistent read of the current snapshot
//! pointer. Construction is a pure function of the per-server discovery
//! output; it never fails, it only classifies.

use std::collections::{BTreeSet, HashMap};

use rmcp::model::{Prompt, Resource, ResourceTemplate, Tool};
use tracing::{debug, warn};

use multimcp_core::{uri::format_namespace_uri, CapabilityKind, RoutingError};

/// A capability descriptor the registry can index.
///
/// Metadata (schemas, descriptions, annotations) stays opaque: the protocol
/// types pass through untouched. Whether an identifier accepts the
/// `server:uri` routing prefix follows from the kind
/// ([`CapabilityKind::is_uri_identified`]).
pub trait Capability: Clone {
    const KIND: CapabilityKind;

    fn identifier(&self) -> &str;
}

impl Capability for Tool {
    const KIND: CapabilityKind = CapabilityKind::Tool;

    fn identifier(&self) -> &str {
        self.name.as_ref()
    }
}

impl Capability for Resource {
    const KIND: CapabilityKind = CapabilityKind::Resource;

    fn identifier(&self) -> &str {
        &self.uri
    }
}

impl Capability for Prompt {
    const KIND: CapabilityKind = CapabilityKind::Prompt;

    fn identifier(&self) -> &str {
        &self.name
    }
}

impl Capability for ResourceTemplate {
    const KIND: CapabilityKind = CapabilityKind::ResourceTemplate;

    fn identifier(&self) -> &str {
        &self.uri_template
    }
}

/// Everything one server advertised in a single discovery pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ServerInventory {
    pub server: String,
    pub tools: Vec<Tool>,
    pub resources: Vec<Resource>,
    pub resource_templates: Vec<ResourceTemplate>,
    pub prompts: Vec<Prompt>,
    /// Kinds whose listing call failed; the server contributes nothing for
    /// these in this pass.
    pub degraded: Vec<CapabilityKind>,
}

impl ServerInventory {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    pub fn total(&self) -> usize {
        self.tools.len()
            + self.resources.len()
            + self.resource_templates.len()
            + self.prompts.len()
    }
}

/// One registry entry: an identifier and every server providing it, in
/// discovery order. More than one owner is a collision.
#[derive(Debug, Clone)]
pub struct RegistryEntry<T> {
    pub identifier: String,
    pub owners: Vec<(String, T)>,
}

impl<T> RegistryEntry<T> {
    pub fn is_collision(&self) -> bool {
        self.owners.len() > 1
    }

    pub fn owner_names(&self) -> Vec<String> {
        self.owners.iter().map(|(server, _)| server.clone()).collect()
    }
}

/// A listed capability tagged with its owning server.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Aggregated<T> {
    pub server: String,
    /// Whether other servers provide the same identifier.
    pub collision: bool,
    pub item: T,
}

impl<T: Capability> Aggregated<T> {
    pub fn identifier(&self) -> &str {
        self.item.identifier()
    }

    /// The `server:identifier` form the router accepts for URI kinds.
    pub fn namespaced_uri(&self) -> String {
        format_namespace_uri(&self.server, self.item.identifier())
    }
}

/// Identifier index for one capability kind.
#[derive(Debug, Clone)]
pub struct RegistryIndex<T> {
    entries: Vec<RegistryEntry<T>>,
    by_identifier: HashMap<String, usize>,
    collisions: BTreeSet<String>,
}

impl<T> Default for RegistryIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_identifier: HashMap::new(),
            collisions: BTreeSet::new(),
        }
    }
}

impl<T: Capability> RegistryIndex<T> {
    fn insert(&mut self, server: &str, item: T) {
        let identifier = item.identifier().to_string();
        match self.by_identifier.get(&identifier) {
            Some(&index) => {
                self.entries[index].owners.push((server.to_string(), item));
                self.collisions.insert(identifier);
            }
            None => {
                self.by_identifier.insert(identifier.clone(), self.entries.len());
                self.entries.push(RegistryEntry {
                    identifier,
                    owners: vec![(server.to_string(), item)],
                });
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&RegistryEntry<T>> {
        self.by_identifier
            .get(identifier)
            .map(|&index| &self.entries[index])
    }

    /// Every `(server, descriptor)` pair for an identifier; empty if unknown.
    pub fn resolve(&self, identifier: &str) -> &[(String, T)] {
        self.get(identifier).map_or(&[], |entry| &entry.owners)
    }

    /// The single owner, or why there isn't one. This is the router's
    /// building block: exactly one owner routes, zero is `NotFound`, two or
    /// more is `Ambiguous` with the candidates listed in discovery order.
    pub fn owner(&self, identifier: &str) -> Result<&(String, T), RoutingError> {
        match self.get(identifier) {
            None => Err(RoutingError::NotFound {
                kind: T::KIND,
                identifier: identifier.to_string(),
            }),
            Some(entry) if entry.owners.len() == 1 => Ok(&entry.owners[0]),
            Some(entry) => Err(RoutingError::Ambiguous {
                kind: T::KIND,
                identifier: identifier.to_string(),
                candidates: entry.owner_names(),
            }),
        }
    }

    pub fn is_collision(&self, identifier: &str) -> bool {
        self.collisions.contains(identifier)
    }

    /// Colliding identifiers, sorted.
    pub fn collisions(&self) -> &BTreeSet<String> {
        &self.collisions
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<T>> {
        self.entries.iter()
    }

    /// Every descriptor across every server, tagged with its owner.
    ///
    /// Identifiers appear in first-discovery order; duplicate identifiers
    /// appear once per owning server (full fan-out, no deduplication).
    pub fn all(&self) -> Vec<Aggregated<T>> {
        self.entries
            .iter()
            .flat_map(|entry| {
                let collision = entry.is_collision();
                entry.owners.iter().map(move |(server, item)| Aggregated {
                    server: server.clone(),
                    collision,
                    item: item.clone(),
                })
            })
            .collect()
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point-in-time aggregation of every connected server's capability set.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    tools: RegistryIndex<Tool>,
    resources: RegistryIndex<Resource>,
    resource_templates: RegistryIndex<ResourceTemplate>,
    prompts: RegistryIndex<Prompt>,
    degraded: Vec<(String, CapabilityKind)>,
}

impl CapabilityRegistry {
    /// Build a snapshot from per-server discovery output.
    ///
    /// Server order defines owner order everywhere, which is what makes the
    /// "first configured server" tie-break deterministic.
    pub fn build(per_server: &[ServerInventory]) -> Self {
        let mut registry = Self::default();

        for inventory in per_server {
            for tool in &inventory.tools {
                registry.tools.insert(&inventory.server, tool.clone());
            }
            for resource in &inventory.resources {
                registry.resources.insert(&inventory.server, resource.clone());
            }
            for template in &inventory.resource_templates {
                registry
                    .resource_templates
                    .insert(&inventory.server, template.clone());
            }
            for prompt in &inventory.prompts {
                registry.prompts.insert(&inventory.server, prompt.clone());
            }
            for kind in &inventory.degraded {
                registry.degraded.push((inventory.server.clone(), *kind));
            }
        }

        registry.log_collisions();
        debug!(
            tools = registry.tools.len(),
            resources = registry.resources.len(),
            resource_templates = registry.resource_templates.len(),
            prompts = registry.prompts.len(),
            servers = per_server.len(),
            "registry snapshot built"
        );

        registry
    }

    fn log_collisions(&self) {
        fn log_for<T: Capability>(index: &RegistryIndex<T>) {
            for identifier in index.collisions() {
                if let Some(entry) = index.get(identifier) {
                    warn!(
                        kind = %T::KIND,
                        identifier = %identifier,
                        servers = ?entry.owner_names(),
                        "capability collision detected"
                    );
                }
            }
        }

        log_for(&self.tools);
        log_for(&self.resources);
        log_for(&self.resource_templates);
        log_for(&self.prompts);
    }

    pub fn tools(&self) -> &RegistryIndex<Tool> {
        &self.tools
    }

    pub fn resources(&self) -> &RegistryIndex<Resource> {
        &self.resources
    }

    pub fn resource_templates(&self) -> &RegistryIndex<ResourceTemplate> {
        &self.resource_templates
    }

    pub fn prompts(&self) -> &RegistryIndex<Prompt> {
        &self.prompts
    }

    /// `(server, kind)` pairs whose listing failed during the pass that
    /// built this snapshot. Those servers contribute nothing for those
    /// kinds until a refresh succeeds.
    pub fn degraded(&self) -> &[(String, CapabilityKind)] {
        &self.degraded
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
            && self.resources.is_empty()
            && self.resource_templates.is_empty()
            && self.prompts.is_empty()
    }
}
