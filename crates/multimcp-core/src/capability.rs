//! Capability kinds advertised by MCP servers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four kinds of capability a server can expose.
///
/// Tools and prompts are identified by flat names; resources and resource
/// templates are identified by URIs (the URI template string for the latter),
/// which makes them eligible for `server:uri` namespace routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
    ResourceTemplate,
}

impl CapabilityKind {
    /// Whether identifiers of this kind are URIs and accept a namespace prefix.
    pub fn is_uri_identified(self) -> bool {
        matches!(self, CapabilityKind::Resource | CapabilityKind::ResourceTemplate)
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Prompt => "prompt",
            CapabilityKind::ResourceTemplate => "resource template",
        };
        f.write_str(name)
    }
}
