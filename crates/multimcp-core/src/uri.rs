//! Namespace and URI-template helpers.
//!
//! A namespaced URI is `server_name:raw_uri`, the one wire-visible
//! convention this workspace owns. Parsing here is purely syntactic; whether
//! a prefix actually names a connected server is the router's decision, since
//! raw URIs legitimately contain colons (`http://...`, `file:///...`).

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TEMPLATE_VAR_REGEX: Regex = Regex::new(r"\{([^}]+)\}").unwrap();
}

/// Prefix a URI with a server namespace: `server_name:uri`.
pub fn format_namespace_uri(server_name: &str, uri: &str) -> String {
    format!("{server_name}:{uri}")
}

/// Split a possibly-namespaced URI on the first `:`.
///
/// Returns `(Some(prefix), rest)` when a colon is present and
/// `(None, input)` otherwise. No validation is performed on the prefix.
pub fn parse_namespace_uri(namespaced_uri: &str) -> (Option<&str>, &str) {
    match namespaced_uri.split_once(':') {
        Some((prefix, rest)) => (Some(prefix), rest),
        None => (None, namespaced_uri),
    }
}

/// Variable names appearing as `{variable}` in a URI template.
pub fn extract_template_variables(uri_template: &str) -> Vec<String> {
    TEMPLATE_VAR_REGEX
        .captures_iter(uri_template)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Replace `{variable}` placeholders with URL-encoded values.
///
/// Variables without a provided value are left in place.
pub fn substitute_template_variables(
    uri_template: &str,
    variables: &HashMap<String, String>,
) -> String {
    let mut result = uri_template.to_string();
    for (var, value) in variables {
        let encoded = urlencoding::encode(value);
        result = result.replace(&format!("{{{var}}}"), &encoded);
    }
    result
}
