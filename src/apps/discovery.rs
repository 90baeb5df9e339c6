//! Reading one app record out of a vhost config file.

use std::fs;
use std::path::Path;

use crate::error::DiscoveryError;
use crate::nginx::{self, Block};

use super::record::{app_name_from_root, ApplicationRecord};

/// Suffix of the vhost files this tool generates.
pub const SSL_CONF_SUFFIX: &str = "-ssl.conf";

/// Whether a file name belongs to a generated SSL vhost.
pub fn is_generated_ssl_conf(file_name: &str) -> bool {
    file_name.contains(SSL_CONF_SUFFIX)
}

/// Read the app record described by the vhost file at `path`.
pub fn read_app_config(path: &Path) -> Result<ApplicationRecord, DiscoveryError> {
    let text = fs::read_to_string(path).map_err(|source| DiscoveryError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    app_from_config_text(&text)
}

/// Extract the app record from vhost config text.
///
/// The last top-level `server` block is authoritative. Its `server_name`
/// values become the domains and its `root` the document root; the app
/// name comes from the root's `apps/<name>/` segment.
pub fn app_from_config_text(text: &str) -> Result<ApplicationRecord, DiscoveryError> {
    let tree = nginx::parse(text)?;
    let server = tree
        .last_block("server")
        .ok_or(DiscoveryError::MissingServerBlock)?;

    let domains = server_names(server)?;
    let root = document_root(server)?;
    let name = app_name_from_root(root).ok_or_else(|| DiscoveryError::MissingAppMarker {
        root: root.to_string(),
    })?;

    ApplicationRecord::new(name, root, domains)
        .ok_or(DiscoveryError::MissingDirective("server_name"))
}

fn server_names(server: &Block) -> Result<Vec<String>, DiscoveryError> {
    let domains: Vec<String> = server
        .values("server_name")
        .unwrap_or_default()
        .iter()
        .flat_map(|value| value.split_whitespace())
        .map(str::to_string)
        .collect();

    if domains.is_empty() {
        return Err(DiscoveryError::MissingDirective("server_name"));
    }
    Ok(domains)
}

fn document_root(server: &Block) -> Result<&str, DiscoveryError> {
    server
        .values("root")
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|root| !root.is_empty())
        .ok_or(DiscoveryError::MissingDirective("root"))
}
