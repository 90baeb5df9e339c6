//! The hosted application record.

use std::path::{Path, PathBuf};

/// Path segment preceding the app name in a document root.
pub const APP_MARKER: &str = "apps/";

/// One hosted application.
///
/// Only constructible through [`ApplicationRecord::new`], which guarantees
/// a non-empty name, a non-empty document root and at least one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    name: String,
    document_root: PathBuf,
    domains: Vec<String>,
}

impl ApplicationRecord {
    /// Build a record, or `None` if any part is empty.
    ///
    /// Duplicate domains are dropped, keeping the first occurrence.
    pub fn new<I, S>(name: &str, document_root: impl Into<PathBuf>, domains: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let document_root = document_root.into();
        let mut unique: Vec<String> = Vec::new();
        for domain in domains {
            let domain = domain.into();
            if !domain.is_empty() && !unique.contains(&domain) {
                unique.push(domain);
            }
        }

        if name.is_empty() || document_root.as_os_str().is_empty() || unique.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            document_root,
            domains: unique,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// The domain certbot files the certificate under.
    pub fn primary_domain(&self) -> &str {
        &self.domains[0]
    }

    /// Domains joined with single spaces, as in a `server_name` directive.
    pub fn server_names(&self) -> String {
        self.domains.join(" ")
    }
}

/// The segment between `apps/` and the next `/` in a document root.
///
/// `/srv/users/x/apps/myapp/public` gives `myapp`. Roots without the
/// marker, without a separator after the name, or with an empty segment
/// give `None`.
pub fn app_name_from_root(root: &str) -> Option<&str> {
    let start = root.find(APP_MARKER)? + APP_MARKER.len();
    let rest = &root[start..];
    let end = rest.find('/')?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

/// The directory holding the `apps/` segment's sibling `log/` tree.
///
/// `/srv/users/x/apps/myapp/public` gives `/srv/users/x/log/myapp`.
pub fn app_log_dir_from_root(root: &str, name: &str) -> Option<PathBuf> {
    let prefix = &root[..root.find(APP_MARKER)?];
    Some(Path::new(prefix).join("log").join(name))
}
