//! The set of apps known from the vhosts directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::validation::validate_app_name;

use super::discovery::{is_generated_ssl_conf, read_app_config, SSL_CONF_SUFFIX};
use super::record::ApplicationRecord;

/// Extension of app vhost files.
const CONF_EXTENSION: &str = "conf";

/// Discovers apps from a vhosts directory.
///
/// Nothing is cached: every query reads the filesystem again.
#[derive(Debug, Clone)]
pub struct AppRegistry {
    vhosts_dir: PathBuf,
}

impl AppRegistry {
    pub fn new(vhosts_dir: impl Into<PathBuf>) -> Self {
        Self {
            vhosts_dir: vhosts_dir.into(),
        }
    }

    pub fn vhosts_dir(&self) -> &Path {
        &self.vhosts_dir
    }

    /// Every valid app in the vhosts directory.
    ///
    /// Generated `*-ssl.conf` files are skipped, as is any file that does
    /// not yield a complete record. Files are visited in file-name order.
    /// A missing directory yields no apps.
    pub fn discover_all(&self) -> Vec<ApplicationRecord> {
        if !self.vhosts_dir.is_dir() {
            info!(vhosts_dir = %self.vhosts_dir.display(), "Vhosts directory does not exist");
            return Vec::new();
        }

        let entries = match fs::read_dir(&self.vhosts_dir) {
            Ok(entries) => entries,
            Err(e) => {
                info!(
                    vhosts_dir = %self.vhosts_dir.display(),
                    error = %e,
                    "Vhosts directory cannot be listed"
                );
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_app_conf(path))
            .collect();
        paths.sort();

        let records: Vec<ApplicationRecord> = paths
            .iter()
            .filter_map(|path| self.parse(path))
            .collect();

        debug!(
            vhosts_dir = %self.vhosts_dir.display(),
            files = paths.len(),
            apps = records.len(),
            "Discovery finished"
        );
        records
    }

    /// Whether the generated SSL vhost for this app exists.
    pub fn is_ssl_installed(&self, record: &ApplicationRecord) -> bool {
        self.ssl_conf_path(record.name()).is_file()
    }

    /// Split records into those with and without an SSL vhost, keeping order.
    pub fn partition_by_ssl(
        &self,
        records: Vec<ApplicationRecord>,
    ) -> (Vec<ApplicationRecord>, Vec<ApplicationRecord>) {
        records.into_iter().partition(|r| self.is_ssl_installed(r))
    }

    /// The app whose vhost file is `<vhosts_dir>/<name>.conf`.
    pub fn find_by_name(&self, name: &str) -> Option<ApplicationRecord> {
        if let Err(e) = validate_app_name(name) {
            debug!(name = name, error = %e, "Rejected app name");
            return None;
        }
        self.parse(&self.vhosts_dir.join(format!("{}.{}", name, CONF_EXTENSION)))
    }

    /// Path of the generated SSL vhost for an app.
    pub fn ssl_conf_path(&self, name: &str) -> PathBuf {
        self.vhosts_dir.join(format!("{}{}", name, SSL_CONF_SUFFIX))
    }

    fn parse(&self, path: &Path) -> Option<ApplicationRecord> {
        match read_app_config(path) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path = %path.display(), reason = %e, "Skipping vhost file");
                None
            }
        }
    }
}

/// Drop records whose name is in `ignore`, keeping order.
pub fn exclude_by_name(
    records: Vec<ApplicationRecord>,
    ignore: &HashSet<String>,
) -> Vec<ApplicationRecord> {
    records
        .into_iter()
        .filter(|r| !ignore.contains(r.name()))
        .collect()
}

fn is_app_conf(path: &Path) -> bool {
    let has_extension = path.extension().is_some_and(|ext| ext == CONF_EXTENSION);
    let generated = path
        .file_name()
        .is_some_and(|name| is_generated_ssl_conf(&name.to_string_lossy()));
    has_extension && !generated && path.is_file()
}
