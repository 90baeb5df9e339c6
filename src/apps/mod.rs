//! Hosted app discovery.
//!
//! Apps are read from the web server's vhost files on every run; there is
//! no persisted registry.

mod discovery;
mod record;
mod registry;

pub use discovery::{app_from_config_text, read_app_config, SSL_CONF_SUFFIX};
pub use record::{app_log_dir_from_root, app_name_from_root, ApplicationRecord, APP_MARKER};
pub use registry::{exclude_by_name, AppRegistry};
