//! Writing the SSL vhost for an app and reloading the web server.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::apps::{app_log_dir_from_root, ApplicationRecord, SSL_CONF_SUFFIX};
use crate::config::{NginxConfig, PathsConfig};
use crate::error::SslError;
use crate::executor::{sanitize_output, CommandRunner};
use crate::files::{remove_if_exists, write_atomic};
use crate::templates::{TemplateEngine, SSL_VHOST_TEMPLATE};

/// Permissions of generated vhost files.
const VHOST_FILE_MODE: u32 = 0o644;

/// Renders `<name>-ssl.conf` files into the vhosts directory.
pub struct VhostWriter<'a> {
    runner: &'a dyn CommandRunner,
    engine: TemplateEngine,
    paths: PathsConfig,
    nginx: NginxConfig,
}

impl<'a> VhostWriter<'a> {
    /// Create a writer, loading the custom template if one is configured.
    pub fn new(
        runner: &'a dyn CommandRunner,
        paths: PathsConfig,
        nginx: NginxConfig,
    ) -> Result<Self, SslError> {
        let mut engine = TemplateEngine::builtin()?;
        if let Some(template) = &nginx.template {
            engine = engine.with_override(SSL_VHOST_TEMPLATE, template)?;
        }

        Ok(Self {
            runner,
            engine,
            paths,
            nginx,
        })
    }

    /// Path the SSL vhost of `record` is written to.
    pub fn vhost_path(&self, record: &ApplicationRecord) -> PathBuf {
        self.paths
            .vhosts_dir
            .join(format!("{}{}", record.name(), SSL_CONF_SUFFIX))
    }

    /// Render the SSL vhost stanza for `record`.
    pub fn render(&self, record: &ApplicationRecord) -> Result<String, SslError> {
        let root = record.document_root().to_string_lossy();
        let cert_dir = self.paths.live_dir.join(record.primary_domain());
        let log_dir = app_log_dir_from_root(&root, record.name())
            .unwrap_or_else(|| self.paths.fallback_log_dir.join(record.name()));
        let include_dir = self.paths.vhosts_dir.join(format!("{}.d", record.name()));

        let context = serde_json::json!({
            "name": record.name(),
            "server_names": record.server_names(),
            "ssl_certificate": cert_dir.join("fullchain.pem"),
            "ssl_certificate_key": cert_dir.join("privkey.pem"),
            "root": root,
            "log_dir": log_dir,
            "include_dir": include_dir,
        });

        self.engine.render(SSL_VHOST_TEMPLATE, &context)
    }

    /// Write the SSL vhost for `record`, check the config, and reload.
    ///
    /// The file is replaced atomically. If the config check fails the
    /// previous file is restored, or the new one removed when there was
    /// none. Returns the path written.
    pub fn write_vhost_config(&self, record: &ApplicationRecord) -> Result<PathBuf, SslError> {
        let path = self.vhost_path(record);
        let content = self.render(record).map_err(|e| SslError::Write {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let previous = fs::read_to_string(&path).ok();
        write_atomic(&path, &content, VHOST_FILE_MODE)?;
        info!(app = record.name(), path = %path.display(), "Vhost file written");

        if !self.nginx.test_command.is_empty() {
            if let Err(message) = self.run_checked(&self.nginx.test_command) {
                warn!(
                    app = record.name(),
                    error = %message,
                    "Config test failed, rolling back vhost"
                );
                if let Err(e) = rollback(&path, previous.as_deref()) {
                    warn!(error = %e, "Failed to roll back rejected vhost file");
                }
                return Err(SslError::Write {
                    path,
                    message: format!("config test failed: {}", message),
                });
            }
        }

        self.reload().map_err(|message| SslError::Write {
            path: path.clone(),
            message: format!("reload failed: {}", message),
        })?;

        Ok(path)
    }

    fn reload(&self) -> Result<(), String> {
        self.run_checked(&self.nginx.reload_command)?;
        info!("Web server reloaded");
        Ok(())
    }

    /// Run a command, turning a spawn error or non-zero exit into a message.
    fn run_checked(&self, command: &[String]) -> Result<(), String> {
        debug!(command = ?command, "Running web server command");
        let result = self
            .runner
            .run(command, self.nginx.timeout())
            .map_err(|e| e.to_string())?;

        if result.success {
            Ok(())
        } else {
            Err(format!(
                "{} exited with {:?}: {}",
                command.join(" "),
                result.exit_code,
                sanitize_output(&result.combined_output(), 5)
            ))
        }
    }
}

/// Put back the file content seen before a rejected write.
fn rollback(path: &Path, previous: Option<&str>) -> Result<(), SslError> {
    match previous {
        Some(content) => write_atomic(path, content, VHOST_FILE_MODE),
        None => remove_if_exists(path).map(|_| ()),
    }
}

/// The reload command on its own, for renewal runs.
pub fn reload_web_server(runner: &dyn CommandRunner, nginx: &NginxConfig) -> Result<(), SslError> {
    let result = runner.run(&nginx.reload_command, nginx.timeout())?;
    if result.success {
        info!("Web server reloaded");
        Ok(())
    } else {
        Err(SslError::execution_failed(format!(
            "{} exited with {:?}",
            nginx.reload_command.join(" "),
            result.exit_code
        )))
    }
}
