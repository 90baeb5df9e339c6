//! Tera template engine wrapper.
//!
//! Provides template loading and rendering.

use std::path::Path;

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::SslError;

/// Name of the SSL vhost template.
pub const SSL_VHOST_TEMPLATE: &str = "nginx/ssl-vhost.conf.tera";

const SSL_VHOST_SOURCE: &str = include_str!("../../templates/nginx/ssl-vhost.conf.tera");

/// Template engine for rendering configuration files.
///
/// Wraps Tera and provides a simplified interface for template operations.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create an engine holding the built-in templates.
    pub fn builtin() -> Result<Self, SslError> {
        let mut tera = Tera::default();
        tera.add_raw_template(SSL_VHOST_TEMPLATE, SSL_VHOST_SOURCE)
            .map_err(|e| SslError::Template {
                message: format!("Failed to load built-in template '{}': {}", SSL_VHOST_TEMPLATE, e),
            })?;

        debug!(count = tera.get_template_names().count(), "Built-in templates loaded");
        Ok(Self { tera })
    }

    /// Replace the template registered under `name` with the file at `path`.
    pub fn with_override(mut self, name: &str, path: &Path) -> Result<Self, SslError> {
        self.tera
            .add_template_file(path, Some(name))
            .map_err(|e| SslError::Template {
                message: format!("Failed to load template '{}': {}", path.display(), e),
            })?;

        info!(template = name, path = %path.display(), "Using custom template");
        Ok(self)
    }

    /// Render a template with the given context.
    ///
    /// # Arguments
    ///
    /// * `template_name` - Name of the template (e.g., "nginx/ssl-vhost.conf.tera")
    /// * `context` - JSON value containing template variables
    pub fn render(
        &self,
        template_name: &str,
        context: &serde_json::Value,
    ) -> Result<String, SslError> {
        let tera_context = Context::from_serialize(context).map_err(|e| SslError::Template {
            message: format!("Invalid template context: {}", e),
        })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| SslError::Template {
                message: format!("Failed to render template '{}': {}", template_name, e),
            })
    }

    /// Check if a template exists.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_engine() {
        let engine = TemplateEngine::builtin().unwrap();
        assert!(engine.has_template(SSL_VHOST_TEMPLATE));
    }

    #[test]
    fn test_render_builtin_keeps_nginx_variables() {
        let engine = TemplateEngine::builtin().unwrap();
        let context = serde_json::json!({
            "name": "myapp",
            "server_names": "a.com b.com",
            "ssl_certificate": "/etc/letsencrypt/live/a.com/fullchain.pem",
            "ssl_certificate_key": "/etc/letsencrypt/live/a.com/privkey.pem",
            "root": "/srv/users/x/apps/myapp/public",
            "log_dir": "/srv/users/x/log/myapp",
            "include_dir": "/etc/nginx-sp/vhosts.d/myapp.d",
        });

        let result = engine.render(SSL_VHOST_TEMPLATE, &context).unwrap();
        assert!(result.contains("server_name a.com b.com;"));
        assert!(result.contains("proxy_set_header Host $host;"));
        assert!(result.contains("include /etc/nginx-sp/vhosts.d/myapp.d/*.nonssl_conf;"));
    }

    #[test]
    fn test_missing_context_value() {
        let engine = TemplateEngine::builtin().unwrap();
        let result = engine.render(SSL_VHOST_TEMPLATE, &serde_json::json!({ "name": "x" }));
        assert!(matches!(result, Err(SslError::Template { .. })));
    }

    #[test]
    fn test_override_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.tera");
        // Written with fs::write to keep {{ }} literal.
        fs::write(&path, "# custom for {{ name }}\n").unwrap();

        let engine = TemplateEngine::builtin()
            .unwrap()
            .with_override(SSL_VHOST_TEMPLATE, &path)
            .unwrap();
        let result = engine
            .render(SSL_VHOST_TEMPLATE, &serde_json::json!({ "name": "shop" }))
            .unwrap();
        assert_eq!(result, "# custom for shop\n");
    }

    #[test]
    fn test_override_missing_file() {
        let result = TemplateEngine::builtin()
            .unwrap()
            .with_override(SSL_VHOST_TEMPLATE, Path::new("/nonexistent/template.tera"));
        assert!(result.is_err());
    }
}
