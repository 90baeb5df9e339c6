//! Configuration settings for lumo-ssl.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SslError;
use crate::validation::validate_email;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/lumo/ssl.toml";

/// Main configuration structure.
///
/// Every section and field has a default matching a stock ServerPilot
/// layout, so an empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub certbot: CertbotConfig,
    #[serde(default)]
    pub nginx: NginxConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding one `<app>.conf` per hosted app.
    #[serde(default = "default_vhosts_dir")]
    pub vhosts_dir: PathBuf,
    /// Directory where certbot keeps `<domain>/fullchain.pem`.
    #[serde(default = "default_live_dir")]
    pub live_dir: PathBuf,
    /// Log directory used when the app root has no `apps/` segment.
    #[serde(default = "default_fallback_log_dir")]
    pub fallback_log_dir: PathBuf,
}

/// Certificate client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CertbotConfig {
    /// Program name or path of the issuing client.
    #[serde(default = "default_certbot_program")]
    pub program: String,
    /// Account email. Without one the account is registered anonymously.
    pub email: Option<String>,
    /// Use the Let's Encrypt staging endpoint.
    #[serde(default)]
    pub staging: bool,
    /// Shell pipeline run once when the client is missing.
    #[serde(default = "default_install_command")]
    pub install_command: String,
    /// Probe exit codes that mean "client not installed".
    #[serde(default = "default_missing_exit_codes")]
    pub missing_exit_codes: Vec<i32>,
    /// Timeout for a single client invocation in seconds.
    #[serde(default = "default_certbot_timeout")]
    pub timeout_seconds: u64,
    /// Output markers also counted as success, checked after the built-in ones.
    #[serde(default)]
    pub extra_success_markers: Vec<String>,
}

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NginxConfig {
    /// Command (argv) reloading the web server.
    #[serde(default = "default_reload_command")]
    pub reload_command: Vec<String>,
    /// Command (argv) checking the configuration before reload. Empty disables the check.
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,
    /// Custom Tera template replacing the built-in SSL vhost template.
    pub template: Option<PathBuf>,
    /// Timeout for test and reload commands in seconds.
    #[serde(default = "default_nginx_timeout")]
    pub timeout_seconds: u64,
}

/// Periodic job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Directory scanned by cron for job files.
    #[serde(default = "default_cron_dir")]
    pub cron_dir: PathBuf,
    #[serde(default = "default_renewal_file")]
    pub renewal_file: String,
    /// Five-field cron expression for renewal.
    #[serde(default = "default_renewal_schedule")]
    pub renewal_schedule: String,
    #[serde(default = "default_autopilot_file")]
    pub autopilot_file: String,
    /// Five-field cron expression for autopilot.
    #[serde(default = "default_autopilot_schedule")]
    pub autopilot_schedule: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty", "compact" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_vhosts_dir() -> PathBuf {
    PathBuf::from("/etc/nginx-sp/vhosts.d")
}

fn default_live_dir() -> PathBuf {
    PathBuf::from("/etc/letsencrypt/live")
}

fn default_fallback_log_dir() -> PathBuf {
    PathBuf::from("/srv/users/serverpilot/log")
}

fn default_certbot_program() -> String {
    "certbot".to_string()
}

fn default_install_command() -> String {
    "apt-get update && apt-get install -y certbot".to_string()
}

fn default_missing_exit_codes() -> Vec<i32> {
    vec![127]
}

fn default_certbot_timeout() -> u64 {
    300
}

fn default_reload_command() -> Vec<String> {
    vec![
        "service".to_string(),
        "nginx-sp".to_string(),
        "reload".to_string(),
    ]
}

fn default_test_command() -> Vec<String> {
    vec!["nginx-sp".to_string(), "-t".to_string()]
}

fn default_nginx_timeout() -> u64 {
    30
}

fn default_cron_dir() -> PathBuf {
    PathBuf::from("/etc/cron.d")
}

fn default_renewal_file() -> String {
    "lumo-ssl-renew".to_string()
}

fn default_renewal_schedule() -> String {
    "0 */12 * * *".to_string()
}

fn default_autopilot_file() -> String {
    "lumo-ssl-autopilot".to_string()
}

fn default_autopilot_schedule() -> String {
    "*/10 * * * *".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vhosts_dir: default_vhosts_dir(),
            live_dir: default_live_dir(),
            fallback_log_dir: default_fallback_log_dir(),
        }
    }
}

impl Default for CertbotConfig {
    fn default() -> Self {
        Self {
            program: default_certbot_program(),
            email: None,
            staging: false,
            install_command: default_install_command(),
            missing_exit_codes: default_missing_exit_codes(),
            timeout_seconds: default_certbot_timeout(),
            extra_success_markers: Vec::new(),
        }
    }
}

impl CertbotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            reload_command: default_reload_command(),
            test_command: default_test_command(),
            template: None,
            timeout_seconds: default_nginx_timeout(),
        }
    }
}

impl NginxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron_dir: default_cron_dir(),
            renewal_file: default_renewal_file(),
            renewal_schedule: default_renewal_schedule(),
            autopilot_file: default_autopilot_file(),
            autopilot_schedule: default_autopilot_schedule(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SslError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SslError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            SslError::Config { message } => SslError::Config {
                message: format!("{} ({})", message, path.display()),
            },
            other => other,
        })
    }

    /// Resolve settings for a run.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SslError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SslError> {
        let settings: Settings = toml::from_str(content).map_err(|e| SslError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), SslError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(SslError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(SslError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.nginx.reload_command.is_empty() {
            return Err(SslError::Config {
                message: "nginx.reload_command cannot be empty".to_string(),
            });
        }

        if self.certbot.program.trim().is_empty() {
            return Err(SslError::Config {
                message: "certbot.program cannot be empty".to_string(),
            });
        }

        if let Some(email) = &self.certbot.email {
            validate_email(email).map_err(|e| SslError::Config {
                message: format!("Invalid certbot.email: {}", e),
            })?;
        }

        for (key, schedule) in [
            ("schedule.renewal_schedule", &self.schedule.renewal_schedule),
            ("schedule.autopilot_schedule", &self.schedule.autopilot_schedule),
        ] {
            if schedule.split_whitespace().count() != 5 {
                return Err(SslError::Config {
                    message: format!(
                        "Invalid {} '{}'. Expected five cron fields",
                        key, schedule
                    ),
                });
            }
        }

        Ok(())
    }
}
