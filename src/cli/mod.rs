//! Command-line surface and mode selection.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::SslError;
use crate::validation::{validate_app_name, validate_domain};

/// Obtain Let's Encrypt certificates for ServerPilot apps and wire them into nginx
#[derive(Parser, Debug)]
#[command(name = "lumo-ssl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Secure every discovered app
    #[arg(short, long)]
    pub all: bool,

    /// Secure every app that has no SSL vhost yet
    #[arg(short, long)]
    pub fresh: bool,

    /// Secure one app by name, or name the app given with --domain
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Domain to secure for the app at --root (repeatable)
    #[arg(short, long = "domain", value_name = "DOMAIN", requires = "root")]
    pub domains: Vec<String>,

    /// Document root of the app given with --domain
    #[arg(short, long, value_name = "PATH", requires = "domains")]
    pub root: Option<PathBuf>,

    /// Comma-separated app names to skip; on its own, secure every other app
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Renew every certificate close to expiry and reload nginx
    #[arg(long)]
    pub renew: bool,

    /// Install or remove the twice-daily renewal cron job
    #[arg(long, value_name = "ACTION")]
    pub renewal_cron: Option<Toggle>,

    /// Install or remove the cron job that secures new apps automatically
    #[arg(long, value_name = "ACTION")]
    pub autopilot: Option<Toggle>,

    /// Configuration file
    #[arg(short, long, env = "LUMO_SSL_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Switch for the cron job flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    Enable,
    Disable,
}

/// The single operating mode of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    All { ignore: Vec<String> },
    Fresh { ignore: Vec<String> },
    Single { name: String },
    Explicit {
        name: Option<String>,
        domains: Vec<String>,
        root: PathBuf,
    },
    Renew,
    RenewalCron(Toggle),
    Autopilot(Toggle),
}

impl Cli {
    /// Resolve the flags to one mode.
    ///
    /// Returns `Ok(None)` when no mode flag was given.
    pub fn mode(&self) -> Result<Option<Mode>, SslError> {
        let mut modes = Vec::new();

        if self.all {
            modes.push(Mode::All {
                ignore: self.ignore_list(),
            });
        }
        if self.fresh {
            modes.push(Mode::Fresh {
                ignore: self.ignore_list(),
            });
        }
        if let Some(root) = &self.root {
            let domains = self
                .domains
                .iter()
                .map(|d| validate_domain(d).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(name) = &self.name {
                validate_app_name(name)?;
            }
            modes.push(Mode::Explicit {
                name: self.name.clone(),
                domains,
                root: root.clone(),
            });
        } else if let Some(name) = &self.name {
            validate_app_name(name)?;
            modes.push(Mode::Single { name: name.clone() });
        }
        if self.renew {
            modes.push(Mode::Renew);
        }
        if let Some(toggle) = self.renewal_cron {
            modes.push(Mode::RenewalCron(toggle));
        }
        if let Some(toggle) = self.autopilot {
            modes.push(Mode::Autopilot(toggle));
        }

        // Alone, the ignore list means every app except those named.
        if !self.ignore.is_empty() && !(self.all || self.fresh) {
            if !modes.is_empty() {
                return Err(SslError::invalid_parameter(
                    "ignore",
                    "--ignore only combines with --all and --fresh",
                ));
            }
            modes.push(Mode::All {
                ignore: self.ignore_list(),
            });
        }

        if modes.len() > 1 {
            return Err(SslError::invalid_parameter(
                "mode",
                "choose one of --all, --fresh, --name, --domain, --renew, --renewal-cron, --autopilot",
            ));
        }

        Ok(modes.pop())
    }

    fn ignore_list(&self) -> Vec<String> {
        self.ignore
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lumo-ssl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_mode() {
        assert_eq!(parse(&[]).mode().unwrap(), None);
        assert_eq!(parse(&["-v", "--no-color"]).mode().unwrap(), None);
    }

    #[test]
    fn test_all_with_ignore() {
        let mode = parse(&["--all", "--ignore", "shop, blog"]).mode().unwrap();
        assert_eq!(
            mode,
            Some(Mode::All {
                ignore: vec!["shop".to_string(), "blog".to_string()]
            })
        );
    }

    #[test]
    fn test_fresh() {
        let mode = parse(&["-f", "-i", "shop"]).mode().unwrap();
        assert_eq!(
            mode,
            Some(Mode::Fresh {
                ignore: vec!["shop".to_string()]
            })
        );
    }

    #[test]
    fn test_single() {
        let mode = parse(&["-n", "shop"]).mode().unwrap();
        assert_eq!(
            mode,
            Some(Mode::Single {
                name: "shop".to_string()
            })
        );
    }

    #[test]
    fn test_explicit() {
        let mode = parse(&["-d", "a.com", "-d", "b.com.", "-r", "/srv/users/x/apps/shop/public"])
            .mode()
            .unwrap();
        assert_eq!(
            mode,
            Some(Mode::Explicit {
                name: None,
                domains: vec!["a.com".to_string(), "b.com".to_string()],
                root: PathBuf::from("/srv/users/x/apps/shop/public"),
            })
        );
    }

    #[test]
    fn test_explicit_with_name() {
        let mode = parse(&["-n", "shop", "-d", "a.com", "-r", "/var/www/shop"])
            .mode()
            .unwrap();
        assert!(matches!(mode, Some(Mode::Explicit { name: Some(ref n), .. }) if n == "shop"));
    }

    #[test]
    fn test_explicit_rejects_invalid_domain() {
        let result = parse(&["-d", "*.a.com", "-r", "/var/www/shop"]).mode();
        assert!(matches!(result, Err(SslError::Validation { .. })));
    }

    #[test]
    fn test_domain_requires_root() {
        assert!(Cli::try_parse_from(["lumo-ssl", "-d", "a.com"]).is_err());
        assert!(Cli::try_parse_from(["lumo-ssl", "-r", "/var/www"]).is_err());
    }

    #[test]
    fn test_maintenance_modes() {
        assert_eq!(parse(&["--renew"]).mode().unwrap(), Some(Mode::Renew));
        assert_eq!(
            parse(&["--renewal-cron", "enable"]).mode().unwrap(),
            Some(Mode::RenewalCron(Toggle::Enable))
        );
        assert_eq!(
            parse(&["--autopilot", "disable"]).mode().unwrap(),
            Some(Mode::Autopilot(Toggle::Disable))
        );
        assert!(Cli::try_parse_from(["lumo-ssl", "--autopilot", "maybe"]).is_err());
    }

    #[test]
    fn test_two_modes_conflict() {
        assert!(parse(&["--all", "--fresh"]).mode().is_err());
        assert!(parse(&["--renew", "-n", "shop"]).mode().is_err());
    }

    #[test]
    fn test_ignore_alone_secures_other_apps() {
        let mode = parse(&["--ignore", "shop,blog"]).mode().unwrap();
        assert_eq!(
            mode,
            Some(Mode::All {
                ignore: vec!["shop".to_string(), "blog".to_string()]
            })
        );
    }

    #[test]
    fn test_ignore_with_single_app() {
        assert!(parse(&["-n", "shop", "-i", "blog"]).mode().is_err());
    }

    #[test]
    fn test_config_flag() {
        let cli = parse(&["-c", "/tmp/ssl.toml", "--renew"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ssl.toml")));
    }
}
