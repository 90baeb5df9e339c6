//! Sequencing of one invocation.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::apps::{app_name_from_root, exclude_by_name, AppRegistry, ApplicationRecord};
use crate::certbot::{CertbotClient, IssueOutcome};
use crate::cli::{Mode, Toggle};
use crate::config::{NginxConfig, Settings};
use crate::error::{SslError, SslResult};
use crate::executor::CommandRunner;
use crate::report::Reporter;
use crate::schedule::{CronJob, CronRegistrar};
use crate::validation::validate_app_name;
use crate::vhost::{reload_web_server, VhostWriter};

use super::summary::RunSummary;

/// Runs the selected mode against the configured system.
pub struct Driver<'a> {
    registry: AppRegistry,
    certbot: CertbotClient<'a>,
    writer: Result<VhostWriter<'a>, String>,
    scheduler: CronRegistrar,
    runner: &'a dyn CommandRunner,
    nginx: NginxConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> Driver<'a> {
    /// A vhost writer that cannot be built (a broken custom template) only
    /// fails the modes that install vhosts.
    pub fn new(
        settings: &Settings,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn Reporter,
        scheduler: CronRegistrar,
    ) -> Self {
        let writer = VhostWriter::new(runner, settings.paths.clone(), settings.nginx.clone())
            .map_err(|e| e.to_string());
        if let Err(e) = &writer {
            warn!(error = %e, "Vhost writer unavailable");
        }

        Self {
            registry: AppRegistry::new(&settings.paths.vhosts_dir),
            certbot: CertbotClient::new(runner, settings.certbot.clone()),
            writer,
            scheduler,
            runner,
            nginx: settings.nginx.clone(),
            reporter,
        }
    }

    /// Execute `mode`. Failures are reported as they happen and tallied in
    /// the summary; nothing here aborts the process.
    pub fn run(&self, mode: &Mode) -> RunSummary {
        let mut summary = RunSummary::new();
        info!(mode = ?mode, "Run started");

        let result = match mode {
            Mode::All { ignore } => {
                self.secure_batch(false, ignore, &mut summary);
                Ok(())
            }
            Mode::Fresh { ignore } => {
                self.secure_batch(true, ignore, &mut summary);
                Ok(())
            }
            Mode::Single { name } => self.secure_named(name, &mut summary),
            Mode::Explicit {
                name,
                domains,
                root,
            } => self.secure_explicit(name.as_deref(), domains, root, &mut summary),
            Mode::Renew => {
                summary.record("renew", self.renew());
                Ok(())
            }
            Mode::RenewalCron(toggle) => {
                summary.record("renewal-cron", self.toggle_job(CronJob::Renewal, *toggle));
                Ok(())
            }
            Mode::Autopilot(toggle) => {
                summary.record("autopilot", self.toggle_job(CronJob::Autopilot, *toggle));
                Ok(())
            }
        };

        if let Err(e) = result {
            self.reporter.failure(&e.to_string());
            summary.record(mode_label(mode), false);
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Run finished"
        );
        summary
    }

    /// Issue a certificate for `record` and, on success, install its vhost.
    ///
    /// Returns whether the app ended up secured.
    pub fn process(&self, record: &ApplicationRecord) -> bool {
        let writer = match &self.writer {
            Ok(writer) => writer,
            Err(e) => {
                self.reporter.failure(&format!(
                    "Vhost files cannot be written, skipping the app {}: {}",
                    record.name(),
                    e
                ));
                return false;
            }
        };

        let domains = record.server_names();
        self.reporter
            .info(&format!("Obtaining SSL certificate for the app {}", record.name()));

        match self.certbot.issue_certificate(record) {
            IssueOutcome::Success => {
                self.reporter
                    .success(&format!("SSL certificate obtained for {}", domains));
            }
            IssueOutcome::AuthorizationFailed => {
                self.reporter.failure(&format!(
                    "Domain validation failed. Ensure {} resolve to this server and the \
                     document root {} is the public directory of the app",
                    domains,
                    record.document_root().display()
                ));
                return false;
            }
            IssueOutcome::RateLimited => {
                self.reporter.failure(&format!(
                    "Certificate rate limit reached for {}. Wait before requesting another",
                    domains
                ));
                return false;
            }
            IssueOutcome::InvalidRoot => {
                self.reporter.failure(&format!(
                    "Document root {} of the app {} does not exist",
                    record.document_root().display(),
                    record.name()
                ));
                return false;
            }
            IssueOutcome::UnknownFailure => {
                self.reporter.failure(&format!(
                    "Something went wrong. SSL certificate cannot be obtained for {}",
                    domains
                ));
                return false;
            }
        }

        self.reporter
            .info(&format!("Writing nginx vhost file for the app {}", record.name()));
        match writer.write_vhost_config(record) {
            Ok(path) => {
                self.reporter.success(&format!(
                    "SSL installed and activated for the app {} ({})",
                    record.name(),
                    path.display()
                ));
                true
            }
            Err(e) => {
                self.reporter
                    .failure(&format!("Vhost file cannot be installed: {}", e));
                false
            }
        }
    }

    fn secure_batch(&self, fresh_only: bool, ignore: &[String], summary: &mut RunSummary) {
        self.reporter.header("Finding apps");
        let mut records = self.registry.discover_all();
        if records.is_empty() {
            self.reporter.info(&format!(
                "No apps found in {}",
                self.registry.vhosts_dir().display()
            ));
            return;
        }
        self.reporter
            .info(&format!("{} apps found in total", records.len()));

        if !ignore.is_empty() {
            let ignore: HashSet<String> = ignore.iter().cloned().collect();
            records = exclude_by_name(records, &ignore);
            self.reporter
                .info(&format!("{} apps are being ignored", ignore.len()));
        }

        if fresh_only {
            let (with_ssl, without_ssl) = self.registry.partition_by_ssl(records);
            if !with_ssl.is_empty() {
                self.reporter
                    .info(&format!("{} apps already have SSL", with_ssl.len()));
            }
            records = without_ssl;
            if records.is_empty() {
                self.reporter
                    .info("No apps without an SSL certificate were found");
                return;
            }
        }

        for record in &records {
            self.reporter.header(&format!("App {}", record.name()));
            summary.record(record.name(), self.process(record));
        }
    }

    fn secure_named(&self, name: &str, summary: &mut RunSummary) -> SslResult<()> {
        let record = self
            .registry
            .find_by_name(name)
            .ok_or_else(|| SslError::AppNotFound {
                name: name.to_string(),
            })?;
        summary.record(record.name(), self.process(&record));
        Ok(())
    }

    fn secure_explicit(
        &self,
        name: Option<&str>,
        domains: &[String],
        root: &Path,
        summary: &mut RunSummary,
    ) -> SslResult<()> {
        let root_text = root.to_string_lossy();
        let name = match name {
            Some(name) => name,
            None => app_name_from_root(&root_text).ok_or_else(|| {
                SslError::invalid_parameter(
                    "name",
                    format!("cannot derive an app name from {}; pass --name", root_text),
                )
            })?,
        };
        validate_app_name(name)?;

        let record = ApplicationRecord::new(name, root, domains.iter().cloned()).ok_or_else(|| {
            SslError::invalid_parameter("domain", "at least one domain is required")
        })?;
        summary.record(record.name(), self.process(&record));
        Ok(())
    }

    fn renew(&self) -> bool {
        self.reporter.header("Renewing certificates");
        match self.certbot.renew_all() {
            Ok(result) if result.success => {}
            Ok(result) => {
                self.reporter.failure(&format!(
                    "Certificate renewal failed with exit code {:?}",
                    result.exit_code
                ));
                return false;
            }
            Err(e) => {
                self.reporter
                    .failure(&format!("Certificate renewal could not run: {}", e));
                return false;
            }
        }

        match reload_web_server(self.runner, &self.nginx) {
            Ok(()) => {
                self.reporter
                    .success("Expiring certificates renewed and nginx reloaded");
                true
            }
            Err(e) => {
                warn!(error = %e, "Reload after renewal failed");
                self.reporter
                    .failure(&format!("Certificates renewed but nginx reload failed: {}", e));
                false
            }
        }
    }

    fn toggle_job(&self, job: CronJob, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Enable => {
                let existed = self.scheduler.is_enabled(job);
                match self.scheduler.enable(job) {
                    Ok(path) if existed => {
                        self.reporter.success(&format!(
                            "The {} cron job was already installed and has been refreshed ({})",
                            job,
                            path.display()
                        ));
                        true
                    }
                    Ok(path) => {
                        self.reporter.success(&format!(
                            "The {} cron job has been installed ({})",
                            job,
                            path.display()
                        ));
                        true
                    }
                    Err(e) => {
                        self.reporter.failure(&format!(
                            "The {} cron job cannot be installed. Root privileges are required: {}",
                            job, e
                        ));
                        false
                    }
                }
            }
            Toggle::Disable => match self.scheduler.disable(job) {
                Ok(true) => {
                    self.reporter
                        .success(&format!("The {} cron job has been disabled", job));
                    true
                }
                Ok(false) => {
                    self.reporter
                        .info(&format!("The {} cron job is not installed. No action needed", job));
                    true
                }
                Err(e) => {
                    self.reporter
                        .failure(&format!("The {} cron job cannot be removed: {}", job, e));
                    false
                }
            },
        }
    }
}

fn mode_label(mode: &Mode) -> String {
    match mode {
        Mode::Single { name } => name.clone(),
        Mode::Explicit { name, .. } => name.clone().unwrap_or_else(|| "explicit".to_string()),
        Mode::All { .. } => "all".to_string(),
        Mode::Fresh { .. } => "fresh".to_string(),
        Mode::Renew => "renew".to_string(),
        Mode::RenewalCron(_) => "renewal-cron".to_string(),
        Mode::Autopilot(_) => "autopilot".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::{Reply, ScriptedRunner};
    use crate::report::{Level, RecordingReporter};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        settings: Settings,
        app_root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let vhosts = dir.path().join("vhosts.d");
        let cron = dir.path().join("cron.d");
        let app_root = dir.path().join("srv/users/x/apps/shop/public");
        fs::create_dir_all(&vhosts).unwrap();
        fs::create_dir_all(&cron).unwrap();
        fs::create_dir_all(&app_root).unwrap();

        let mut settings = Settings::default();
        settings.paths.vhosts_dir = vhosts;
        settings.schedule.cron_dir = cron;
        Fixture {
            _dir: dir,
            settings,
            app_root,
        }
    }

    fn driver<'a>(
        fx: &Fixture,
        runner: &'a ScriptedRunner,
        reporter: &'a RecordingReporter,
    ) -> Driver<'a> {
        let scheduler =
            CronRegistrar::new(fx.settings.schedule.clone(), "/usr/local/bin/lumo-ssl", None);
        Driver::new(&fx.settings, runner, reporter, scheduler)
    }

    #[test]
    fn test_unknown_app_is_reported() {
        let fx = fixture();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Single {
            name: "ghost".to_string(),
        });

        assert_eq!(summary.failed, ["ghost"]);
        assert!(reporter.messages(Level::Failure)[0].contains("App not found: ghost"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_explicit_derives_name_from_root() {
        let fx = fixture();
        let runner = ScriptedRunner::new()
            .reply("certbot", Reply::ok(""))
            .reply("certbot", Reply::ok("Congratulations!"));
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Explicit {
            name: None,
            domains: vec!["shop.com".to_string()],
            root: fx.app_root.clone(),
        });

        assert_eq!(summary.succeeded, ["shop"]);
        assert!(fx.settings.paths.vhosts_dir.join("shop-ssl.conf").is_file());
    }

    #[test]
    fn test_explicit_without_derivable_name() {
        let fx = fixture();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Explicit {
            name: None,
            domains: vec!["shop.com".to_string()],
            root: PathBuf::from("/var/www/shop"),
        });

        assert!(!summary.is_success());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_renew_reloads_after_success() {
        let fx = fixture();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Renew);

        assert!(summary.is_success());
        assert_eq!(
            runner.calls_to("certbot").last().unwrap(),
            &["certbot", "renew", "--non-interactive"]
        );
        assert_eq!(runner.calls_to("service").len(), 1);
    }

    #[test]
    fn test_failed_renew_skips_reload() {
        let fx = fixture();
        let runner = ScriptedRunner::new()
            .reply("certbot", Reply::ok(""))
            .reply("certbot", Reply::exit(1, "renewal failure"));
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Renew);

        assert_eq!(summary.exit_code(), 1);
        assert!(runner.calls_to("service").is_empty());
    }

    #[test]
    fn test_cron_toggle() {
        let fx = fixture();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);
        let job_file = fx.settings.schedule.cron_dir.join("lumo-ssl-renew");

        assert!(driver.run(&Mode::RenewalCron(Toggle::Enable)).is_success());
        assert!(job_file.is_file());

        assert!(driver.run(&Mode::RenewalCron(Toggle::Disable)).is_success());
        assert!(!job_file.exists());

        assert!(driver.run(&Mode::Autopilot(Toggle::Disable)).is_success());
        assert_eq!(
            reporter.messages(Level::Info).last().unwrap(),
            "The autopilot cron job is not installed. No action needed"
        );
    }

    #[test]
    fn test_missing_vhosts_dir_is_informational() {
        let mut fx = fixture();
        fx.settings.paths.vhosts_dir = fx.settings.paths.vhosts_dir.join("absent");
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::All { ignore: Vec::new() });

        assert_eq!(summary.exit_code(), 0);
        assert!(reporter.messages(Level::Info)[0].starts_with("No apps found in "));
        assert!(reporter.messages(Level::Warning).is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_explicit_rejects_unsafe_derived_name() {
        let fx = fixture();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        let summary = driver.run(&Mode::Explicit {
            name: None,
            domains: vec!["shop.com".to_string()],
            root: PathBuf::from("/x/apps/../public"),
        });

        assert_eq!(summary.exit_code(), 1);
        assert!(runner.calls().is_empty());
        assert!(!fx.settings.paths.vhosts_dir.join("..-ssl.conf").exists());
    }

    #[test]
    fn test_broken_template_only_blocks_vhost_modes() {
        let mut fx = fixture();
        fx.settings.nginx.template = Some(PathBuf::from("/nonexistent/ssl-vhost.conf.tera"));
        fs::write(
            fx.settings.paths.vhosts_dir.join("shop.conf"),
            format!(
                "server {{\n    server_name shop.com;\n    root {};\n}}\n",
                fx.app_root.display()
            ),
        )
        .unwrap();
        let runner = ScriptedRunner::new();
        let reporter = RecordingReporter::new();
        let driver = driver(&fx, &runner, &reporter);

        assert!(driver.run(&Mode::Renew).is_success());
        assert!(driver.run(&Mode::RenewalCron(Toggle::Enable)).is_success());

        let summary = driver.run(&Mode::Single {
            name: "shop".to_string(),
        });
        assert_eq!(summary.failed, ["shop"]);
        assert!(runner
            .calls_to("certbot")
            .iter()
            .all(|argv| !argv.iter().any(|a| a == "certonly")));
    }
}
