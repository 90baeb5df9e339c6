//! Cron job files for unattended renewal and autopilot runs.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ScheduleConfig;
use crate::error::SslError;
use crate::files::{remove_if_exists, write_atomic};

/// Permissions cron requires of files in its drop-in directory.
const CRON_FILE_MODE: u32 = 0o644;

/// A periodic job the tool can register with cron.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronJob {
    /// Renew every certificate that is close to expiry.
    Renewal,
    /// Secure every app that has no SSL vhost yet.
    Autopilot,
}

impl CronJob {
    /// The command-line flag the scheduled run is invoked with.
    pub fn flag(&self) -> &'static str {
        match self {
            CronJob::Renewal => "--renew",
            CronJob::Autopilot => "--fresh",
        }
    }
}

impl fmt::Display for CronJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CronJob::Renewal => write!(f, "renewal"),
            CronJob::Autopilot => write!(f, "autopilot"),
        }
    }
}

/// Writes and removes the job files under the cron drop-in directory.
pub struct CronRegistrar {
    config: ScheduleConfig,
    exe: PathBuf,
    config_path: Option<PathBuf>,
}

impl CronRegistrar {
    /// `exe` is the binary cron will run. `config_path` is passed through
    /// with `--config` when set.
    pub fn new(
        config: ScheduleConfig,
        exe: impl Into<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            exe: exe.into(),
            config_path,
        }
    }

    /// Location of the job file.
    pub fn path(&self, job: CronJob) -> PathBuf {
        let file = match job {
            CronJob::Renewal => &self.config.renewal_file,
            CronJob::Autopilot => &self.config.autopilot_file,
        };
        self.config.cron_dir.join(file)
    }

    /// The crontab line for `job`, run as root with output discarded.
    pub fn line(&self, job: CronJob) -> String {
        let schedule = match job {
            CronJob::Renewal => &self.config.renewal_schedule,
            CronJob::Autopilot => &self.config.autopilot_schedule,
        };

        let mut command = quote(&self.exe);
        if let Some(config_path) = &self.config_path {
            command.push_str(" --config ");
            command.push_str(&quote(config_path));
        }

        format!(
            "{} root {} {} >/dev/null 2>&1",
            schedule,
            command,
            job.flag()
        )
    }

    /// Install the job file, replacing any previous one.
    pub fn enable(&self, job: CronJob) -> Result<PathBuf, SslError> {
        let path = self.path(job);
        let content = format!(
            "# {} job managed by lumo-ssl\nSHELL=/bin/sh\nPATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin\n{}\n",
            job,
            self.line(job)
        );

        write_atomic(&path, &content, CRON_FILE_MODE)?;
        info!(job = %job, path = %path.display(), "Cron job enabled");
        Ok(path)
    }

    /// Remove the job file. Returns false if it was not installed.
    pub fn disable(&self, job: CronJob) -> Result<bool, SslError> {
        let path = self.path(job);
        let removed = remove_if_exists(&path)?;
        info!(job = %job, path = %path.display(), removed, "Cron job disabled");
        Ok(removed)
    }

    /// Whether the job file is present.
    pub fn is_enabled(&self, job: CronJob) -> bool {
        self.path(job).is_file()
    }
}

/// Single-quote a path for the cron shell when it needs it.
fn quote(path: &Path) -> String {
    let text = path.to_string_lossy();
    let plain = text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'));
    if plain {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn registrar(cron_dir: &Path, config_path: Option<PathBuf>) -> CronRegistrar {
        let config = ScheduleConfig {
            cron_dir: cron_dir.to_path_buf(),
            ..ScheduleConfig::default()
        };
        CronRegistrar::new(config, "/usr/local/bin/lumo-ssl", config_path)
    }

    #[test]
    fn test_lines() {
        let registrar = registrar(Path::new("/etc/cron.d"), None);
        assert_eq!(
            registrar.line(CronJob::Renewal),
            "0 */12 * * * root /usr/local/bin/lumo-ssl --renew >/dev/null 2>&1"
        );
        assert_eq!(
            registrar.line(CronJob::Autopilot),
            "*/10 * * * * root /usr/local/bin/lumo-ssl --fresh >/dev/null 2>&1"
        );
    }

    #[test]
    fn test_line_passes_config_path() {
        let config_path = Some(PathBuf::from("/opt/my conf.toml"));
        let registrar = registrar(Path::new("/etc/cron.d"), config_path);
        assert_eq!(
            registrar.line(CronJob::Renewal),
            "0 */12 * * * root /usr/local/bin/lumo-ssl --config '/opt/my conf.toml' --renew >/dev/null 2>&1"
        );
    }

    #[test]
    fn test_enable_and_disable() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar(dir.path(), None);

        let path = registrar.enable(CronJob::Autopilot).unwrap();
        assert_eq!(path, dir.path().join("lumo-ssl-autopilot"));
        assert!(registrar.is_enabled(CronJob::Autopilot));
        assert!(!registrar.is_enabled(CronJob::Renewal));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("--fresh >/dev/null 2>&1\n"));
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        assert!(registrar.disable(CronJob::Autopilot).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_enable_twice_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar(dir.path(), None);

        registrar.enable(CronJob::Renewal).unwrap();
        registrar.enable(CronJob::Renewal).unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_disable_missing_job() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = registrar(dir.path(), None);
        assert!(!registrar.disable(CronJob::Renewal).unwrap());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(Path::new("/usr/bin/x")), "/usr/bin/x");
        assert_eq!(quote(Path::new("/a b/it's")), r"'/a b/it'\''s'");
    }
}
