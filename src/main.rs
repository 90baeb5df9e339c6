//! lumo-ssl - Let's Encrypt certificates and HTTPS vhosts for panel-hosted apps.

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lumo_ssl::cli::Cli;
use lumo_ssl::config::Settings;
use lumo_ssl::driver::Driver;
use lumo_ssl::executor::SystemRunner;
use lumo_ssl::report::{ConsoleReporter, Reporter};
use lumo_ssl::schedule::CronRegistrar;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// Exit status when no mode flag was given.
const USAGE_EXIT: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
    let reporter = ConsoleReporter::new();

    let mode = match cli.mode() {
        Ok(Some(mode)) => mode,
        Ok(None) => {
            // Printing help only fails on a closed stdout.
            let _ = Cli::command().print_help();
            return ExitCode::from(USAGE_EXIT);
        }
        Err(e) => {
            reporter.failure(&e.to_string());
            return ExitCode::from(USAGE_EXIT);
        }
    };

    let settings = match Settings::resolve(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            reporter.failure(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings, cli.verbose);
    debug!("Starting {} v{}", NAME, VERSION);

    if !nix::unistd::geteuid().is_root() {
        warn!(euid = %nix::unistd::geteuid(), "Not running as root");
        reporter.warning("Not running as root. Most operations require root privileges");
    }

    let exe = match env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "Cannot resolve own executable, using program name for cron jobs");
            NAME.into()
        }
    };
    let scheduler = CronRegistrar::new(settings.schedule.clone(), exe, cli.config.clone());

    let runner = SystemRunner;
    let driver = Driver::new(&settings, &runner, &reporter, scheduler);
    let summary = driver.run(&mode);
    ExitCode::from(summary.exit_code())
}

/// Initialize logging based on settings. `RUST_LOG` overrides the configured
/// level, and `--verbose` forces debug.
fn init_logging(settings: &Settings, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level))
    };

    let layer = fmt::layer().with_writer(std::io::stderr);
    match settings.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .init(),
        "compact" => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact())
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.pretty())
            .init(),
    }
}
