//! stagehand CLI - component lifecycle orchestrator
//!
//! Every invocation builds a platform for the project, runs the startup
//! reconciliation pass and then performs at most one lifecycle command.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`STAGEHAND_*`)
//! 3. Project config (`.stagehand/config.toml` under the project root)
//! 4. Global config (`$STAGEHAND_HOME/config.toml`, default `~/.stagehand/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `STAGEHAND_HOME`: Global config directory
//! - `STAGEHAND_DEBUG`: Enable debug mode (`true`/`false`)
//! - `STAGEHAND_NAMESPACE`: State key namespace
//! - `STAGEHAND_EXPORT_ENV`: Export settings to the process environment
//! - `STAGEHAND_OVERLAY`: Overwrite existing resources
//! - `STAGEHAND_WEBROOT`: Resource destination root
//! - `STAGEHAND_SETTINGS`: Settings store file

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use stagehand_runtime::config::{ConfigLoader, ConfigResolver, StageConfig};
use stagehand_runtime::{OperationReport, Outcome, Platform, RefreshReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// stagehand - component lifecycle orchestrator
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Directory scanned for origins, relative to the current directory
    /// (repeatable; replaces configured roots)
    #[arg(long = "origin", value_name = "DIR", global = true)]
    origins: Vec<PathBuf>,

    /// Resource destination root, relative to the current directory
    /// (also: STAGEHAND_WEBROOT)
    #[arg(long, value_name = "DIR", global = true)]
    webroot: Option<PathBuf>,

    /// Settings store file, relative to the current directory
    /// (also: STAGEHAND_SETTINGS)
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    /// Keep existing resource files instead of overwriting them
    #[arg(long, global = true)]
    no_overlay: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the startup pass and print what happened (default)
    Start,
    /// List registered components
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Activate a component
    Activate { code: String },
    /// Disable a component
    Disable { code: String },
    /// Deploy a registered component again
    Deploy { code: String },
    /// Remove a component
    Remove { code: String },
    /// Print the settings store
    Settings,
}

/// CLI-based configuration resolver.
///
/// Applies CLI argument overrides on top of the file/env layers. Path
/// flags are taken relative to the invocation directory, not the project
/// root; only paths from config files and the environment follow `-C`.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    origins: Vec<PathBuf>,
    webroot: Option<PathBuf>,
    settings: Option<PathBuf>,
    no_overlay: bool,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to get current directory, using '.'");
            PathBuf::from(".")
        });
        let absolute = |p: &PathBuf| cwd.join(p);

        Self {
            project_root: args.project.as_ref().map_or_else(|| cwd.clone(), absolute),
            debug: args.debug,
            origins: args.origins.iter().map(absolute).collect(),
            webroot: args.webroot.as_ref().map(absolute),
            settings: args.settings.as_ref().map(absolute),
            no_overlay: args.no_overlay,
        }
    }

    fn resolve(&self) -> Result<StageConfig> {
        let mut config = ConfigLoader::new()
            .with_project_root(&self.project_root)
            .load()
            .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
        self.apply(&mut config);
        Ok(config.resolved(&self.project_root))
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut StageConfig) {
        if self.debug {
            config.debug = true;
        }
        if !self.origins.is_empty() {
            config.paths.origins.clone_from(&self.origins);
        }
        if let Some(ref p) = self.webroot {
            config.paths.webroot = p.clone();
        }
        if let Some(ref p) = self.settings {
            config.paths.settings_file = p.clone();
        }
        if self.no_overlay {
            config.resources.overlay = false;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver.resolve()?;

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
    // Logs go to stderr so stdout stays parseable.
    let filter = if args.debug || config.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    info!(path = %resolver.project_root.display(), "Project root");

    let mut platform = Platform::builder(config).build();
    let startup = platform.start().unwrap_or_default();

    match args.command.unwrap_or(Command::Start) {
        Command::Start => {
            print_startup(&startup);
            if !startup.is_success() {
                bail!("startup finished with {} failure(s)", startup.all_errors().count());
            }
        }
        Command::List { json } => {
            warn_startup(&startup);
            if json {
                println!("{}", serde_json::to_string_pretty(&platform.snapshot())?);
            } else {
                print_components(&platform);
            }
        }
        Command::Activate { code } => {
            warn_startup(&startup);
            finish(platform.activate(&code))?;
        }
        Command::Disable { code } => {
            warn_startup(&startup);
            finish(platform.disable(&code))?;
        }
        Command::Deploy { code } => {
            warn_startup(&startup);
            finish(platform.redeploy(&code))?;
        }
        Command::Remove { code } => {
            warn_startup(&startup);
            finish(platform.remove(&code))?;
        }
        Command::Settings => {
            warn_startup(&startup);
            for (k, v) in platform.settings().iter() {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}

fn print_startup(report: &RefreshReport) {
    for code in &report.registered {
        println!("registered {code}");
    }
    for (code, state) in &report.restored {
        println!("restored {code}: {state}");
    }
    for op in &report.operations {
        println!("{op}");
    }
    for code in &report.started {
        println!("started {code}");
    }
    for e in &report.errors {
        eprintln!("error: {e}");
    }
}

fn warn_startup(report: &RefreshReport) {
    for e in report.all_errors() {
        eprintln!("warning: {e}");
    }
}

fn print_components(platform: &Platform) {
    if platform.is_empty() {
        println!("no components");
        return;
    }
    println!("{:<16} {:<10} {:<8} ORIGIN", "CODE", "VERSION", "STATE");
    for c in platform.components() {
        let origin = c
            .origin
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!(
            "{:<16} {:<10} {:<8} {origin}",
            c.code,
            c.version,
            c.state.as_persisted()
        );
    }
}

fn finish(report: OperationReport) -> Result<()> {
    println!("{report}");
    match report.outcome {
        Outcome::UnknownComponent => bail!("unknown component: {}", report.code),
        Outcome::Aborted => bail!("{} {} aborted", report.operation, report.code),
        Outcome::Completed if !report.errors.is_empty() => {
            bail!("{} {} completed with failures", report.operation, report.code)
        }
        Outcome::Completed => Ok(()),
    }
}
