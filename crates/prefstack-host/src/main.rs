//! prefstack command-line entry point.
//!
//! Opens both configuration backends, runs the startup migration, publishes
//! the process-wide configuration and then executes one command against it.
//!
//! # Usage
//!
//! ```text
//! prefstack [OPTIONS] <COMMAND>
//!
//! Commands:
//!   load    Run the startup migration and print its report
//!   get     Print the value of one key
//!   set     Write one key
//!   list    Print every key, its owning backend and its value
//!   export  Prepare the preference file for a future install and print its path
//!
//! Options:
//!   --config <FILE>      Host configuration file [default: platform config dir]
//!   --data-dir <DIR>     Directory holding per-package data directories
//!   --package <ID>       Application identifier
//!   --variant <VARIANT>  release | canary | debug
//!   --device-secure      Treat the device as having a secure lock screen
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                  | Flag              |
//! |---------------------------|-------------------|
//! | `PREFSTACK_CONFIG`        | `--config`        |
//! | `PREFSTACK_DATA_DIR`      | `--data-dir`      |
//! | `PREFSTACK_PACKAGE`       | `--package`       |
//! | `PREFSTACK_VARIANT`       | `--variant`       |
//! | `PREFSTACK_DEVICE_SECURE` | `--device-secure` |
//!
//! Flags take precedence over the configuration file.  `RUST_LOG` takes
//! precedence over the file's `log_level`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use prefstack_core::{BuildVariant, Key};
use prefstack_host::application::config::{Config, Environment};
use prefstack_host::application::global;
use prefstack_host::application::migration::LoadReport;
use prefstack_host::infrastructure::content_source::DirectoryContentSource;
use prefstack_host::infrastructure::storage::config::{config_file_path, load_config, HostConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Typed configuration over a preference file and a settings database.
#[derive(Debug, Parser)]
#[command(name = "prefstack", version)]
struct Cli {
    /// Host configuration file.
    #[arg(long, env = "PREFSTACK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding one data directory per package.
    #[arg(long, env = "PREFSTACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Application identifier.
    #[arg(long, env = "PREFSTACK_PACKAGE")]
    package: Option<String>,

    /// Build flavour; decides the default update channel.
    #[arg(long, env = "PREFSTACK_VARIANT")]
    variant: Option<BuildVariant>,

    /// Treat the device as having a secure lock screen.
    #[arg(long, env = "PREFSTACK_DEVICE_SECURE")]
    device_secure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the startup migration and print its report.
    Load {
        /// Package identifier of a previous installation to import from.
        #[arg(long)]
        previous_package: Option<String>,

        /// Directory holding the previous installation's data directory.
        /// Defaults to the data directory root.
        #[arg(long)]
        import_root: Option<PathBuf>,
    },
    /// Print the value of one key.
    Get { key: Key },
    /// Write one key.
    Set { key: Key, value: String },
    /// Print every key, its owning backend and its value.
    List,
    /// Prepare the preference file for a future install and print its path.
    Export,
}

impl Cli {
    /// Loads the host configuration file and applies flag overrides.
    fn host_config(&self) -> anyhow::Result<HostConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config_file_path().context("locating host configuration")?,
        };
        let mut host = load_config(&path)
            .with_context(|| format!("loading host configuration from {}", path.display()))?;
        if let Some(dir) = &self.data_dir {
            host.data_root = Some(dir.clone());
        }
        if let Some(package) = &self.package {
            host.package = package.clone();
        }
        if let Some(variant) = self.variant {
            host.build_variant = variant;
        }
        Ok(host)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let host = cli.host_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&host.log_level)),
        )
        .init();

    let secure = cli.device_secure;
    let env = Environment::new(host.build_variant).with_device_secure(move || secure);
    let config = Config::open(&host, env).context("opening configuration backends")?;

    let (previous, import_root) = match &cli.command {
        Command::Load {
            previous_package,
            import_root,
        } => (previous_package.as_deref(), import_root.clone()),
        _ => (None, None),
    };
    let import_root = match import_root {
        Some(root) => root,
        None => host.data_root().context("resolving data directory root")?,
    };
    let source = DirectoryContentSource::new(import_root);

    let report = global::install(config, previous, &source).context("loading configuration")?;
    info!(package = %host.package, variant = ?host.build_variant, "configuration ready");

    let cfg = global::config()?;
    match cli.command {
        Command::Load { .. } => print_report(&report),
        Command::Get { key } => {
            let value = cfg.read(key).with_context(|| format!("reading {key}"))?;
            println!("{value}");
        }
        Command::Set { key, value } => {
            cfg.write(key, &value)
                .with_context(|| format!("writing {key}"))?;
            println!("{key} = {}", cfg.read(key)?);
        }
        Command::List => {
            for key in Key::ALL {
                let value = cfg.read(key).with_context(|| format!("reading {key}"))?;
                println!("{:<8} {:<22} {value}", key.backend().to_string(), key.as_str());
            }
        }
        Command::Export => {
            let path = cfg.export_prefs_file().context("exporting preference file")?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!("import: {:?}", report.import);
    match &report.migration {
        Some(migration) => {
            println!("legacy biometric: {:?}", migration.legacy_biometric);
            println!("update channel: {:?}", migration.channel);
        }
        None => println!("migration: not run"),
    }
}
