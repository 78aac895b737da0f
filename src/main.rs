//! varnish-agent - Varnish agent settings tool
//!
//! Resolves the agent's discovery settings and stores generated VCL files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tracing::{debug, info};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use varnish_agent::{
    config::{ConfigManager, DEFAULT_LOG_LEVEL},
    ArtifactRegistry, Settings, VclWriter,
};

/// CLI arguments for varnish-agent
#[derive(Parser, Debug)]
#[command(name = "varnish-agent")]
#[command(about = "Varnish agent settings and VCL file tracking")]
#[command(version)]
#[command(long_about = "
Varnish agent settings and VCL file tracking

Configuration priority (highest to lowest):
1. Command-line arguments
2. Environment variables
3. Configuration file
4. Built-in defaults

Environment variables:
  CONSUL       - Consul base URL (default http://localhost:8500)
  SERVICE_TAG  - Backend service tag (default http-backend)
  VCL_DIR      - Directory for generated VCL files (default vcl)
  LOG_LEVEL    - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "varnish-agent.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Consul address (overrides environment and config file)
    #[arg(long, help = "Consul base URL (e.g., http://localhost:8500)")]
    pub consul: Option<String>,

    /// Service tag (overrides environment and config file)
    #[arg(long, help = "Backend service tag")]
    pub service_tag: Option<String>,

    /// Directory for generated VCL files
    #[arg(long, help = "Directory for generated VCL files")]
    pub vcl_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,

    /// Print a single setting and exit
    #[arg(long, value_name = "KEY", help = "Print a setting (consul, serviceTag, vcl.dir, log.level)")]
    pub get: Option<String>,

    /// Print the resolved settings as JSON and exit
    #[arg(long, help = "Print resolved settings as JSON")]
    pub dump: bool,

    /// VCL files to store and register, in order
    #[arg(long = "vcl", value_name = "FILE", help = "Store a VCL file (repeatable)")]
    pub vcl_files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (directive, follows_settings) = startup_filter(&args, rust_log.as_deref());
    let filter_handle = init_tracing(&directive)?;

    let settings = resolve_settings(&args)?;

    if follows_settings && settings.log.level != directive {
        filter_handle
            .reload(EnvFilter::new(&settings.log.level))
            .context("Failed to apply configured log level")?;
    }

    debug!("Resolved settings: {:?}", settings);

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Consul: {}", settings.consul);
        info!("  Service tag: {}", settings.service_tag);
        info!("  VCL dir: {}", settings.vcl.dir.display());
        return Ok(());
    }

    if let Some(key) = &args.get {
        match settings.get(key) {
            Some(value) => {
                println!("{}", value);
                return Ok(());
            }
            None => bail!("Unknown setting: {}", key),
        }
    }

    if args.dump {
        let json = serde_json::to_string_pretty(&settings).context("Failed to serialize settings")?;
        println!("{}", json);
        return Ok(());
    }

    if !args.vcl_files.is_empty() {
        let mut registry = ArtifactRegistry::new();
        let mut writer = VclWriter::new(&settings.vcl.dir);

        for file in &args.vcl_files {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read VCL source: {}", file.display()))?;
            writer.write(&mut registry, &content)?;
        }

        info!("Registered {} VCL file(s)", registry.len());
        if let Some(latest) = registry.latest() {
            println!("{}", latest);
        }
        return Ok(());
    }

    println!("consul={}", settings.consul);
    println!("serviceTag={}", settings.service_tag);
    Ok(())
}

/// Build settings: defaults < file < environment < CLI
fn resolve_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = ConfigManager::load_from_file(&args.config)?;
    settings.merge_env(|name| std::env::var(name).ok());
    settings.merge_with_cli_args(
        args.consul.as_deref(),
        args.service_tag.as_deref(),
        args.vcl_dir.as_deref(),
        args.log_level.as_deref(),
    );

    settings
        .validate()
        .context("Final configuration validation failed")?;

    Ok(settings)
}

/// Filter directive to start logging with, and whether the configured
/// `log.level` may replace it once settings are loaded.
///
/// `RUST_LOG`, `--verbose` and `--log-level` are known before any settings
/// file is read and always win.
fn startup_filter(args: &CliArgs, rust_log: Option<&str>) -> (String, bool) {
    if let Some(rust_log) = rust_log.filter(|v| !v.is_empty()) {
        return (rust_log.to_string(), false);
    }

    if args.verbose {
        return ("debug".to_string(), false);
    }

    match &args.log_level {
        Some(level) => (level.clone(), false),
        None => (DEFAULT_LOG_LEVEL.to_string(), true),
    }
}

/// Initialize tracing/logging
fn init_tracing(directive: &str) -> Result<reload::Handle<EnvFilter, Registry>> {
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(handle)
}
