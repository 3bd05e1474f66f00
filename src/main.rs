mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use dep_inspector::config::{self, InspectorConfig};
use dep_inspector::inspect::{Inspector, build_report, create_default_resolvers};
use dep_inspector::parser::{Ecosystem, parse_manifest};
use dep_inspector::vcs::GithubResolver;
use dep_inspector::version::cache::{Cache, ResultStore};

use crate::logging::{LogTarget, init_logging};

#[derive(Parser)]
#[command(name = "dep-inspector")]
#[command(version, about = "Resolve license and dependency metadata across package ecosystems")]
struct Cli {
    /// Write human-readable logs to stderr instead of the log file
    #[arg(long, global = true)]
    stderr_log: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packages given as `name`, `name;version` or `name|constraint`
    Inspect {
        #[arg(long, value_parser = parse_ecosystem)]
        lang: Ecosystem,
        /// Dependency levels to descend; unbounded when omitted
        #[arg(long)]
        depth: Option<usize>,
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Parse a manifest file and optionally resolve its dependencies
    Manifest {
        #[arg(long, value_parser = parse_ecosystem)]
        lang: Ecosystem,
        /// Dependency levels to resolve below the manifest
        #[arg(long, default_value_t = 0)]
        depth: usize,
        file: PathBuf,
    },
    /// Manage the local result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove expired entries
    Purge,
}

fn parse_ecosystem(value: &str) -> Result<Ecosystem, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = Ecosystem::ALL.iter().map(Ecosystem::as_str).collect();
        format!("unknown ecosystem '{}', expected one of: {}", value, known.join(", "))
    })
}

fn load_config(path: Option<&Path>) -> anyhow::Result<InspectorConfig> {
    match path {
        Some(path) => Ok(InspectorConfig::from_file(path)?),
        None => Ok(InspectorConfig::default()),
    }
}

fn open_cache(config: &InspectorConfig) -> anyhow::Result<Cache> {
    let db_path = config::db_path();
    Cache::new(&db_path, config.cache.ttl_secs)
        .with_context(|| format!("Failed to open cache at {}", db_path.display()))
}

fn build_inspector(config: &Arc<InspectorConfig>) -> anyhow::Result<Inspector> {
    Ok(Inspector::new(
        create_default_resolvers(config),
        Arc::new(open_cache(config)?),
        Arc::new(GithubResolver::new(config)),
        config.walker.clone(),
    ))
}

async fn run(command: Command, config: Arc<InspectorConfig>) -> anyhow::Result<()> {
    match command {
        Command::Inspect {
            lang,
            depth,
            packages,
        } => {
            let inspector = build_inspector(&config)?;
            let results = inspector.inspect_batch(lang, &packages, depth).await?;
            println!("{}", serde_json::to_string_pretty(&build_report(&results))?);
        }
        Command::Manifest { lang, depth, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let declared = parse_manifest(&file.to_string_lossy(), &content)?;
            let inspector = build_inspector(&config)?;
            let results = inspector
                .inspect_manifest(lang, declared, Some(depth))
                .await?;
            println!("{}", serde_json::to_string_pretty(&build_report(&results))?);
        }
        Command::Cache {
            action: CacheAction::Purge,
        } => {
            let removed = open_cache(&config)?.purge_expired()?;
            println!("Removed {} expired entries", removed);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let target = if cli.stderr_log {
        LogTarget::Stderr
    } else {
        LogTarget::File
    };
    let _guard = init_logging(target)?;

    let config = Arc::new(load_config(cli.config.as_deref())?);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}
