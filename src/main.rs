//! # kload CLI Entry Point
//!
//! Runs the bootstrap against a standalone host (a data folder with a
//! `config.toml` and a classpath) and offers cache maintenance commands.
//!
//! ## Command Structure
//!
//! - **Bootstrap**: `run`, `init`, `info`
//! - **Cache**: `cache path`, `cache ls`, `cache clean`, `cache prune`
//! - **Shell**: `completion`

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kload::bootstrap::{Bootstrap, BootstrapReport, Host, LIBRARIES_DIR};
use kload::cache;
use kload::catalog::LIBRARIES;
use kload::config::{REPOSITORY_KEY, Settings, TomlConfig};
use kload::fetch::CacheMode;
use kload::host::StandaloneHost;
use kload::link::ClassPath;
use kload::ui;

#[derive(Parser)]
#[command(name = "kload")]
#[command(about = "Fetch pinned runtime libraries and link them into a live classpath", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data folder holding config.toml and the libraries cache
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, fetch and link every library
    Run {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// After linking, report which archive provides CLASS
        #[arg(long, value_name = "CLASS")]
        resolve: Vec<String>,
        /// After linking, report which shared library exports SYMBOL
        #[arg(long, value_name = "SYMBOL")]
        symbol: Vec<String>,
        /// Do not draw download progress
        #[arg(short, long)]
        quiet: bool,
    },
    /// Write a default config.toml into the data folder
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
    /// Show loader version, configured libraries and cache state
    Info,
    /// Manage the artifact cache
    Cache {
        #[command(subcommand)]
        op: CacheOp,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

#[derive(Subcommand)]
enum CacheOp {
    /// Remove every cached artifact
    Clean,
    /// List cached artifacts
    Ls,
    /// Print cache directory path
    Path,
    /// Remove artifacts the current config does not use
    Prune,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(StandaloneHost::default_data_folder);

    match &cli.command {
        Some(Commands::Run {
            json,
            resolve,
            symbol,
            quiet,
        }) => run(&data_dir, *json, resolve, symbol, *quiet),
        Some(Commands::Init { force }) => init(&data_dir, *force),
        Some(Commands::Info) => print_info(&data_dir),
        Some(Commands::Cache { op }) => {
            let folder = data_dir.join(LIBRARIES_DIR);
            match op {
                CacheOp::Clean => clean_cache(&folder),
                CacheOp::Ls => list_cache(&folder),
                CacheOp::Path => {
                    println!("{}", folder.display());
                    Ok(())
                }
                CacheOp::Prune => prune_cache(&data_dir, &folder),
            }
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("kload=info"),
        1 => EnvFilter::new("kload=debug"),
        _ => EnvFilter::new("kload=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn open_host(data_dir: &Path) -> Result<StandaloneHost> {
    StandaloneHost::open(data_dir)
        .with_context(|| format!("Failed to load configuration from {}", data_dir.display()))
}

fn run(
    data_dir: &Path,
    json: bool,
    resolve: &[String],
    symbols: &[String],
    quiet: bool,
) -> Result<()> {
    let host = open_host(data_dir)?;
    if !json && !host.config_path().exists() {
        println!(
            "{} No config at {}. Run {} first.",
            "!".yellow(),
            host.config_path().display(),
            "kload init".bold()
        );
    }

    let report = Bootstrap::new()
        .with_progress(!quiet && !json)
        .run(&host);

    let lookups: Vec<(&String, Option<PathBuf>)> = resolve
        .iter()
        .map(|class| (class, find_class(host.class_path(), class)))
        .chain(
            symbols
                .iter()
                .map(|symbol| (symbol, host.native_libraries().find_symbol(symbol))),
        )
        .collect();

    if json {
        let resolved: serde_json::Map<String, serde_json::Value> = lookups
            .iter()
            .map(|(name, found)| {
                let found = found
                    .as_ref()
                    .map(|p| serde_json::Value::String(p.display().to_string()))
                    .unwrap_or(serde_json::Value::Null);
                (name.to_string(), found)
            })
            .collect();
        let out = serde_json::json!({
            "cache": report.cache_folder.display().to_string(),
            "libraries": report.rows(),
            "resolved": resolved,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_report(&report);

    for (name, found) in &lookups {
        match found {
            Some(path) => println!("   {} {} -> {}", "✓".green(), name.bold(), path.display()),
            None => println!("   {} {} not found", "x".red(), name.bold()),
        }
    }
    Ok(())
}

fn find_class(class_path: &ClassPath, class: &str) -> Option<PathBuf> {
    class_path.find_resource(&ClassPath::class_resource_name(class))
}

fn print_report(report: &BootstrapReport) {
    let mut table = ui::Table::new(&["Library", "Artifact", "Status", "Detail"]);
    for entry in &report.entries {
        let status = if entry.outcome.is_ok() {
            entry.outcome.label().green().to_string()
        } else {
            entry.outcome.label().red().to_string()
        };
        let detail = entry
            .outcome
            .error_message()
            .or_else(|| {
                entry
                    .outcome
                    .path()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
            })
            .unwrap_or_default();
        table.add_row(vec![
            entry.library.bold().to_string(),
            entry.dependency.to_string(),
            status,
            detail,
        ]);
    }
    table.print();

    let linked = report.linked().count();
    let failed = report.failures().count();
    if failed == 0 {
        println!("{} {} libraries linked.", "✓".green(), linked);
    } else {
        println!(
            "{} {} linked, {} failed. The host keeps running without them.",
            "!".yellow(),
            linked,
            failed
        );
    }
}

fn list_cache(folder: &Path) -> Result<()> {
    let artifacts = cache::scan(folder)?;
    if artifacts.is_empty() {
        println!("{} Cache is empty.", "ℹ".blue());
        return Ok(());
    }

    let mut table = ui::Table::new(&["Artifact", "Size", "SHA-256", "State"]);
    let mut empty = 0;
    for artifact in &artifacts {
        let state = if artifact.is_empty() {
            empty += 1;
            "empty".red().to_string()
        } else {
            "ok".green().to_string()
        };
        table.add_row(vec![
            artifact.name.clone(),
            ui::human_bytes(artifact.size),
            artifact.digest().unwrap_or_else(|_| "?".to_string()),
            state,
        ]);
    }
    table.print();

    if empty > 0 {
        println!(
            "{} {} empty file(s) will be treated as cached. Run {} to remove them.",
            "!".yellow(),
            empty,
            "kload cache clean".bold()
        );
    }
    Ok(())
}

fn clean_cache(folder: &Path) -> Result<()> {
    if cache::clean(folder)? {
        println!("{} Cache cleaned: {}", "🧹".yellow(), folder.display());
    } else {
        println!("{} Cache already empty.", "✓".green());
    }
    Ok(())
}

fn prune_cache(data_dir: &Path, folder: &Path) -> Result<()> {
    let host = open_host(data_dir)?;
    let keep = cache::expected_files(host.config());
    let removed = cache::prune_unused(folder, &keep)?;

    for name in &removed {
        println!("   {} Removed unused: {}", "🗑️".red(), name);
    }
    if removed.is_empty() {
        println!("{} All cached artifacts are in use.", "✓".green());
    } else {
        println!("{} Removed {} unused artifact(s).", "✓".green(), removed.len());
    }
    Ok(())
}

fn init(data_dir: &Path, force: bool) -> Result<()> {
    let path = data_dir.join(kload::config::CONFIG_FILE);
    if TomlConfig::write_default(&path, force)? {
        println!("{} Wrote {}", "✓".green(), path.display());
    } else {
        println!(
            "{} {} already exists. Use {} to overwrite.",
            "!".yellow(),
            path.display(),
            "--force".bold()
        );
    }
    Ok(())
}

fn print_info(data_dir: &Path) -> Result<()> {
    let host = open_host(data_dir)?;
    let config = host.config();
    let settings = Settings::from_config(config);

    println!("{} {}", "kload".cyan().bold(), "─".repeat(40).dimmed());
    println!("    {}: {}", "Loader".dimmed(), env!("CARGO_PKG_VERSION").cyan());
    println!("    {}: {}", "Data".dimmed(), data_dir.display());
    println!(
        "    {}: {}",
        "Repository".dimmed(),
        if settings.repository.is_empty() {
            "(not set)".red().to_string()
        } else {
            settings.repository.cyan().to_string()
        }
    );
    let mode = match settings.cache_mode {
        CacheMode::Atomic => "atomic",
        CacheMode::Placeholder => "placeholder",
    };
    println!("    {}: {}", "Downloads".dimmed(), mode);
    let context = if host.is_native() {
        "shared libraries"
    } else {
        "classpath"
    };
    println!("    {}: {} ({})", "Context".dimmed(), context, settings.packaging);
    println!();

    let cached = cache::scan(&host.cache_folder())?;
    let mut table = ui::Table::new(&["Library", "Artifact", "Version", "Cached"]);
    for lib in LIBRARIES {
        let dependency = lib.to_dependency(config);
        let file_name = dependency.file_name(&settings.packaging);
        let state = match cached.iter().find(|a| a.name == file_name) {
            Some(a) if a.is_empty() => "empty".red().to_string(),
            Some(a) => ui::human_bytes(a.size).green().to_string(),
            None => "no".dimmed().to_string(),
        };
        let version = if dependency.version.is_empty() {
            "(not set)".red().to_string()
        } else {
            dependency.version.clone()
        };
        table.add_row(vec![
            lib.name.bold().to_string(),
            format!("{}:{}", lib.group_id, lib.artifact_id),
            version,
            state,
        ]);
    }
    table.print();

    let missing = Settings::missing_keys(config);
    if !missing.is_empty() {
        println!();
        for err in &missing {
            println!("{} {}", "!".yellow(), err);
        }
        if missing.iter().any(|e| e.to_string().contains(REPOSITORY_KEY)) {
            println!("   Run {} to write a default config.", "kload init".bold());
        }
    }
    Ok(())
}
