//! LKMC path properties CLI
//!
//! Entry point for the `lkmc-pathprops` command-line tool.

use clap::{Parser, Subcommand};
use lkmc_pathprops::config::{default_host_config_path, OutputFormat, DEFAULT_REPO_CONFIG};
use lkmc_pathprops::{plan, telemetry, EffectiveConfig, ExplainOutput, Lane, LaneSettings, Property};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "lkmc-pathprops")]
#[command(about = "Build/test properties for userland example paths", version)]
struct Cli {
    /// Path to repo config file (default: .lkmc/pathprops.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Path to host config file (default: ~/.config/lkmc/pathprops.toml)
    #[arg(long, global = true)]
    host_config: Option<PathBuf>,

    /// Architectures to evaluate (comma-separated, e.g., "x86_64,arm")
    #[arg(long, short = 'a', value_delimiter = ',', global = true)]
    arch: Option<Vec<String>>,

    /// Path segment separator
    #[arg(long, global = true)]
    separator: Option<char>,

    /// JSON declaration to use instead of the built-in tree
    #[arg(long, global = true)]
    declaration: Option<PathBuf>,

    /// Output in human-readable format instead of JSON
    #[arg(long, global = true, conflicts_with = "json")]
    human: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the properties of a path
    Resolve {
        /// Path relative to the corpus root (e.g., userland/c/false.c)
        path: String,
    },

    /// Explain which tree nodes shaped a path's properties
    Explain {
        path: String,
    },

    /// List build/test decisions for every source file under a directory
    Plan {
        /// Corpus root (default: current directory)
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Print the effective configuration
    Config,

    /// Print the active declaration
    Tree,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    telemetry::init_tracing(cli.log_json, level);

    let effective = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Commands::Config = cli.command {
        print_json(&effective);
        return;
    }

    let settings = match effective.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let lane = match Lane::from_settings(&settings) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error building override tree: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Resolve { path } => run_resolve(&lane, &settings, &path),
        Commands::Explain { path } => run_explain(&lane, &settings, &path),
        Commands::Plan { root } => run_plan(&lane, &settings, &root),
        Commands::Tree => print_json(lane.declaration()),
        Commands::Config => {}
    }
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, lkmc_pathprops::config::ConfigError> {
    let host = cli.host_config.clone().or_else(default_host_config_path);
    let repo = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO_CONFIG));

    let mut overrides = serde_json::Map::new();
    if let Some(ref archs) = cli.arch {
        overrides.insert("archs".to_string(), serde_json::json!(archs));
    }
    if let Some(separator) = cli.separator {
        overrides.insert("separator".to_string(), serde_json::json!(separator.to_string()));
    }
    if let Some(ref declaration) = cli.declaration {
        overrides.insert(
            "declaration".to_string(),
            serde_json::json!(declaration.to_string_lossy()),
        );
    }
    if cli.human {
        overrides.insert("output".to_string(), serde_json::json!("human"));
    } else if cli.json {
        overrides.insert("output".to_string(), serde_json::json!("json"));
    }

    let cli_layer = if overrides.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(overrides))
    };
    debug!(host = ?host, repo = %repo.display(), "loading configuration");

    EffectiveConfig::build(host.as_deref(), Some(&repo), cli_layer)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_resolve(lane: &Lane, settings: &LaneSettings, path: &str) {
    let properties = lane.resolver().resolve(path);
    let decisions = lane.decisions(&properties);

    match settings.output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": path,
            "properties": properties,
            "decisions": decisions,
        })),
        OutputFormat::Human => {
            println!("{}", path);
            println!();
            for property in Property::ALL {
                let value = serde_json::to_string(&properties.get(property)).unwrap_or_default();
                println!("  {:<24} {}", property.as_str(), value);
            }
            println!();
            for decision in decisions {
                println!(
                    "  {:<8} build={} test={}",
                    decision.arch, decision.build, decision.test
                );
            }
        }
    }
}

fn run_explain(lane: &Lane, settings: &LaneSettings, path: &str) {
    let explanation = ExplainOutput::from_resolution(lane.resolver().trace(path), lane.archs());

    match settings.output {
        OutputFormat::Json => print_json(&explanation),
        OutputFormat::Human => println!("{}", explanation.to_human()),
    }
}

fn run_plan(lane: &Lane, settings: &LaneSettings, root: &Path) {
    let plan = match plan(root, lane, &settings.plan) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error planning {}: {}", root.display(), e);
            process::exit(1);
        }
    };

    match settings.output {
        OutputFormat::Json => print_json(&plan),
        OutputFormat::Human => println!("{}", plan.to_human()),
    }
}
