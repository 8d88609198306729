//! modshift: version change detection and mod impact analysis
//!
//! Compares extracted game version trees and correlates the changes with a
//! mod's class references.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use modshift::{
    cli,
    config::{AnalyzeConfig, AppConfig, CheckConfig, CompareRunConfig, VersionPair},
    pipeline::exit_codes,
    reports::ReportFormat,
    utils::parse_duration,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "modshift")]
#[command(version)]
#[command(about = "Version change detection and mod impact analysis", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success (no changes, or --fail-on-change not set)
    1  Changes or impacts detected (with --fail-on-change)
    3  Error occurred

EXAMPLES:
    # Compare two extracted versions
    modshift compare trees/1.20.1 trees/1.21 --old-version 1.20.1 --new-version 1.21

    # Write a change list for later analysis
    modshift compare trees/1.20.1 trees/1.21 --old-version 1.20.1 --new-version 1.21 \\
        -o json -O changes.json

    # Analyse a mod against the change list
    modshift analyze mod-report.json changes.json --output-dir reports

    # Compare and analyse in one coordinated run
    modshift check --mod-report mod-report.json --mod-version 2.1.0 \\
        trees/1.20.1 trees/1.21 --old-version 1.20.1 --new-version 1.21")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs (extracted for readability)
// ============================================================================

/// Arguments shared by commands that compare two trees
#[derive(Parser)]
struct TreeArgs {
    /// Root of the extracted old version
    old_dir: PathBuf,

    /// Root of the extracted new version
    new_dir: PathBuf,

    /// Identifier of the old version (e.g. 1.20.1)
    #[arg(long)]
    old_version: String,

    /// Identifier of the new version (e.g. 1.21)
    #[arg(long)]
    new_version: String,

    /// Comparison state directory (defaults to the platform cache directory)
    #[arg(long, env = "MODSHIFT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Do not load or save comparison state
    #[arg(long)]
    no_state: bool,

    /// Worker threads (0 = number of CPUs)
    #[arg(long, default_value = "0")]
    threads: usize,
}

impl TreeArgs {
    fn version_pair(&self) -> VersionPair {
        VersionPair {
            old_version: self.old_version.clone(),
            new_version: self.new_version.clone(),
            old_dir: self.old_dir.clone(),
            new_dir: self.new_dir.clone(),
        }
    }
}

/// Arguments for the `compare` subcommand
#[derive(Parser)]
struct CompareArgs {
    #[command(flatten)]
    trees: TreeArgs,

    /// Ignore stored state and run a full comparison
    #[arg(long)]
    full: bool,

    /// Output format (auto detects TTY: summary if interactive, text otherwise)
    #[arg(short, long, default_value = "auto")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if any change is detected
    #[arg(long)]
    fail_on_change: bool,
}

/// Arguments for the retry policy of the analysis pipeline
#[derive(Parser)]
struct PipelineArgs {
    /// Directory analysis reports are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Total attempts before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between attempts (e.g. 500ms, 2s)
    #[arg(long)]
    backoff: Option<String>,

    /// Exit with code 1 if any mod component is impacted
    #[arg(long)]
    fail_on_change: bool,
}

/// Arguments for the `analyze` subcommand
#[derive(Parser)]
struct AnalyzeArgs {
    /// Mod analysis report (JSON)
    mod_report: PathBuf,

    /// Version change list (JSON, from `compare -o json`)
    change_report: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Arguments for the `check` subcommand
#[derive(Parser)]
struct CheckArgs {
    /// Mod analysis report (JSON)
    #[arg(long)]
    mod_report: PathBuf,

    /// Version of the mod build the report describes
    #[arg(long)]
    mod_version: String,

    #[command(flatten)]
    trees: TreeArgs,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two extracted version trees
    Compare(CompareArgs),

    /// Analyse a mod report against a version change list
    Analyze(AnalyzeArgs),

    /// Compare two versions and analyse a mod against the result
    Check(CheckArgs),

    /// Inspect or clear persisted comparison state
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the JSON Schema of the configuration file
    ConfigSchema {
        /// Output file path (stdout if not specified)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Show the stored state for a version pair
    Show {
        old_version: String,
        new_version: String,
        /// Comparison state directory
        #[arg(long, env = "MODSHIFT_STATE_DIR")]
        state_dir: Option<PathBuf>,
    },
    /// Remove stored state (one pair, or everything)
    Clear {
        old_version: Option<String>,
        #[arg(requires = "old_version")]
        new_version: Option<String>,
        /// Comparison state directory
        #[arg(long, env = "MODSHIFT_STATE_DIR")]
        state_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// List config file search locations
    Path,
    /// Write a commented example config to ./.modshift.yaml
    Init,
}

// ============================================================================
// Config assembly
// ============================================================================

/// Load the config file and layer CLI overrides on top.
fn load_app_config(cli: &Cli, overrides: &AppConfig) -> AppConfig {
    let (config, loaded_from) =
        AppConfig::from_file_with_overrides(cli.config.as_deref(), overrides);
    if let Some(path) = loaded_from {
        tracing::debug!("Loaded config from {}", path.display());
    }
    config
}

fn tree_overrides(cli: &Cli, trees: &TreeArgs) -> AppConfig {
    AppConfig::builder()
        .worker_threads(trees.threads)
        .state_dir(trees.state_dir.clone())
        .state_enabled(!trees.no_state)
        .no_color(cli.no_color)
        .quiet(cli.quiet)
        .build()
}

fn apply_pipeline_args(config: &mut AppConfig, args: &PipelineArgs) -> Result<()> {
    if let Some(dir) = &args.output_dir {
        config.pipeline.output_dir.clone_from(dir);
    }
    if let Some(attempts) = args.max_attempts {
        config.pipeline.max_attempts = attempts;
    }
    if let Some(backoff) = &args.backoff {
        let delay = parse_duration(backoff).map_err(anyhow::Error::msg)?;
        config.pipeline.backoff_ms = u64::try_from(delay.as_millis()).context("backoff too large")?;
    }
    if args.fail_on_change {
        config.behavior.fail_on_change = true;
    }
    Ok(())
}

fn state_config(cli: &Cli, state_dir: Option<PathBuf>) -> AppConfig {
    let overrides = AppConfig::builder().state_dir(state_dir).build();
    load_app_config(cli, &overrides)
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    if exit_code != exit_codes::SUCCESS {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Compare(args) => {
            let mut overrides = tree_overrides(cli, &args.trees);
            overrides.output.format = args.output;
            overrides.output.file.clone_from(&args.output_file);
            overrides.behavior.fail_on_change = args.fail_on_change;

            let config = CompareRunConfig {
                versions: args.trees.version_pair(),
                force_full: args.full,
                app: load_app_config(cli, &overrides),
            };
            cli::run_compare(config)
        }

        Commands::Analyze(args) => {
            let overrides = AppConfig::builder()
                .no_color(cli.no_color)
                .quiet(cli.quiet)
                .build();
            let mut app = load_app_config(cli, &overrides);
            apply_pipeline_args(&mut app, &args.pipeline)?;

            cli::run_analyze(AnalyzeConfig {
                mod_report: args.mod_report.clone(),
                change_report: args.change_report.clone(),
                app,
            })
        }

        Commands::Check(args) => {
            let overrides = tree_overrides(cli, &args.trees);
            let mut app = load_app_config(cli, &overrides);
            apply_pipeline_args(&mut app, &args.pipeline)?;

            cli::run_check(CheckConfig {
                versions: args.trees.version_pair(),
                mod_report: args.mod_report.clone(),
                mod_version: args.mod_version.clone(),
                app,
            })
        }

        Commands::State { action } => match action {
            StateAction::Show {
                old_version,
                new_version,
                state_dir,
            } => {
                let app = state_config(cli, state_dir.clone());
                cli::run_state_show(&app, old_version, new_version)
            }
            StateAction::Clear {
                old_version,
                new_version,
                state_dir,
            } => {
                let app = state_config(cli, state_dir.clone());
                let pair = match (old_version.as_deref(), new_version.as_deref()) {
                    (Some(old), Some(new)) => Some((old, new)),
                    (None, None) => None,
                    _ => anyhow::bail!("state clear takes both versions or none"),
                };
                cli::run_state_clear(&app, pair)
            }
        },

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "modshift", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = modshift::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) = modshift::config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    ::dirs::config_dir().map(|p| p.join("modshift").display().to_string()),
                    ::dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in modshift::config::CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match modshift::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".modshift.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = modshift::config::generate_full_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare_args() {
        let cli = Cli::try_parse_from([
            "modshift",
            "compare",
            "old",
            "new",
            "--old-version",
            "1.20",
            "--new-version",
            "1.21",
            "-o",
            "json",
            "--full",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.trees.old_version, "1.20");
                assert_eq!(args.output, ReportFormat::Json);
                assert!(args.full);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_pipeline_args_override_config() {
        let mut config = AppConfig::default();
        let args = PipelineArgs {
            output_dir: Some(PathBuf::from("reports")),
            max_attempts: Some(5),
            backoff: Some("250ms".to_string()),
            fail_on_change: true,
        };
        apply_pipeline_args(&mut config, &args).unwrap();
        assert_eq!(config.pipeline.max_attempts, 5);
        assert_eq!(config.pipeline.backoff_ms, 250);
        assert_eq!(config.pipeline.output_dir, PathBuf::from("reports"));
        assert!(config.behavior.fail_on_change);
    }
}
