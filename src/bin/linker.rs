//! MetaEd Linker CLI
//!
//! Loads a directory of namespace documents, links it and prints either the
//! projections or the diagnostics.

use clap::{Parser, Subcommand};
use metaed_linker::model::{load_from_directory, LoadConfig};
use metaed_linker::{DataStandardVersion, LinkContext, LinkerConfig, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metaed-link")]
#[command(about = "Link MetaEd models and project their JSON paths")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    /// Model directory (overrides the config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Data standard version (overrides the config)
    #[arg(short = 'v', long)]
    data_standard: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link the model and print projections as JSON
    Link {
        /// Only print this entity
        #[arg(short, long)]
        entity: Option<String>,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Link the model and report diagnostics
    Check,

    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(long)]
        init: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = LinkerConfig::load_from(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.linker.model_dir = model;
    }
    if let Some(version) = cli.data_standard {
        config.linker.data_standard_version = version;
    }

    match cli.command {
        Commands::Config { init } => {
            match init {
                Some(path) => {
                    config.save(&path)?;
                    println!("Wrote {}", path);
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }

        Commands::Check => {
            let context = link(&config)?;
            let diagnostics = context.diagnostics();

            if diagnostics.is_empty() {
                println!("✅ No problems found");
                return Ok(());
            }
            print!("{}", diagnostics);

            let failed = diagnostics.has_errors() || (config.linker.fail_on_warnings && diagnostics.warning_count() > 0);
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Link { entity, output } => {
            let context = link(&config)?;
            if context.diagnostics().has_errors() {
                eprint!("{}", context.diagnostics());
                return Err(format!("linking failed with {} error(s)", context.diagnostics().error_count()).into());
            }

            let report = projection_report(&context, entity.as_deref());
            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }
    }
}

fn link(config: &LinkerConfig) -> Result<LinkContext, Box<dyn std::error::Error>> {
    let version: DataStandardVersion = config.data_standard_version()?;
    let loaded = load_from_directory(&config.model_dir(), &LoadConfig::default())?;
    tracing::info!(bundle = %loaded.bundle_hash, files = loaded.files.len(), "model loaded");

    let context = Pipeline::from_config(config).link(loaded.repository, version)?;
    Ok(context)
}

/// Projections and securable elements keyed by qualified entity name
fn projection_report(context: &LinkContext, only: Option<&str>) -> serde_json::Value {
    let mut report = serde_json::Map::new();

    for id in context.repository().entities_in_order().unwrap_or_default() {
        let Some(entity) = context.entity(id) else {
            continue;
        };
        if only.is_some_and(|name| name != entity.name) {
            continue;
        }
        let Some(projection) = context.json_paths(id) else {
            continue;
        };

        report.insert(
            entity.qualified_name(),
            serde_json::json!({
                "digest": projection.digest(),
                "jsonPaths": projection,
                "educationOrganizationSecurableElements": context.securable_elements(id).unwrap_or(&[]),
            }),
        );
    }

    serde_json::Value::Object(report)
}
