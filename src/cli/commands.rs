use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{load_config, DevtoolsConfig, PathKey, DEFAULT_CONFIG_FILE};
use crate::pipeline;
use crate::schema::output::read_document;

/// Command-line interface for the Lost & Found devtools
///
/// Runs the code generation pipeline stage by stage or end to end.
#[derive(Parser)]
#[command(name = "lnf-devtools")]
#[command(about = "Lost & Found code generation pipeline", long_about = None)]
pub struct Cli {
    /// Devtools config file (TOML, YAML or JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "LNF_DEVTOOLS_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Discover models and write the generated schema file
    Schemas,
    /// Merge the schema file into the API document and validate the result
    Combine,
    /// Generate Lambda handlers from the combined API document
    Lambdas,
    /// Run every stage in order
    All,
    /// Validate an API document without generating anything
    Validate {
        /// Document to validate (default: the combined API file from the config)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },
}

fn load(path: &Path) -> anyhow::Result<DevtoolsConfig> {
    let config = load_config(path)?;
    info!(config = %path.display(), "configuration loaded");
    Ok(config)
}

/// Execute a parsed command line.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Schemas => {
            pipeline::run_schemas(&load(&cli.config)?)?;
        }
        Commands::Combine => {
            pipeline::run_combine(&load(&cli.config)?)?;
        }
        Commands::Lambdas => {
            pipeline::run_lambdas(&load(&cli.config)?)?;
        }
        Commands::All => {
            pipeline::run_all(&load(&cli.config)?)?;
        }
        Commands::Validate { spec } => {
            // An explicit document does not need a config file
            let config = match spec {
                Some(_) if !cli.config.exists() => DevtoolsConfig::default(),
                _ => load(&cli.config)?,
            };
            let path = match spec {
                Some(path) => path.clone(),
                None => config.get_path(PathKey::TempApiFile)?,
            };
            let document = read_document(&path)
                .with_context(|| format!("Cannot validate {}", path.display()))?;
            pipeline::validate_api_document(&path, &document, &config)?;
        }
    }
    Ok(())
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(&cli)?;
    Ok(())
}
