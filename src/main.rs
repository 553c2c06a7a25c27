use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use reading_path::config::{load_config_from_file, RunConfig};
use reading_path::logging;
use reading_path::path_io;
use reading_path::{LevelHierarchy, PathBuilder, Strategy};

#[derive(Parser, Debug)]
#[command(name = "reading_path", version, about = "Builds graded multi-level reading paths")]
struct Cli {
    /// TOML run file naming the inputs, the hierarchy and the policy.
    #[arg(long, global = true, default_value = "reading_path.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds one reading path.
    Path {
        /// Use a named variant instead of the configured policy.
        #[arg(long)]
        strategy: Option<Strategy>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Builds the conservative, standard and fast paths side by side.
    Strategies {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Explains how one item fits one level.
    Evaluate {
        #[arg(long)]
        item: String,
        #[arg(long)]
        level: String,
    },
    /// Prints vocabulary profiles.
    Profile {
        /// Only this item.
        #[arg(long)]
        item: Option<String>,
    },
}

fn load_builder(config: &RunConfig) -> Result<PathBuilder> {
    let hierarchy = LevelHierarchy::new(config.hierarchy.clone()).context("invalid [hierarchy] section")?;
    let mapping = path_io::load_mapping(&config.mapping)?;
    let items = path_io::load_items(&config.items)?;
    Ok(PathBuilder::new(hierarchy, &mapping, items)?)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(file_path) => {
            path_io::write_json(value, file_path)?;
            info!("Wrote {:?}", file_path);
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config_from_file(&cli.config)
        .with_context(|| format!("failed to load run configuration {:?}", cli.config))?;
    logging::init(&config.log_level);
    info!("Loaded configuration from {:?}", cli.config);

    let builder = load_builder(&config)?;

    match cli.command {
        Commands::Path { strategy, output } => {
            let (name, result) = match strategy {
                Some(strategy) => (strategy.to_string(), builder.build_strategy(strategy)?),
                None => {
                    let policy = config.policy.clone().unwrap_or_else(|| builder.default_policy());
                    ("configured".to_string(), builder.build_path(&policy)?)
                }
            };
            logging::log_path_summary(&name, &result);
            emit(&result, output.as_deref())?;
        }
        Commands::Strategies { output } => {
            let paths = builder.alternative_paths()?;
            for (name, result) in &paths {
                logging::log_path_summary(name, result);
            }
            emit(&paths, output.as_deref())?;
        }
        Commands::Evaluate { item, level } => {
            let evaluation = builder.evaluate(&item, &level)?;
            emit(&evaluation, None)?;
        }
        Commands::Profile { item } => match item {
            Some(item_id) => emit(builder.profile_of(&item_id)?, None)?,
            None => emit(&builder.profiles(), None)?,
        },
    }

    Ok(())
}
