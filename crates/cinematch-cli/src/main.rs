use anyhow::Result;
use cinematch_artifacts::{Config, SourcingStrategy};
use cinematch_core::DEFAULT_K;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cinematch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the catalog artifact (default: movie_list.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Path to the similarity artifact (default: similarity.json)
    #[arg(long, global = true)]
    similarity: Option<PathBuf>,

    /// Artifact sourcing: local_only, download_to_path or download_to_cache_dir
    #[arg(long, global = true)]
    strategy: Option<SourcingStrategy>,

    /// Directory for downloaded artifacts (default: platform cache dir)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Recommend the titles most similar to TITLE
    ///
    /// TITLE is trimmed and matched exactly, including case. Use
    /// `cinematch search` to find the exact spelling. Results are ranked by
    /// similarity score; equal scores keep catalog order, so the output is
    /// identical from run to run.
    ///
    /// Exits with status 1 when TITLE is not in the catalog.
    Recommend {
        /// Title to find neighbours for
        title: String,

        /// Number of recommendations
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,

        /// Show similarity scores
        #[arg(long)]
        scores: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List catalog titles, optionally filtered by a case-insensitive substring
    Search {
        /// Substring to look for
        query: Option<String>,

        /// Maximum number of titles to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Make sure both artifacts are available locally
    Fetch {
        /// Discard cached copies and download again
        #[arg(long)]
        force: bool,
    },
    /// Inspect or clear downloaded artifacts
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum CacheAction {
    /// Show where each artifact is read from
    Path,
    /// Delete downloaded artifacts so they are fetched again
    Clear,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print a single config value
    Get {
        /// Config key
        key: String,
    },
    /// Show the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

impl Cli {
    /// Layer CLI flags over the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.catalog {
            config.catalog_path.clone_from(path);
        }
        if let Some(path) = &self.similarity {
            config.similarity_path.clone_from(path);
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);

    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e:?}"))?;

    match cli.command {
        Commands::Recommend {
            title,
            k,
            scores,
            json,
        } => {
            return commands::run_recommend(&config, &title, k, scores, json).await;
        }
        Commands::Search { query, limit } => {
            commands::run_search(&config, query.as_deref(), limit).await?;
        }
        Commands::Fetch { force } => {
            commands::run_fetch(&config, force).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Path => commands::cache::show_paths(&config)?,
            CacheAction::Clear => commands::cache::clear(&config).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Get { key } => commands::config::get_config(&config, &key)?,
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(ExitCode::SUCCESS)
}
