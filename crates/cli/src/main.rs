//! kharcha - bank SMS to transaction history

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kharcha_sms::{BankRegistry, CategoryClassifier, SmsEngine, TransactionService};
use kharcha_storage::SqliteStore;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::Config;

/// kharcha - turn bank SMS into a transaction history
#[derive(Parser)]
#[command(name = "kharcha", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to kharcha.toml in the data directory)
    #[arg(long, global = true, env = "KHARCHA_CONFIG")]
    config: Option<PathBuf>,

    /// sqlite database, overriding the config file
    #[arg(long, global = true, env = "KHARCHA_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble messages from a JSON file and merge them into the history
    Ingest {
        /// JSON array of {id, sender, body, timestamp}
        file: PathBuf,
        /// Drop messages whose sender is not a known bank or wallet first
        #[arg(long)]
        known_only: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored history, newest first
    List {
        /// Show at most this many records
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Debit totals per category for a month
    Spending {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Latest reported account balance
    Balance,

    /// Suggest better categories using the stored category list
    Categorize {
        /// Persist the suggestions
        #[arg(long)]
        apply: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Correct a stored transaction
    Edit {
        /// Transaction id
        id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        merchant: Option<String>,
    },

    /// List the bank profiles in use and any sender id overlaps
    Banks,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = config::data_dir()?;
    let config = Config::load(cli.config.as_deref(), &data_dir)?;
    let registry = Arc::new(load_registry(&config)?);

    if let Commands::Banks = cli.command {
        commands::banks(&registry);
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| config.database_path(&data_dir));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    tracing::debug!("using database {}", db_path.display());

    let engine = SmsEngine::new(registry, Arc::new(CategoryClassifier::default()));
    let service = TransactionService::new(engine, store);

    match cli.command {
        Commands::Ingest {
            file,
            known_only,
            json,
        } => commands::ingest(&service, &file, known_only, json).await,
        Commands::List { limit, json } => commands::list(&service, limit, json).await,
        Commands::Spending { year, month, json } => {
            commands::spending(&service, year, month, json).await
        }
        Commands::Balance => commands::balance(&service).await,
        Commands::Categorize { apply, json } => commands::categorize(&service, apply, json).await,
        Commands::Edit {
            id,
            category,
            description,
            merchant,
        } => {
            let edit = commands::Edit {
                category,
                description,
                merchant,
            };
            commands::edit(&service, &id, edit).await
        }
        Commands::Banks => Ok(()),
    }
}

fn load_registry(config: &Config) -> Result<BankRegistry> {
    let Some(path) = &config.banks else {
        return Ok(BankRegistry::builtin());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank registry {}", path.display()))?;
    let registry = BankRegistry::from_toml(&content)
        .with_context(|| format!("invalid bank registry {}", path.display()))?;
    tracing::info!(
        profiles = registry.profiles().len(),
        "loaded bank registry from {}",
        path.display()
    );
    Ok(registry)
}
