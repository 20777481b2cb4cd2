//! Cairn CLI - Versioned migrations for document databases

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;
mod template;

use cairn_engine::{Engine, EngineConfig, ScriptSource};
use cairn_storage::DocumentStore;
use commands::{completions, generate, list, migrate};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about = "Versioned migrations for document databases")]
pub struct Cli {
    /// Database file holding documents and the migration log
    #[arg(short, long, env = "CAIRN_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short, long, env = "CAIRN_BACKEND", global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Config file (default: <config dir>/cairn/config.toml)
    #[arg(long, env = "CAIRN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new migration file
    Generate(generate::GenerateArgs),
    /// Run all pending migrations, or the ones matching a name
    Run(migrate::MigrateArgs),
    /// Revert executed migrations matching a name
    Revert(migrate::MigrateArgs),
    /// List migrations (pending only by default)
    #[command(alias = "list")]
    Ls(list::ListArgs),
    /// Manage the config file
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Storage backend for the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Redb,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s, true).ok()
    }

    fn default_database(&self) -> &'static str {
        match self {
            Self::Redb => "cairn.redb",
            Self::Sqlite => "cairn.sqlite",
        }
    }
}

/// Application context: configuration and store access
pub struct AppContext {
    pub config: Config,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = config::config_file_path(cli.config.as_deref());
        let config = Config::load_from(&config_path)?;
        tracing::debug!("Using config file: {:?}", config_path);

        Ok(Self { config })
    }

    /// Backend chosen by flag/env, then config file
    pub fn backend(&self, cli: &Cli) -> anyhow::Result<Backend> {
        if let Some(backend) = cli.backend {
            return Ok(backend);
        }
        match self.config.backend.as_deref() {
            Some(name) => Backend::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown backend in config file: {}", name)),
            None => Ok(Backend::Redb),
        }
    }

    /// Database path chosen by flag/env, then config file
    pub fn database_path(&self, cli: &Cli) -> anyhow::Result<PathBuf> {
        let backend = self.backend(cli)?;
        Ok(cli
            .database
            .clone()
            .or_else(|| self.config.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(backend.default_database())))
    }

    /// Migrations directory chosen by flag, then config file
    pub fn migrations_dir(&self, path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.migrations_dir())
    }

    /// Open the target database; the migration log lives in it too
    pub async fn open_store(&self, cli: &Cli) -> anyhow::Result<(Arc<dyn DocumentStore>, PathBuf)> {
        let backend = self.backend(cli)?;
        let db_path = self.database_path(cli)?;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Using {} database at: {:?}", backend.as_str(), db_path);

        let store: Arc<dyn DocumentStore> = match backend {
            #[cfg(feature = "redb")]
            Backend::Redb => Arc::new(cairn_storage::RedbStore::open(&db_path)?),
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Arc::new(cairn_storage::SqliteStore::open(&db_path)?),
            #[allow(unreachable_patterns)]
            other => anyhow::bail!(
                "Backend '{}' is not enabled. Rebuild with --features {}",
                other.as_str(),
                other.as_str()
            ),
        };
        store.initialize().await?;
        if !store.health_check().await? {
            anyhow::bail!("Database {} failed its health check", db_path.display());
        }

        Ok((store, db_path))
    }

    /// Build the engine for one command invocation
    pub async fn engine(
        &self,
        cli: &Cli,
        path: Option<&Path>,
        collection: Option<&str>,
    ) -> anyhow::Result<Engine> {
        let (store, db_path) = self.open_store(cli).await?;

        let config = EngineConfig {
            migrations_dir: self.migrations_dir(path),
            collection: collection
                .map(str::to_string)
                .unwrap_or_else(|| self.config.collection()),
            database: db_path.display().to_string(),
        };

        Ok(Engine::new(config, store, Arc::new(ScriptSource::new())))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting cairn CLI");

    // Config and completions must work even when the config file is broken
    match &cli.command {
        Commands::Config(args) => {
            let path = config::config_file_path(cli.config.as_deref());
            return commands::config::run(args, &path);
        }
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli)?;

    match &cli.command {
        Commands::Generate(args) => generate::run(args, &cli, &ctx)?,
        Commands::Run(args) => migrate::run(args, &cli, &ctx).await?,
        Commands::Revert(args) => migrate::revert(args, &cli, &ctx).await?,
        Commands::Ls(args) => list::run(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
