//! List command

use std::path::PathBuf;

use clap::Args;

use cairn_engine::ListMode;

use crate::output::{print_status, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct ListArgs {
    /// Migrations directory (default: migrations)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Collection holding the migration log (default: migrations)
    #[arg(long)]
    pub collection: Option<String>,

    /// Only executed migrations
    #[arg(short = 'E', long, conflicts_with = "all")]
    pub executed: bool,

    /// Every migration, executed or not
    #[arg(short = 'A', long)]
    pub all: bool,

    /// Show type and execution time
    #[arg(short, long)]
    pub long: bool,
}

impl ListArgs {
    fn mode(&self) -> ListMode {
        match (self.executed, self.all) {
            (_, true) => ListMode::All,
            (true, false) => ListMode::Executed,
            (false, false) => ListMode::Pending,
        }
    }
}

pub async fn run(args: &ListArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let engine = ctx.engine(cli, args.path.as_deref(), args.collection.as_deref()).await?;
    let mode = args.mode();

    if !args.long && cli.format == OutputFormat::Text {
        let files = engine.list(mode).await?;
        tracing::debug!("Listing {} migrations ({:?})", files.len(), mode);
        for file in files {
            println!("{}", file);
        }
        return Ok(());
    }

    let statuses = engine.status(mode).await?;
    tracing::debug!("Listing {} migrations ({:?})", statuses.len(), mode);
    print_status(&statuses, cli.format)
}
