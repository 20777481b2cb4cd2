//! Run and revert commands

use std::path::PathBuf;

use clap::Args;

use cairn_engine::RunOptions;

use crate::output::print_report;
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct MigrateArgs {
    /// Only migrations whose file name contains this string
    pub name: Option<String>,

    /// Migrations directory (default: migrations)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Collection holding the migration log (default: migrations)
    #[arg(long)]
    pub collection: Option<String>,

    /// With a name, ignore the migration log and process every match
    #[arg(long)]
    pub force: bool,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl MigrateArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            force: self.force,
            filter: self.name.clone(),
        }
    }
}

pub async fn run(args: &MigrateArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let engine = ctx.engine(cli, args.path.as_deref(), args.collection.as_deref()).await?;
    announce(cli, engine.context().database());

    let report = engine.run(&args.options()).await?;
    if !cli.quiet {
        print_report(&report, "executed", engine.context().database(), cli.format)?;
    }
    Ok(())
}

pub async fn revert(args: &MigrateArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let engine = ctx.engine(cli, args.path.as_deref(), args.collection.as_deref()).await?;
    announce(cli, engine.context().database());

    let report = engine.revert(&args.options()).await?;
    if !cli.quiet {
        print_report(&report, "reverted", engine.context().database(), cli.format)?;
    }
    Ok(())
}

fn announce(cli: &Cli, database: &str) {
    if !cli.quiet && cli.format == crate::output::OutputFormat::Text {
        println!("Using: {}", database);
    }
}
