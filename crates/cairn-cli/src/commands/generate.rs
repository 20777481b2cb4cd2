//! Generate command for creating migration files

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use cairn_core::{MigrationFile, MigrationKind, ScriptFormat};
use cairn_engine::Catalog;

use crate::template::{self, TemplateStyle};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct GenerateArgs {
    /// Descriptive part of the file name
    pub name: String,

    /// Create an irreversible migration (`execute` only)
    #[arg(short = 'I', long, conflicts_with = "clone")]
    pub irreversible: bool,

    /// Copy an existing migration whose file name contains this string
    #[arg(short = 'C', long)]
    pub clone: Option<String>,

    /// Migrations directory (default: migrations)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Spaces per indentation level
    #[arg(long)]
    pub tabs: Option<usize>,

    /// Use double quotes instead of single quotes
    #[arg(long)]
    pub double_quote: bool,

    /// File format of the new migration
    #[arg(long, value_enum)]
    pub ext: Option<Extension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Extension {
    Toml,
    Json,
}

impl From<Extension> for ScriptFormat {
    fn from(ext: Extension) -> Self {
        match ext {
            Extension::Toml => ScriptFormat::Toml,
            Extension::Json => ScriptFormat::Json,
        }
    }
}

pub fn run(args: &GenerateArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    validate_name(&args.name)?;

    let catalog = Catalog::new(ctx.migrations_dir(args.path.as_deref()));
    catalog.ensure_dir()?;
    let timestamp = chrono::Utc::now().timestamp_millis();

    if let Some(search) = &args.clone {
        let original = catalog.find(search)?;
        let file_name = MigrationFile::compose_file_name(timestamp, &args.name, &original.extension);
        let target = checked_target(catalog.dir(), &file_name)?;

        std::fs::copy(catalog.path_of(&original), &target)?;
        tracing::info!("Cloned {} into {}", original, file_name);
        if !cli.quiet {
            println!("New migration clone created: {}", target.display());
        }
        return Ok(());
    }

    let format = match args.ext {
        Some(ext) => ScriptFormat::from(ext),
        None => ScriptFormat::from_extension(ctx.config.ext())?,
    };
    let kind = if args.irreversible {
        MigrationKind::Irreversible
    } else {
        MigrationKind::Reversible
    };
    let style = TemplateStyle {
        tabs: args.tabs.unwrap_or(TemplateStyle::default().tabs),
        double_quote: args.double_quote,
    };

    let file_name = MigrationFile::compose_file_name(timestamp, &args.name, format.extension());
    let target = checked_target(catalog.dir(), &file_name)?;
    std::fs::write(&target, template::render(kind, format, timestamp, style)?)?;

    tracing::info!("Generated {} migration {}", kind, file_name);
    if !cli.quiet {
        println!("New migration file created: {}", target.display());
    }
    Ok(())
}

fn validate_name(name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Migration name must not be empty");
    }
    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        anyhow::bail!("Invalid migration name '{}'", name);
    }
    Ok(())
}

/// Path for a new file, refusing names that would not be picked up or
/// would overwrite an existing migration
fn checked_target(dir: &Path, file_name: &str) -> anyhow::Result<PathBuf> {
    MigrationFile::parse(file_name)?;

    let target = dir.join(file_name);
    if target.exists() {
        anyhow::bail!("Migration file already exists: {}", target.display());
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("add-users").is_ok());
        assert!(validate_name("addIndex").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("../escape").is_err());
    }

    #[test]
    fn test_checked_target() {
        let dir = tempdir().unwrap();
        let target = checked_target(dir.path(), "1000-init.toml").unwrap();
        assert_eq!(target, dir.path().join("1000-init.toml"));

        std::fs::write(&target, "").unwrap();
        assert!(checked_target(dir.path(), "1000-init.toml").is_err());
        assert!(checked_target(dir.path(), "1000-init.yaml").is_err());
    }
}
