//! Output formatting utilities

use cairn_engine::{MigrationStatus, Report};
use clap::ValueEnum;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format output based on format type
pub fn format_output<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[derive(Serialize)]
struct ReportView<'a> {
    database: &'a str,
    dry_run: bool,
    count: usize,
    migrations: Vec<ReportEntryView<'a>>,
}

#[derive(Serialize)]
struct ReportEntryView<'a> {
    file: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    action: String,
}

/// Print the outcome of `run` or `revert`
pub fn print_report(report: &Report, verb: &str, database: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let view = ReportView {
                database,
                dry_run: report.dry_run,
                count: report.len(),
                migrations: report
                    .entries
                    .iter()
                    .map(|entry| ReportEntryView {
                        file: &entry.file.file_name,
                        kind: entry.kind.as_str(),
                        action: entry.action.to_string(),
                    })
                    .collect(),
            };
            println!("{}", format_output(&view)?);
        }
        OutputFormat::Text => {
            for entry in &report.entries {
                println!("Migration {} {}.", entry.file, entry.action);
            }
            let prefix = if report.dry_run { "Dry run: " } else { "" };
            println!(
                "{}{} {} migration{}.",
                prefix,
                capitalize(verb),
                report.len(),
                if report.len() == 1 { "" } else { "s" }
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusView<'a> {
    file: &'a str,
    timestamp: &'a str,
    name: &'a str,
    executed: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(rename = "executedAt", skip_serializing_if = "Option::is_none")]
    executed_at: Option<String>,
}

/// Print a migration listing with execution details
pub fn print_status(statuses: &[MigrationStatus], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let views: Vec<_> = statuses
                .iter()
                .map(|status| StatusView {
                    file: &status.file.file_name,
                    timestamp: &status.file.timestamp,
                    name: &status.file.name,
                    executed: status.is_executed(),
                    kind: status.record.as_ref().map(|r| r.kind.as_str()),
                    executed_at: status.record.as_ref().map(|r| r.executed_at.to_rfc3339()),
                })
                .collect();
            println!("{}", format_output(&views)?);
        }
        OutputFormat::Text => {
            for status in statuses {
                match &status.record {
                    Some(record) => println!(
                        "{}  {}  {}",
                        status.file,
                        record.kind,
                        record.executed_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    None => println!("{}  pending", status.file),
                }
            }
        }
    }
    Ok(())
}

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
