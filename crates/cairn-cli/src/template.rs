//! Templates for newly generated migration scripts

use cairn_core::{DocumentOp, MigrationKind, ScriptFormat};
use serde::Serialize;

use crate::output::capitalize;

const DEFAULT_TABS: usize = 4;

/// Layout options for generated scripts
#[derive(Debug, Clone, Copy)]
pub struct TemplateStyle {
    /// Spaces per indentation level
    pub tabs: usize,
    /// Quote strings with `"` instead of `'` (TOML only; JSON is always `"`)
    pub double_quote: bool,
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self {
            tabs: DEFAULT_TABS,
            double_quote: false,
        }
    }
}

#[derive(Serialize)]
struct ReversibleScript {
    up: Vec<DocumentOp>,
    down: Vec<DocumentOp>,
}

#[derive(Serialize)]
struct IrreversibleScript {
    execute: Vec<DocumentOp>,
}

/// Render an empty migration script
pub fn render(
    kind: MigrationKind,
    format: ScriptFormat,
    timestamp: i64,
    style: TemplateStyle,
) -> anyhow::Result<String> {
    match format {
        ScriptFormat::Toml => Ok(render_toml(kind, timestamp, style)),
        ScriptFormat::Json => render_json(kind, style),
    }
}

fn render_toml(kind: MigrationKind, timestamp: i64, style: TemplateStyle) -> String {
    let indent = " ".repeat(style.tabs);
    let q = if style.double_quote { '"' } else { '\'' };

    let mut out = String::new();
    out.push_str(&format!("# {} migration {}\n", capitalize(kind.as_str()), timestamp));
    out.push_str("#\n");
    out.push_str("# Operations run in order; `op` is one of set, merge, delete, unset.\n");
    out.push('\n');

    let lists: &[&str] = match kind {
        MigrationKind::Reversible => &["up", "down"],
        MigrationKind::Irreversible => &["execute"],
    };
    for (i, list) in lists.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{} = [\n", list));
        let example = match *list {
            "down" => format!(
                "{indent}# {{ op = {q}unset{q}, collection = {q}users{q}, id = {q}admin{q}, fields = [{q}role{q}] }},\n"
            ),
            _ => format!(
                "{indent}# {{ op = {q}merge{q}, collection = {q}users{q}, id = {q}admin{q}, data = {{ role = {q}owner{q} }} }},\n"
            ),
        };
        out.push_str(&example);
        out.push_str("]\n");
    }
    out
}

fn render_json(kind: MigrationKind, style: TemplateStyle) -> anyhow::Result<String> {
    let indent = " ".repeat(style.tabs);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);

    match kind {
        MigrationKind::Reversible => ReversibleScript {
            up: Vec::new(),
            down: Vec::new(),
        }
        .serialize(&mut ser)?,
        MigrationKind::Irreversible => IrreversibleScript {
            execute: Vec::new(),
        }
        .serialize(&mut ser)?,
    }

    let mut out = String::from_utf8(buf)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::MigrationScript;

    #[test]
    fn test_templates_parse_back_to_their_kind() {
        for format in [ScriptFormat::Toml, ScriptFormat::Json] {
            for kind in [MigrationKind::Reversible, MigrationKind::Irreversible] {
                for double_quote in [false, true] {
                    let style = TemplateStyle { tabs: 2, double_quote };
                    let source = render(kind, format, 1700000000000, style).unwrap();
                    let script = MigrationScript::parse(&source, format).unwrap();
                    assert_eq!(script.kind(), kind, "{:?} template:\n{}", format, source);
                }
            }
        }
    }

    #[test]
    fn test_toml_style() {
        let single = render_toml(MigrationKind::Reversible, 42, TemplateStyle::default());
        assert!(single.starts_with("# Reversible migration 42\n"));
        assert!(single.contains("    # { op = 'merge'"));

        let double = render_toml(
            MigrationKind::Irreversible,
            42,
            TemplateStyle { tabs: 1, double_quote: true },
        );
        assert!(double.contains("execute = [\n # { op = \"merge\""));
        assert!(!double.contains("down"));
    }

    #[test]
    fn test_json_indent() {
        let source = render_json(MigrationKind::Reversible, TemplateStyle { tabs: 3, double_quote: false }).unwrap();
        assert_eq!(source, "{\n   \"up\": [],\n   \"down\": []\n}\n");
    }
}
