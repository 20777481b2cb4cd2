//! Declarative migration scripts
//!
//! A script is a TOML or JSON document. Its shape decides the kind:
//!
//! ```toml
//! [[up]]
//! op = "merge"
//! collection = "users"
//! id = "admin"
//! data = { role = "owner" }
//!
//! [[down]]
//! op = "unset"
//! collection = "users"
//! id = "admin"
//! fields = ["role"]
//! ```
//!
//! A top-level `execute` list makes the script irreversible; otherwise both
//! `up` and `down` lists are required.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::record::MigrationKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single operation against the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOp {
    /// Replace the whole document
    Set {
        collection: String,
        id: String,
        #[serde(default)]
        data: Document,
    },
    /// Merge top-level fields, creating the document if absent
    Merge {
        collection: String,
        id: String,
        data: Document,
    },
    /// Remove the document
    Delete { collection: String, id: String },
    /// Remove named fields from the document
    Unset {
        collection: String,
        id: String,
        fields: Vec<String>,
    },
}

impl DocumentOp {
    /// Collection and document id the operation targets
    pub fn target(&self) -> (&str, &str) {
        match self {
            Self::Set { collection, id, .. }
            | Self::Merge { collection, id, .. }
            | Self::Delete { collection, id }
            | Self::Unset { collection, id, .. } => (collection, id),
        }
    }
}

/// Source syntax of a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Toml,
    Json,
}

impl ScriptFormat {
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedExtension(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// A parsed migration script, classified by its shape
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationScript {
    Reversible {
        up: Vec<DocumentOp>,
        down: Vec<DocumentOp>,
    },
    Irreversible {
        execute: Vec<DocumentOp>,
    },
}

impl MigrationScript {
    /// Parse script source in the given format
    pub fn parse(source: &str, format: ScriptFormat) -> Result<Self> {
        let value: Value = match format {
            ScriptFormat::Toml => {
                toml::from_str(source).map_err(|e| Error::MalformedScript(e.to_string()))?
            }
            ScriptFormat::Json => {
                serde_json::from_str(source).map_err(|e| Error::MalformedScript(e.to_string()))?
            }
        };
        Self::from_value(value)
    }

    /// Classify a generic document by which operation lists it carries
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(Error::MalformedScript("script must be a table/object".into()));
        };

        if let Some(execute) = root.remove("execute").filter(Value::is_array) {
            return Ok(Self::Irreversible {
                execute: ops_from_value("execute", execute)?,
            });
        }

        match (
            root.remove("up").filter(Value::is_array),
            root.remove("down").filter(Value::is_array),
        ) {
            (Some(up), Some(down)) => Ok(Self::Reversible {
                up: ops_from_value("up", up)?,
                down: ops_from_value("down", down)?,
            }),
            _ => Err(Error::MalformedScript(
                "expected an `execute` list or both `up` and `down` lists".into(),
            )),
        }
    }

    pub fn kind(&self) -> MigrationKind {
        match self {
            Self::Reversible { .. } => MigrationKind::Reversible,
            Self::Irreversible { .. } => MigrationKind::Irreversible,
        }
    }
}

fn ops_from_value(section: &str, value: Value) -> Result<Vec<DocumentOp>> {
    serde_json::from_value(value)
        .map_err(|e| Error::MalformedScript(format!("invalid `{}` operation: {}", section, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reversible_toml() {
        let source = r#"
[[up]]
op = "merge"
collection = "users"
id = "admin"
data = { role = "owner" }

[[down]]
op = "unset"
collection = "users"
id = "admin"
fields = ["role"]
"#;
        let script = MigrationScript::parse(source, ScriptFormat::Toml).unwrap();
        assert_eq!(script.kind(), MigrationKind::Reversible);

        let MigrationScript::Reversible { up, down } = script else {
            panic!("expected reversible script");
        };
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].target(), ("users", "admin"));
        assert_eq!(
            down[0],
            DocumentOp::Unset {
                collection: "users".into(),
                id: "admin".into(),
                fields: vec!["role".into()],
            }
        );
    }

    #[test]
    fn test_parse_irreversible_json() {
        let source = r#"{"execute": [{"op": "delete", "collection": "sessions", "id": "stale"}]}"#;
        let script = MigrationScript::parse(source, ScriptFormat::Json).unwrap();
        assert_eq!(script.kind(), MigrationKind::Irreversible);
    }

    #[test]
    fn test_execute_wins_over_up_down() {
        let script = MigrationScript::from_value(json!({"execute": [], "up": [], "down": []})).unwrap();
        assert_eq!(script.kind(), MigrationKind::Irreversible);
    }

    #[test]
    fn test_empty_lists_are_valid() {
        let script = MigrationScript::from_value(json!({"up": [], "down": []})).unwrap();
        assert_eq!(
            script,
            MigrationScript::Reversible {
                up: vec![],
                down: vec![]
            }
        );
    }

    #[test]
    fn test_rejects_unknown_shape() {
        for value in [json!({"up": []}), json!({"execute": "x"}), json!([]), json!({})] {
            let err = MigrationScript::from_value(value).unwrap_err();
            assert!(matches!(err, Error::MalformedScript(_)));
        }
    }

    #[test]
    fn test_rejects_unknown_op() {
        let err = MigrationScript::from_value(json!({
            "execute": [{"op": "drop_everything", "collection": "users"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("execute"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ScriptFormat::from_extension("toml").unwrap(), ScriptFormat::Toml);
        assert_eq!(ScriptFormat::from_extension("json").unwrap(), ScriptFormat::Json);
        assert!(ScriptFormat::from_extension("ts").is_err());
    }
}
