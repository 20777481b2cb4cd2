//! Document helpers shared by the storage backends

use serde_json::{Map, Value};

/// A stored document: a JSON object
pub type Document = Map<String, Value>;

/// Merge top-level fields into a document, leaving other fields untouched
pub fn merge_fields(target: &mut Document, fields: &Document) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}

/// Remove the named top-level fields from a document
pub fn unset_fields(target: &mut Document, fields: &[String]) {
    for field in fields {
        target.remove(field);
    }
}
