//! Editor-protocol JSON for edits and diagnostics.
//!
//! Shapes follow the usual text-document conventions: zero-based
//! `line`/`character` positions, numeric severities.

use serde_json::{Value, json};

use super::edit::TextEdit;
use crate::hir::diagnostics::Diagnostic;

/// `{ "range": ..., "newText": ... }`
pub fn edit_to_json(edit: &TextEdit) -> Value {
    json!({
        "range": edit.range,
        "newText": edit.new_text,
    })
}

/// An array of `{ "range", "severity", "code"?, "source", "message" }`.
pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Value {
    diagnostics
        .iter()
        .map(|d| {
            let mut value = json!({
                "range": d.range,
                "severity": d.severity.to_lsp(),
                "source": "odata-annotation",
                "message": &*d.message,
            });
            if let (Some(code), Some(object)) = (&d.code, value.as_object_mut()) {
                object.insert("code".to_string(), Value::from(&**code));
            }
            value
        })
        .collect()
}
