//! Reads captured bindings out of structural-matcher match records.
//!
//! ast-grep has emitted two shapes for `metaVariables` over its lifetime:
//!
//! - flat (older releases): `{"NAME": "foo"}` or `{"NAME": {"text": "foo"}}`
//! - nested (current): `{"single": {"NAME": {"text": "foo", "range": {..}}},
//!   "multi": {"ARGS": [{"text": "a", ..}, {"text": ",", ..}]}, "transformed": {}}`
//!
//! Everything that reads a binding goes through this module so a future
//! shape change is handled in one place.

use serde_json::Value;

const SINGLE: &str = "single";
const MULTI: &str = "multi";

/// The binding map of a record. Accepts a whole match record (bindings under
/// `metaVariables`) or a bare binding map.
fn bindings(record: &Value) -> &Value {
    record.get("metaVariables").unwrap_or(record)
}

/// Text captured for `var`, nested shape first, then flat.
pub fn resolve(record: &Value, var: &str) -> Option<String> {
    let meta = bindings(record);
    if let Some(node) = meta.get(SINGLE).and_then(|single| single.get(var)) {
        return binding_text(node);
    }
    meta.get(var).and_then(binding_text)
}

/// Texts captured by a multi-node variable (`$$$ARGS`), separators dropped.
pub fn resolve_multi(record: &Value, var: &str) -> Vec<String> {
    let meta = bindings(record);
    let node = meta
        .get(MULTI)
        .and_then(|multi| multi.get(var))
        .or_else(|| meta.get(var));
    let Some(node) = node else {
        return Vec::new();
    };
    match node {
        Value::Array(items) => items
            .iter()
            .filter_map(binding_text)
            .filter(|text| !is_separator(text))
            .collect(),
        other => binding_text(other).into_iter().collect(),
    }
}

/// 1-based start line. The matcher reports 0-based rows.
pub fn start_line(record: &Value) -> usize {
    record
        .get("range")
        .and_then(|range| range.get("start"))
        .and_then(|start| start.get("line"))
        .and_then(Value::as_u64)
        .map(|line| line as usize + 1)
        .unwrap_or(1)
}

/// 1-based end line; falls back to the start line when the record has no end.
pub fn end_line(record: &Value) -> usize {
    record
        .get("range")
        .and_then(|range| range.get("end"))
        .and_then(|end| end.get("line"))
        .and_then(Value::as_u64)
        .map(|line| line as usize + 1)
        .unwrap_or_else(|| start_line(record))
}

/// Full source text of the matched node.
pub fn matched_text(record: &Value) -> &str {
    record.get("text").and_then(Value::as_str).unwrap_or("")
}

fn binding_text(node: &Value) -> Option<String> {
    match node {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map.get("text").and_then(Value::as_str).map(str::to_string),
        Value::Null => None,
        Value::Array(_) => None,
        other => Some(other.to_string()),
    }
}

fn is_separator(text: &str) -> bool {
    matches!(text.trim(), "," | ";" | "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_flat_bindings() {
        assert_eq!(resolve(&json!({"PACKAGE": "os"}), "PACKAGE").as_deref(), Some("os"));
        assert_eq!(
            resolve(&json!({"PACKAGE": {"text": "os"}}), "PACKAGE").as_deref(),
            Some("os")
        );
    }

    #[test]
    fn resolves_nested_bindings() {
        let record = json!({
            "single": {
                "PACKAGE": {
                    "text": "os",
                    "range": {"start": {"line": 0, "column": 7}, "end": {"line": 0, "column": 9}}
                }
            }
        });
        assert_eq!(resolve(&record, "PACKAGE").as_deref(), Some("os"));
    }

    #[test]
    fn nested_shape_wins_over_flat() {
        let record = json!({
            "single": {"NAME": {"text": "nested"}},
            "NAME": "flat"
        });
        assert_eq!(resolve(&record, "NAME").as_deref(), Some("nested"));
    }

    #[test]
    fn reads_bindings_under_meta_variables() {
        let record = json!({
            "text": "export function load() {}",
            "range": {"start": {"line": 4, "column": 0}},
            "metaVariables": {"single": {"NAME": {"text": "load"}}, "multi": {}}
        });
        assert_eq!(resolve(&record, "NAME").as_deref(), Some("load"));
        assert_eq!(start_line(&record), 5);
        assert_eq!(end_line(&record), 5);
        assert!(matched_text(&record).starts_with("export"));
    }

    #[test]
    fn unbound_variable_is_none() {
        assert_eq!(resolve(&json!({"single": {}}), "NAME"), None);
        assert_eq!(resolve(&json!({}), "NAME"), None);
        assert_eq!(resolve(&json!({"NAME": null}), "NAME"), None);
    }

    #[test]
    fn multi_bindings_drop_separators() {
        let nested = json!({"multi": {"PARAMS": [
            {"text": "a: number"}, {"text": ","}, {"text": "b"}
        ]}});
        assert_eq!(resolve_multi(&nested, "PARAMS"), vec!["a: number", "b"]);
        let flat = json!({"PARAMS": ["a", ",", "b"]});
        assert_eq!(resolve_multi(&flat, "PARAMS"), vec!["a", "b"]);
        assert!(resolve_multi(&json!({}), "PARAMS").is_empty());
    }
}
