//! Helpers over the untyped JSON objects the API trades in.

use serde_json::{Map, Value};

use crate::error::ZbxError;

/// Field set of a single Zabbix object.
pub type Fields = Map<String, Value>;

pub(crate) fn into_fields(value: Value) -> Result<Fields, ZbxError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ZbxError::InvalidParams {
            message: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Layer caller fields over type defaults. Caller keys replace default keys
/// wholesale, nested objects are not merged.
pub(crate) fn merge_defaults(defaults: Fields, fields: Fields) -> Fields {
    let mut merged = defaults;
    merged.extend(fields);
    merged
}

/// Read a surrogate id that the server may send as a string or a number.
pub(crate) fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decide whether `current` (as stored on the server) already holds every
/// value of `wanted`.
///
/// Only keys present on both sides are compared. Values are compared on
/// their rendered form, so `3` and `"3"` are equal and `null` equals `""`.
pub(crate) fn matches(current: &Fields, wanted: &Fields) -> bool {
    wanted.iter().all(|(key, value)| {
        current
            .get(key)
            .is_none_or(|stored| normalize(stored) == normalize(value))
    })
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(_) => value.clone(),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect(),
        ),
    }
}

/// Render a value the way it is compared, for lookups by natural key.
pub(crate) fn same_scalar(a: &Value, b: &Value) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{Fields, into_fields, matches, merge_defaults, parse_id};

    fn obj(value: Value) -> Fields {
        into_fields(value).unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn caller_values_win_over_defaults() {
        let merged = merge_defaults(
            obj(json!({"status": 0, "inventory_mode": 1, "groups": []})),
            obj(json!({"status": 1, "host": "web01"})),
        );
        assert_eq!(merged["status"], 1);
        assert_eq!(merged["inventory_mode"], 1);
        assert_eq!(merged["host"], "web01");
    }

    #[test]
    fn numbers_and_strings_compare_by_rendered_form() {
        let stored = obj(json!({"hostid": "10105", "status": "0", "name": "web01"}));
        assert!(matches(&stored, &obj(json!({"hostid": 10105, "status": 0}))));
        assert!(!matches(&stored, &obj(json!({"hostid": 10105, "status": 1}))));
    }

    #[test]
    fn keys_missing_on_either_side_are_ignored() {
        let stored = obj(json!({"hostid": "10105", "description": ""}));
        assert!(matches(
            &stored,
            &obj(json!({"hostid": "10105", "groups": [{"groupid": 2}]}))
        ));
    }

    #[test]
    fn nested_values_compare_structurally() {
        let stored = obj(json!({"tags": [{"tag": "env", "value": "prod"}]}));
        assert!(matches(
            &stored,
            &obj(json!({"tags": [{"tag": "env", "value": "prod"}]}))
        ));
        assert!(!matches(
            &stored,
            &obj(json!({"tags": [{"tag": "env", "value": "dev"}]}))
        ));
    }

    #[test]
    fn null_matches_empty_string() {
        let stored = obj(json!({"description": ""}));
        assert!(matches(&stored, &obj(json!({"description": null}))));
    }

    #[test]
    fn ids_parse_from_strings_and_numbers() {
        assert_eq!(parse_id(&json!("10084")), Some(10084));
        assert_eq!(parse_id(&json!(42)), Some(42));
        assert_eq!(parse_id(&json!("abc")), None);
        assert_eq!(parse_id(&json!(null)), None);
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(into_fields(json!(["host"])).is_err());
    }
}
