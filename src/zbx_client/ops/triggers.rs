use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::Result;
use crate::error::ZbxError;
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::TRIGGERS;
use crate::zbx_client::fields::{self, Fields, into_fields};
use crate::zbx_client::models::SafeUpdate;
use crate::zbx_client::session::Session;

use super::deref_resource;

const STATUS_DISABLED: &str = "1";

#[derive(Clone)]
pub struct Triggers(Resource);

deref_resource!(Triggers);

impl Triggers {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, TRIGGERS))
    }

    /// Replace a trigger without editing it in place.
    ///
    /// The stored expression is rebuilt from the trigger's functions and
    /// items and compared with the incoming one (host prefixes removed).
    /// When nothing differs the trigger is left alone. Otherwise the old
    /// trigger is disabled, never deleted, and a new trigger is created from
    /// `fields` without the old id.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::MissingIdentifier`] without a `triggerid`, an
    /// invalid field error when the trigger does not exist, and transport or
    /// API errors as-is. A failure after the disable step leaves the old
    /// trigger disabled.
    pub async fn safe_update(&self, fields: Value) -> Result<SafeUpdate> {
        let mut wanted = into_fields(fields)?;
        let id = self.required_id(&wanted)?;

        let rows: Vec<Fields> = self
            .session()
            .call(
                "trigger.get",
                json!({
                    "triggerids": [id.to_string()],
                    "output": "extend",
                    "selectItems": "extend",
                    "selectFunctions": "extend",
                }),
            )
            .await?;
        let mut stored = rows
            .into_iter()
            .find(|row| self.row_id(row).is_ok_and(|row_id| row_id == id))
            .ok_or_else(|| ZbxError::InvalidField {
                field: "triggerid",
                message: format!("trigger {id} not found"),
            })?;

        let items = take_array(&mut stored, "items");
        let functions = take_array(&mut stored, "functions");
        let rebuilt = stored
            .get("expression")
            .and_then(Value::as_str)
            .map(|expr| expand_functions(expr, &items, &functions));
        if let Some(rebuilt) = rebuilt {
            stored.insert("expression".into(), Value::String(rebuilt));
        }

        wanted.remove("templateid");
        let mut comparable = wanted.clone();
        let stripped = comparable
            .get("expression")
            .and_then(Value::as_str)
            .map(strip_host_prefixes);
        if let Some(stripped) = stripped {
            comparable.insert("expression".into(), Value::String(stripped));
        }

        if fields::matches(&stored, &comparable) {
            debug!(triggerid = id, "trigger unchanged, skipping safe_update");
            return Ok(SafeUpdate::Unchanged(id));
        }

        let _: Value = self
            .session()
            .call(
                "trigger.update",
                json!([{ "triggerid": id.to_string(), "status": STATUS_DISABLED }]),
            )
            .await?;
        info!(triggerid = id, "trigger disabled, creating replacement");

        wanted.remove("triggerid");
        let created = self.create(Value::Object(wanted)).await?;
        let new = created.id().ok_or_else(|| ZbxError::InvalidField {
            field: "result",
            message: format!("expected one trigger id, got {created:?}"),
        })?;
        Ok(SafeUpdate::Superseded { old: id, new })
    }
}

fn take_array(row: &mut Fields, key: &str) -> Vec<Value> {
    match row.remove(key) {
        Some(Value::Array(values)) => values,
        _ => Vec::new(),
    }
}

/// Substitute each `{functionid}` placeholder of a stored expression with
/// `{item_key.function(parameter)}`.
fn expand_functions(expression: &str, items: &[Value], functions: &[Value]) -> String {
    let mut out = expression.to_string();
    for function in functions {
        let Some(function_id) = function.get("functionid").and_then(Value::as_str) else {
            continue;
        };
        let item = function
            .get("itemid")
            .and_then(|itemid| items.iter().find(|item| item.get("itemid") == Some(itemid)))
            .or_else(|| items.first());
        let Some(key) = item.and_then(|item| item.get("key_")).and_then(Value::as_str) else {
            continue;
        };
        let name = function.get("function").and_then(Value::as_str).unwrap_or_default();
        let parameter = function
            .get("parameter")
            .and_then(Value::as_str)
            .unwrap_or_default();
        out = out.replace(
            &format!("{{{function_id}}}"),
            &format!("{{{key}.{name}({parameter})}}"),
        );
    }
    out
}

/// Turn `{host:key.func(param)}` into `{key.func(param)}`. User macros
/// (`{$NAME:context}`) are kept as they are. A colon only ends a host name
/// when it comes before the item key's parameters, so `nodata(5m:now-1h)`
/// and `key[a:b]` are left alone.
fn strip_host_prefixes(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut rest = expression;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..=open]);
        rest = &rest[open + 1..];
        if rest.starts_with('$') {
            continue;
        }
        let stop = rest.find([':', '}', '(', '[']);
        if let Some(colon) = stop.filter(|&at| rest[at..].starts_with(':')) {
            rest = &rest[colon + 1..];
        }
    }
    out.push_str(rest);
    out
}
