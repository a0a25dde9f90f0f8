use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ZbxError;

const BODY_PREVIEW_LIMIT: usize = 256;
const JSONRPC_VERSION: &str = "2.0";
const REDACTED: &str = "***";

/// Methods the server accepts without an auth token.
pub(crate) const UNAUTHENTICATED_METHODS: [&str; 2] = ["apiinfo.version", "user.login"];

#[derive(Debug, Deserialize)]
pub(super) struct RpcEnvelope {
    #[allow(dead_code)]
    pub(crate) jsonrpc: Option<String>,
    /// `Some(Value::Null)` for `"result": null`, `None` only when the key is absent.
    #[serde(default, deserialize_with = "present")]
    pub(crate) result: Option<Value>,
    pub(crate) error: Option<RpcError>,
    #[allow(dead_code)]
    pub(crate) id: Option<Value>,
}

fn present<'de, D>(de: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub(super) struct RpcError {
    pub(crate) code: i64,
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) data: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub(crate) method: &'a str,
    pub(crate) params: Value,
    pub(crate) id: u64,
    pub(crate) jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) auth: Option<&'a str>,
}

pub(crate) fn requires_auth(method: &str) -> bool {
    !UNAUTHENTICATED_METHODS.contains(&method)
}

/// Wrap a call into a JSON-RPC 2.0 request. The token is attached unless the
/// method is one of [`UNAUTHENTICATED_METHODS`].
pub(crate) fn build<'a>(method: &'a str, params: Value, id: u64, token: &'a str) -> RpcRequest<'a> {
    RpcRequest {
        method,
        params,
        id,
        jsonrpc: JSONRPC_VERSION,
        auth: requires_auth(method).then_some(token),
    }
}

/// Unwrap a response body into its `result`, or classify the failure.
///
/// `sent` is the request as it went on the wire; it is echoed (redacted) into
/// API errors so the caller can see what the server rejected.
pub(super) fn decode(body: &[u8], sent: &Value) -> Result<Value, ZbxError> {
    let envelope: RpcEnvelope = serde_json::from_slice(body).map_err(|err| ZbxError::Json {
        message: format!(
            "error decoding response body: {err}; body preview: {}",
            body_preview(body)
        ),
    })?;

    if let Some(err) = envelope.error {
        let data = match err.data {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        return Err(ZbxError::Api {
            code: err.code,
            message: err.message,
            data,
            request: redacted_pretty(sent),
        });
    }

    envelope
        .result
        .ok_or(ZbxError::MissingField { field: "result" })
}

/// Pretty-print a request with every `password` inside `params` and the auth
/// token masked.
pub(crate) fn redacted_pretty(request: &Value) -> String {
    let mut copy = request.clone();
    if let Some(obj) = copy.as_object_mut() {
        if let Some(params) = obj.get_mut("params") {
            mask_passwords(params);
        }
        if let Some(auth) = obj.get_mut("auth") {
            if !auth.is_null() {
                *auth = Value::String(REDACTED.to_string());
            }
        }
    }
    serde_json::to_string_pretty(&copy).unwrap_or_else(|_| copy.to_string())
}

fn mask_passwords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if key == "password" {
                    *inner = Value::String(REDACTED.to_string());
                } else {
                    mask_passwords(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_passwords),
        _ => {}
    }
}

pub(super) fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&body[..end]).to_string();
    if body.len() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview.replace('\n', "\\n")
}
