use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Zabbix(#[from] ZbxError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ZbxError {
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid JSON payload: {message}")]
    Json { message: String },
    #[error("invalid field {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("invalid request parameters: {message}")]
    InvalidParams { message: String },
    #[error("Zabbix API error {code}: {message} ({data})\non request:\n{request}")]
    Api {
        code: i64,
        message: String,
        data: String,
        request: String,
    },
    #[error("Zabbix API version {version} is not supported")]
    UnsupportedVersion { version: String },
    #[error("identifier field {field} not supplied")]
    MissingIdentifier { field: String },
    #[error("missing field in API response: {field}")]
    MissingField { field: &'static str },
    #[error("session is logged out, {method} was not sent")]
    LoggedOut { method: String },
}

impl From<reqwest::Error> for ZbxError {
    fn from(source: reqwest::Error) -> Self {
        Self::Request { source }
    }
}

impl Error {
    /// Whether the failure happened below the JSON-RPC layer: a refused
    /// connection, a timeout, or a non-200 answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Zabbix(ZbxError::Request { .. } | ZbxError::HttpStatus { .. })
        )
    }

    /// The JSON-RPC error code when the server rejected the call.
    #[must_use]
    pub const fn api_code(&self) -> Option<i64> {
        match self {
            Self::Zabbix(ZbxError::Api { code, .. }) => Some(*code),
            _ => None,
        }
    }
}
