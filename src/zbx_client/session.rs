use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::Result;
use crate::error::ZbxError;

use super::models::ApiVersion;
use super::options::ConnectOptions;
use super::rpc;
use super::transport::{HttpTransport, Transport};

/// An authenticated conversation with one Zabbix frontend.
///
/// The token is obtained once while connecting and attached to every call
/// after that. It is never refreshed; an expired token surfaces as an API
/// error. After [`Session::logout`] succeeds, authenticated calls fail with
/// [`ZbxError::LoggedOut`] without reaching the server. Calls are issued one
/// at a time per caller, there is no locking between concurrent callers
/// sharing a session.
pub struct Session {
    transport: Arc<dyn Transport>,
    token: SecretString,
    version: Option<ApiVersion>,
    debug: bool,
    next_id: AtomicU64,
    logged_out: AtomicBool,
}

impl Session {
    /// Connect over HTTP, negotiate the API version and log in.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built, the server is unreachable,
    /// the API version is unsupported (unless `ignore_version` is set), or the
    /// credentials are rejected.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let transport = HttpTransport::new(options)?;
        Self::connect_with(Arc::new(transport), options).await
    }

    /// Same as [`Session::connect`] over a caller supplied transport.
    ///
    /// # Errors
    ///
    /// See [`Session::connect`].
    pub async fn connect_with(
        transport: Arc<dyn Transport>,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let mut session = Self {
            transport,
            token: SecretString::from(String::new()),
            version: None,
            debug: options.debug,
            next_id: AtomicU64::new(1),
            logged_out: AtomicBool::new(false),
        };

        let reported = session.api_version().await?;
        let version = ApiVersion::parse(&reported);
        if !version.is_some_and(ApiVersion::is_supported) {
            if !options.ignore_version {
                return Err(ZbxError::UnsupportedVersion { version: reported }.into());
            }
            warn!(version = %reported, "Zabbix API version is not supported, continuing anyway");
        }
        session.version = version;

        session.token = session.login(options).await?;
        info!(url = %options.url, version = %reported, "logged in to Zabbix API");
        Ok(session)
    }

    /// Version reported by `apiinfo.version`. Does not need a login.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn api_version(&self) -> Result<String> {
        self.call("apiinfo.version", json!({})).await
    }

    /// Version negotiated while connecting, if it could be parsed.
    #[must_use]
    pub const fn version(&self) -> Option<ApiVersion> {
        self.version
    }

    async fn login(&self, options: &ConnectOptions) -> Result<SecretString> {
        let user_field = self
            .version
            .map_or("username", ApiVersion::login_user_field);
        let mut params = Map::new();
        params.insert(user_field.to_string(), Value::String(options.user.clone()));
        params.insert(
            "password".to_string(),
            Value::String(options.password.expose_secret().to_string()),
        );

        let token: String = self.call("user.login", Value::Object(params)).await?;
        if token.is_empty() {
            return Err(ZbxError::InvalidField {
                field: "auth",
                message: "user.login returned an empty token".to_string(),
            }
            .into());
        }
        debug!("auth token acquired");
        Ok(SecretString::from(token))
    }

    /// Invalidate the token on the server.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn logout(&self) -> Result<bool> {
        let done: bool = self.call("user.logout", json!([])).await?;
        if done {
            self.logged_out.store(true, Ordering::Release);
        }
        Ok(done)
    }

    /// Raw authenticated call; the `result` member is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn query(&self, method: &str, params: Value) -> Result<Value> {
        self.call(method, params).await
    }

    pub(crate) async fn call<T>(&self, method: &str, params: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if rpc::requires_auth(method) && self.logged_out.load(Ordering::Acquire) {
            return Err(ZbxError::LoggedOut {
                method: method.to_string(),
            }
            .into());
        }

        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = rpc::build(method, params, request_id, self.token.expose_secret());
        let wire = serde_json::to_value(&request).map_err(|err| ZbxError::Json {
            message: err.to_string(),
        })?;

        if self.debug {
            debug!(
                method,
                request_id,
                request = %rpc::redacted_pretty(&wire),
                "sending zabbix request"
            );
        }

        let started = Instant::now();
        let body = self.transport.send(wire.to_string()).await?;

        if self.debug && rpc::requires_auth(method) {
            debug!(method, request_id, response = %body, "zabbix response");
        }

        let result = rpc::decode(body.as_bytes(), &wire)?;
        debug!(
            method,
            request_id,
            latency_ms = started.elapsed().as_millis(),
            "zabbix call succeeded"
        );

        serde_json::from_value(result).map_err(|err| {
            ZbxError::Json {
                message: format!("unexpected result shape for {method}: {err}"),
            }
            .into()
        })
    }
}
