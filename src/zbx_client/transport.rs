use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::Result;
use crate::error::{ConfigError, ZbxError};

use super::options::ConnectOptions;

const CORRELATION_HEADER: &str = "x-correlation-id";
const PROXY_ENV_VARS: [&str; 2] = ["http_proxy", "HTTP_PROXY"];

/// Moves one serialized JSON-RPC request to the server and hands back the raw
/// answer. Anything other than HTTP 200 is a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: String) -> std::result::Result<String, ZbxError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    url: Url,
    basic_auth: Option<(String, SecretString)>,
}

impl HttpTransport {
    /// Build the HTTP client for the given connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the underlying HTTP
    /// client fails to build.
    pub fn new(options: &ConnectOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json-rpc"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.timeout)
            .timeout(options.timeout)
            .user_agent(concat!("zbx-manager/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!options.tls_verify);

        let proxy = match (&options.proxy, options.no_proxy) {
            (_, true) => None,
            (Some(explicit), false) => Some(explicit.clone()),
            (None, false) => proxy_from_env()?,
        };
        if options.no_proxy {
            builder = builder.no_proxy();
        } else if let Some(proxy_url) = proxy {
            debug!(proxy = %redact_userinfo(&proxy_url), "routing zabbix traffic through proxy");
            builder = builder.proxy(build_proxy(proxy_url)?);
        }

        let http = builder
            .build()
            .map_err(|err| ZbxError::Client { source: err })?;

        let basic_auth = options.http_user.clone().map(|user| {
            let password = options
                .http_password
                .clone()
                .unwrap_or_else(|| SecretString::from(String::new()));
            (user, password)
        });

        Ok(Self {
            http,
            url: options.url.clone(),
            basic_auth,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: String) -> std::result::Result<String, ZbxError> {
        let correlation_id = Uuid::now_v7().to_string();
        let started = Instant::now();

        let mut request = self
            .http
            .post(self.url.clone())
            .header(CORRELATION_HEADER, &correlation_id)
            .body(body);
        if let Some((user, password)) = &self.basic_auth {
            request = request.basic_auth(user, Some(password.expose_secret()));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(
            %correlation_id,
            status = %status,
            latency_ms = started.elapsed().as_millis(),
            "zabbix round trip finished"
        );

        if status != StatusCode::OK {
            return Err(ZbxError::HttpStatus { status, body: text });
        }
        Ok(text)
    }
}

fn proxy_from_env() -> std::result::Result<Option<Url>, ConfigError> {
    for key in PROXY_ENV_VARS {
        match std::env::var(key) {
            Ok(value) if !value.trim().is_empty() => {
                return Url::parse(value.trim())
                    .map(Some)
                    .map_err(|err| ConfigError::InvalidField {
                        field: "http_proxy",
                        message: err.to_string(),
                    });
            }
            Ok(_) | Err(std::env::VarError::NotPresent) => {}
            Err(err) => return Err(ConfigError::Other(err.to_string())),
        }
    }
    Ok(None)
}

fn build_proxy(mut url: Url) -> std::result::Result<reqwest::Proxy, ZbxError> {
    let user = url.username().to_string();
    let password = url.password().map(str::to_string);
    let _ = url.set_username("");
    let _ = url.set_password(None);

    let mut proxy =
        reqwest::Proxy::all(url.as_str()).map_err(|err| ZbxError::Client { source: err })?;
    if !user.is_empty() {
        proxy = proxy.basic_auth(&user, password.as_deref().unwrap_or_default());
    }
    Ok(proxy)
}

fn redact_userinfo(url: &Url) -> String {
    let mut shown = url.clone();
    if shown.password().is_some() {
        let _ = shown.set_password(Some("***"));
    }
    shown.to_string()
}
