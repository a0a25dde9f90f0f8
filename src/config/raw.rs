use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use url::Url;

use crate::Result;
use crate::error::ConfigError;
use crate::zbx_client::ConnectOptions;

use super::defaults::{default_timeout, default_tls_verify};
use super::env::{env_bool, env_duration, env_string};
use super::{Config, HumantimeDuration};

const ENV_PREFIX: &str = "ZBX_MANAGER";

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let path = path.as_ref();
    let mut builder = ::config::Config::builder();
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            builder = builder.add_source(::config::File::from_str(
                &contents,
                ::config::FileFormat::Toml,
            ));
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::FileRead {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) zabbix: RawZabbix,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawZabbix {
    pub(super) url: Option<String>,
    pub(super) user: Option<String>,
    pub(super) password: Option<String>,
    pub(super) http_user: Option<String>,
    pub(super) http_password: Option<String>,
    #[serde(default = "default_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) timeout: Duration,
    #[serde(default)]
    pub(super) debug: bool,
    #[serde(default)]
    pub(super) ignore_version: bool,
    #[serde(default)]
    pub(super) no_proxy: bool,
    #[serde(default = "default_tls_verify")]
    pub(super) tls_verify: bool,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        let zabbix = &mut self.zabbix;
        if let Some(url) = env_string("ZABBIX_HOST_URL")? {
            zabbix.url = Some(url);
        }
        if let Some(user) = env_string("ZABBIX_USERNAME")? {
            zabbix.user = Some(user);
        }
        if let Some(password) = env_string("ZABBIX_PASSWORD")? {
            zabbix.password = Some(password);
        }
        if let Some(user) = env_string("ZABBIX_HTTP_USER")? {
            zabbix.http_user = Some(user);
        }
        if let Some(password) = env_string("ZABBIX_HTTP_PASSWORD")? {
            zabbix.http_password = Some(password);
        }
        if let Some(timeout) = env_duration("ZABBIX_TIMEOUT")? {
            zabbix.timeout = timeout;
        }
        if let Some(debug) = env_bool("ZABBIX_DEBUG")? {
            zabbix.debug = debug;
        }
        if let Some(ignore) = env_bool("ZABBIX_IGNORE_VERSION")? {
            zabbix.ignore_version = ignore;
        }
        if let Some(no_proxy) = env_bool("ZABBIX_NO_PROXY")? {
            zabbix.no_proxy = no_proxy;
        }
        if let Some(verify) = env_bool("ZABBIX_TLS_VERIFY")? {
            zabbix.tls_verify = verify;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let zabbix = self.zabbix;
        let url_str = zabbix.url.ok_or(ConfigError::MissingField {
            field: "zabbix.url",
        })?;
        let url = Url::parse(&url_str).map_err(|err| ConfigError::InvalidField {
            field: "zabbix.url",
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidField {
                field: "zabbix.url",
                message: format!("unsupported scheme {}", url.scheme()),
            }
            .into());
        }

        let user = zabbix
            .user
            .filter(|user| !user.trim().is_empty())
            .ok_or(ConfigError::MissingField {
                field: "zabbix.user",
            })?;
        let password = zabbix.password.unwrap_or_default();

        if zabbix.timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "zabbix.timeout",
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        let mut options = ConnectOptions::new(url, user, password)
            .with_timeout(zabbix.timeout)
            .with_debug(zabbix.debug)
            .with_ignore_version(zabbix.ignore_version)
            .with_no_proxy(zabbix.no_proxy)
            .with_tls_verify(zabbix.tls_verify);

        match (zabbix.http_user, zabbix.http_password) {
            (Some(http_user), http_password) => {
                options = options.with_basic_auth(http_user, http_password.unwrap_or_default());
            }
            (None, Some(_)) => {
                return Err(ConfigError::InvalidField {
                    field: "zabbix.http_password",
                    message: "http_password requires http_user".to_string(),
                }
                .into());
            }
            (None, None) => {}
        }

        Ok(Config { zabbix: options })
    }
}

impl Default for RawZabbix {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            password: None,
            http_user: None,
            http_password: None,
            timeout: default_timeout(),
            debug: false,
            ignore_version: false,
            no_proxy: false,
            tls_verify: default_tls_verify(),
        }
    }
}
