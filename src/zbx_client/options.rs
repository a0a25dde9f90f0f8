use std::time::Duration;

use secrecy::SecretString;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to open a session against a Zabbix frontend.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Full JSON-RPC endpoint, e.g. `https://zbx.example.com/api_jsonrpc.php`.
    pub url: Url,
    pub user: String,
    pub password: SecretString,
    /// HTTP basic auth in front of the frontend, if any.
    pub http_user: Option<String>,
    pub http_password: Option<SecretString>,
    /// Applied to connection establishment and to the whole request.
    pub timeout: Duration,
    /// Log request and response bodies (secrets masked).
    pub debug: bool,
    /// Only warn when the server reports an unsupported API version.
    pub ignore_version: bool,
    /// Never route through a proxy, even when `http_proxy` is set.
    pub no_proxy: bool,
    /// Explicit proxy; when unset the `http_proxy` environment variable is used.
    pub proxy: Option<Url>,
    /// Validate server certificates. Off by default for self-signed frontends.
    pub tls_verify: bool,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(url: Url, user: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            url,
            user: user.into(),
            password: password.into(),
            http_user: None,
            http_password: None,
            timeout: DEFAULT_TIMEOUT,
            debug: false,
            ignore_version: false,
            no_proxy: false,
            proxy: None,
            tls_verify: false,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_basic_auth(
        mut self,
        user: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        self.http_user = Some(user.into());
        self.http_password = Some(password.into());
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn with_ignore_version(mut self, ignore: bool) -> Self {
        self.ignore_version = ignore;
        self
    }

    #[must_use]
    pub const fn with_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }

    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }
}
