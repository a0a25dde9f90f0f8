use std::path::Path;

use crate::Result;
use crate::error::Error as ManagerError;
use crate::zbx_client::ConnectOptions;

mod defaults;
mod env;
mod raw;
mod serde;

use self::serde::HumantimeDuration;

/// Settings resolved from the config file and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub zabbix: ConnectOptions,
}

impl Config {
    /// Load configuration from an optional TOML file, `ZBX_MANAGER__*`
    /// variables and the `ZABBIX_*` overrides, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(ManagerError::from)?;
        raw.apply_env_overrides().map_err(ManagerError::from)?;
        raw.validate_and_build()
    }

    #[must_use]
    pub fn into_connect_options(self) -> ConnectOptions {
        self.zabbix
    }
}
