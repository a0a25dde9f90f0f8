//! Readers for the flat `ZABBIX_*` override variables.

use std::time::Duration;

use crate::error::ConfigError;

use super::serde::parse_timeout;

/// Value of `key`, `None` when unset or blank.
pub(super) fn env_string(key: &'static str) -> std::result::Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidField {
            field: key,
            message: err.to_string(),
        }),
    }
}

/// Shell-style flag: `1/0`, `true/false`, `yes/no`, `on/off`.
pub(super) fn env_bool(key: &'static str) -> std::result::Result<Option<bool>, ConfigError> {
    env_string(key)?
        .map(|value| {
            parse_flag(&value).ok_or_else(|| ConfigError::InvalidField {
                field: key,
                message: format!("expected a boolean flag, got {value:?}"),
            })
        })
        .transpose()
}

pub(super) fn env_duration(
    key: &'static str,
) -> std::result::Result<Option<Duration>, ConfigError> {
    env_string(key)?
        .map(|value| {
            parse_timeout(&value).map_err(|message| ConfigError::InvalidField {
                field: key,
                message,
            })
        })
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
