use std::time::Duration;

use humantime::parse_duration;
use serde::Deserialize;
use serde_with::DeserializeAs;

/// Accepts `"90s"`-style strings and bare integers taken as seconds.
///
/// The environment source parses `ZBX_MANAGER__ZABBIX__TIMEOUT=60` into an
/// integer before it reaches the deserializer.
pub(super) struct HumantimeDuration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl<'de> DeserializeAs<'de, Duration> for HumantimeDuration {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
            RawDuration::Text(raw) => parse_timeout(&raw).map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a timeout given either as plain seconds or in humantime notation.
pub(super) fn parse_timeout(raw: &str) -> std::result::Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    parse_duration(raw).map_err(|err| format!("{raw:?} is not a duration: {err}"))
}
