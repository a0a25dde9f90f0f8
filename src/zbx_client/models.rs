use std::fmt::{self, Display};

use serde::Deserialize;

use crate::error::{Error, ZbxError};
use crate::types::Severity;

/// Outcome of a `create`, `update` or `delete` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Exactly one object was touched.
    Id(u64),
    /// Batch call, or a method that only answers true/false.
    Success(bool),
}

impl Mutation {
    #[must_use]
    pub const fn id(self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(id),
            Self::Success(_) => None,
        }
    }
}

/// Result of [`Triggers::safe_update`](super::Triggers::safe_update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeUpdate {
    /// The stored trigger already matches; nothing was written.
    Unchanged(u64),
    /// The old trigger was disabled and a new one created in its place.
    Superseded { old: u64, new: u64 },
}

impl SafeUpdate {
    /// Id of the trigger that is live after the call.
    #[must_use]
    pub const fn current_id(self) -> u64 {
        match self {
            Self::Unchanged(id) | Self::Superseded { new: id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostGroupStatus {
    Existing(u64),
    Created(u64),
}

/// One entry of a best-effort host group reconciliation.
#[derive(Debug)]
pub struct HostGroupOutcome {
    pub name: String,
    pub result: crate::Result<HostGroupStatus>,
}

/// Version string reported by `apiinfo.version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self.major, 1..=6)
    }

    /// `user.login` renamed its `user` parameter to `username` in 5.4.
    #[must_use]
    pub const fn login_user_field(self) -> &'static str {
        if self.major > 5 || (self.major == 5 && self.minor >= 4) {
            "username"
        } else {
            "user"
        }
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Typed view over a `problem.get` row.
#[derive(Debug, Clone)]
pub struct Problem {
    pub event_id: String,
    pub clock: i64,
    pub last_change: i64,
    pub name: String,
    pub severity: Severity,
    pub acknowledged: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProblem {
    #[serde(rename = "eventid")]
    pub(crate) event_id: String,
    #[serde(deserialize_with = "deserialize_i64")]
    pub(crate) clock: i64,
    #[serde(
        default,
        rename = "lastchange",
        deserialize_with = "deserialize_opt_i64"
    )]
    pub(crate) last_change: Option<i64>,
    #[serde(deserialize_with = "deserialize_u8")]
    pub(crate) severity: u8,
    pub(crate) name: String,
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub(crate) acknowledged: bool,
}

impl TryFrom<RawProblem> for Problem {
    type Error = Error;

    fn try_from(value: RawProblem) -> std::result::Result<Self, Error> {
        let severity = Severity::from_zabbix(i64::from(value.severity)).ok_or_else(|| {
            Error::Zabbix(ZbxError::InvalidField {
                field: "severity",
                message: format!("unexpected severity code {}", value.severity),
            })
        })?;
        Ok(Self {
            event_id: value.event_id,
            clock: value.clock,
            last_change: value.last_change.unwrap_or(value.clock),
            name: value.name,
            severity,
            acknowledged: value.acknowledged,
        })
    }
}

fn deserialize_i64<'de, D>(de: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_opt_i64(de)?.ok_or_else(|| serde::de::Error::custom("expected an integer"))
}

fn deserialize_u8<'de, D>(de: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeU8 {
        Int(u8),
        Str(String),
    }

    match MaybeU8::deserialize(de)? {
        MaybeU8::Int(value) => Ok(value),
        MaybeU8::Str(value) => value.parse::<u8>().map_err(serde::de::Error::custom),
    }
}

fn deserialize_opt_i64<'de, D>(de: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeI64 {
        Int(i64),
        Str(String),
        Null,
    }

    match MaybeI64::deserialize(de)? {
        MaybeI64::Int(value) => Ok(Some(value)),
        MaybeI64::Str(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        MaybeI64::Null => Ok(None),
    }
}

fn deserialize_bool<'de, D>(de: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Boolish {
        Bool(bool),
        Int(i64),
        Str(String),
        Null,
    }

    Ok(match Boolish::deserialize(de)? {
        Boolish::Bool(value) => value,
        Boolish::Int(value) => value != 0,
        Boolish::Str(value) => matches!(value.as_str(), "1" | "true" | "TRUE"),
        Boolish::Null => false,
    })
}
