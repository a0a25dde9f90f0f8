use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AckFilter {
    Acked,
    Unacked,
    #[default]
    All,
}

impl AckFilter {
    /// Value for the `acknowledged` filter of `problem.get`; `None` means the
    /// parameter is left out.
    pub const fn as_param(self) -> Option<bool> {
        match self {
            Self::Acked => Some(true),
            Self::Unacked => Some(false),
            Self::All => None,
        }
    }
}

impl FromStr for AckFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ack" | "acked" => Ok(Self::Acked),
            "unack" | "unacked" => Ok(Self::Unacked),
            "all" => Ok(Self::All),
            other => Err(format!("unknown ack filter: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    NotClassified,
    Info,
    Warning,
    Average,
    High,
    Disaster,
}

impl Severity {
    pub const fn from_zabbix(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotClassified),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Average),
            4 => Some(Self::High),
            5 => Some(Self::Disaster),
            _ => None,
        }
    }

    /// This severity and every higher one.
    pub fn at_least(self) -> Vec<Self> {
        (0..=5)
            .filter_map(Self::from_zabbix)
            .filter(|severity| *severity >= self)
            .collect()
    }

    pub const fn as_zabbix_code(self) -> i64 {
        match self {
            Self::NotClassified => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Average => 3,
            Self::High => 4,
            Self::Disaster => 5,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotClassified => "Not classified",
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Average => "Average",
            Self::High => "High",
            Self::Disaster => "Disaster",
        })
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "not_classified" | "notclassified" | "none" => Ok(Self::NotClassified),
            "info" | "information" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "average" => Ok(Self::Average),
            "high" => Ok(Self::High),
            "disaster" => Ok(Self::Disaster),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
