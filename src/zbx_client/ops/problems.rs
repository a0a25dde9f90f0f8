use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::Result;
use crate::error::{Error, ZbxError};
use crate::types::{AckFilter, Severity, SortOrder};
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::PROBLEMS;
use crate::zbx_client::fields::{Fields, parse_id};
use crate::zbx_client::models::{Problem, RawProblem};
use crate::zbx_client::resource::id_list;
use crate::zbx_client::session::Session;

use super::deref_resource;

const ACTION_CLOSE: u8 = 1;
const ACTION_ACK: u8 = 2;
const ACTION_MESSAGE: u8 = 4;
const ACTION_UNACK: u8 = 16;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TagOperator {
    #[default]
    Like,
    Equal,
    NotLike,
    NotEqual,
    Exists,
    NotExists,
}

impl TagOperator {
    const fn code(self) -> u8 {
        match self {
            Self::Like => 0,
            Self::Equal => 1,
            Self::NotLike => 2,
            Self::NotEqual => 3,
            Self::Exists => 4,
            Self::NotExists => 5,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagFilter {
    pub tag: String,
    pub value: String,
    pub operator: TagOperator,
}

/// Optional filters for `problem.get`.
///
/// Empty lists and `None` values are left out of the request entirely; the
/// server never sees an explicit `null` for an unset filter.
#[derive(Clone, Debug)]
pub struct ProblemFilter {
    pub name: Option<String>,
    pub event_ids: Vec<u64>,
    pub group_ids: Vec<u64>,
    pub host_ids: Vec<u64>,
    pub object_ids: Vec<u64>,
    pub tags: Vec<TagFilter>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_till: Option<DateTime<Utc>>,
    pub eventid_from: Option<u64>,
    pub eventid_till: Option<u64>,
    pub severities: Vec<Severity>,
    pub acknowledged: AckFilter,
    /// Include problems resolved recently, not only open ones.
    pub recent: bool,
    pub sort_fields: Vec<String>,
    pub sort_order: SortOrder,
    pub limit: Option<u32>,
}

impl Default for ProblemFilter {
    fn default() -> Self {
        Self {
            name: None,
            event_ids: Vec::new(),
            group_ids: Vec::new(),
            host_ids: Vec::new(),
            object_ids: Vec::new(),
            tags: Vec::new(),
            time_from: None,
            time_till: None,
            eventid_from: None,
            eventid_till: None,
            severities: Vec::new(),
            acknowledged: AckFilter::All,
            recent: false,
            sort_fields: vec!["eventid".to_string()],
            sort_order: SortOrder::Desc,
            limit: None,
        }
    }
}

impl ProblemFilter {
    pub(crate) fn to_params(&self, count_only: bool) -> Value {
        let mut params = Map::new();
        if let Some(name) = &self.name {
            params.insert("filter".into(), json!({ "name": name }));
        }
        for (key, ids) in [
            ("eventids", &self.event_ids),
            ("groupids", &self.group_ids),
            ("hostids", &self.host_ids),
            ("objectids", &self.object_ids),
        ] {
            if !ids.is_empty() {
                params.insert(key.into(), id_list(ids));
            }
        }
        if !self.tags.is_empty() {
            let tags: Vec<Value> = self
                .tags
                .iter()
                .map(|t| json!({ "tag": t.tag, "value": t.value, "operator": t.operator.code() }))
                .collect();
            params.insert("tags".into(), Value::Array(tags));
        }
        if let Some(from) = self.time_from {
            params.insert("time_from".into(), json!(from.timestamp()));
        }
        if let Some(till) = self.time_till {
            params.insert("time_till".into(), json!(till.timestamp()));
        }
        if let Some(from) = self.eventid_from {
            params.insert("eventid_from".into(), json!(from.to_string()));
        }
        if let Some(till) = self.eventid_till {
            params.insert("eventid_till".into(), json!(till.to_string()));
        }
        if !self.severities.is_empty() {
            let codes: Vec<i64> = self.severities.iter().map(|s| s.as_zabbix_code()).collect();
            params.insert("severities".into(), json!(codes));
        }
        if let Some(acked) = self.acknowledged.as_param() {
            params.insert("acknowledged".into(), json!(acked));
        }
        params.insert("recent".into(), json!(self.recent));

        if count_only {
            params.insert("countOutput".into(), json!(true));
            return Value::Object(params);
        }

        params.insert("sortfield".into(), json!(self.sort_fields));
        params.insert("sortorder".into(), json!(self.sort_order.as_str()));
        if let Some(limit) = self.limit {
            params.insert("limit".into(), json!(limit));
        }
        params.insert("output".into(), json!("extend"));
        params.insert("selectAcknowledges".into(), json!("extend"));
        params.insert("selectTags".into(), json!("extend"));
        params.insert("selectSuppressionData".into(), json!("extend"));
        Value::Object(params)
    }
}

/// Problems are read and acknowledged, never created or updated directly.
#[derive(Clone)]
pub struct Problems(Resource);

deref_resource!(Problems);

impl Problems {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, PROBLEMS))
    }

    /// Full problem rows, with acknowledges, tags and suppression data.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn get_full_data(&self, filter: &ProblemFilter) -> Result<Vec<Fields>> {
        self.session()
            .call("problem.get", filter.to_params(false))
            .await
    }

    /// Every open problem.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn all(&self) -> Result<Vec<Fields>> {
        self.get_full_data(&ProblemFilter::default()).await
    }

    /// Problems as typed rows.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is, or an invalid field error when
    /// a row carries an unknown severity.
    pub async fn list(&self, filter: &ProblemFilter) -> Result<Vec<Problem>> {
        let raw: Vec<RawProblem> = self
            .session()
            .call("problem.get", filter.to_params(false))
            .await?;
        raw.into_iter()
            .map(Problem::try_from)
            .collect::<std::result::Result<Vec<_>, Error>>()
    }

    /// Number of problems matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn count(&self, filter: &ProblemFilter) -> Result<u64> {
        let raw: Value = self
            .session()
            .call("problem.get", filter.to_params(true))
            .await?;
        parse_id(&raw).ok_or_else(|| {
            ZbxError::InvalidField {
                field: "result",
                message: format!("expected a count, got {raw}"),
            }
            .into()
        })
    }

    /// Acknowledge events, optionally closing them and leaving a message.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn acknowledge(
        &self,
        event_ids: &[u64],
        close: bool,
        message: Option<&str>,
    ) -> Result<bool> {
        let action = if close { ACTION_ACK | ACTION_CLOSE } else { ACTION_ACK };
        self.event_update(event_ids, action, message).await
    }

    /// Withdraw an acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn unacknowledge(&self, event_ids: &[u64], message: Option<&str>) -> Result<bool> {
        self.event_update(event_ids, ACTION_UNACK, message).await
    }

    async fn event_update(
        &self,
        event_ids: &[u64],
        action: u8,
        message: Option<&str>,
    ) -> Result<bool> {
        let mut params = json!({
            "eventids": id_list(event_ids),
            "action": action,
        });
        if let Some(msg) = message.filter(|msg| !msg.is_empty()) {
            params["message"] = json!(msg);
            params["action"] = json!(action | ACTION_MESSAGE);
        }
        let result: Fields = self.session().call("event.acknowledge", params).await?;
        Ok(result
            .get("eventids")
            .and_then(|ids| ids.as_array())
            .is_some_and(|ids| !ids.is_empty()))
    }
}
