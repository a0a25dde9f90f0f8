use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::Result;
use crate::error::ZbxError;
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::HOSTGROUPS;
use crate::zbx_client::fields::Fields;
use crate::zbx_client::models::{HostGroupOutcome, HostGroupStatus, Mutation};
use crate::zbx_client::session::Session;

use super::deref_resource;

#[derive(Clone)]
pub struct HostGroups(Resource);

deref_resource!(HostGroups);

impl HostGroups {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, HOSTGROUPS))
    }

    /// Ids of the groups that exist among `names`, fetched in one call.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn get_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<BTreeMap<String, u64>> {
        let names: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
        let rows: Vec<Fields> = self
            .session()
            .call(
                "hostgroup.get",
                json!({
                    "output": ["groupid", "name"],
                    "filter": { "name": names },
                }),
            )
            .await?;

        let mut found = BTreeMap::new();
        for row in &rows {
            if let Some(name) = row.get("name").and_then(|v| v.as_str()) {
                found.insert(name.to_string(), self.row_id(row)?);
            }
        }
        Ok(found)
    }

    /// Make sure every group in `names` exists.
    ///
    /// Existing groups are resolved with a single lookup, missing ones are
    /// created one by one. A failed create is logged and reported in its
    /// outcome; it never stops the remaining names from being processed.
    /// Duplicate names are handled once.
    ///
    /// # Errors
    ///
    /// Only the initial lookup can fail the call as a whole.
    pub async fn get_or_create_hostgroups<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<HostGroupOutcome>> {
        let mut wanted: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !wanted.contains(&name) {
                wanted.push(name);
            }
        }

        let existing = self.get_ids(wanted.as_slice()).await?;
        let mut outcomes = Vec::with_capacity(wanted.len());
        for name in wanted {
            let result = match existing.get(name) {
                Some(id) => Ok(HostGroupStatus::Existing(*id)),
                None => self.create_group(name).await,
            };
            match &result {
                Ok(HostGroupStatus::Created(id)) => info!(group = name, id, "host group created"),
                Ok(HostGroupStatus::Existing(_)) => {}
                Err(err) => warn!(group = name, error = %err, "host group creation failed, continuing"),
            }
            outcomes.push(HostGroupOutcome {
                name: name.to_string(),
                result,
            });
        }
        Ok(outcomes)
    }

    async fn create_group(&self, name: &str) -> Result<HostGroupStatus> {
        match self.create(json!({ "name": name })).await? {
            Mutation::Id(id) => Ok(HostGroupStatus::Created(id)),
            other => Err(ZbxError::InvalidField {
                field: "result",
                message: format!("expected one group id for {name}, got {other:?}"),
            }
            .into()),
        }
    }
}
