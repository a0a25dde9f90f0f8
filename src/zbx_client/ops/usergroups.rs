use std::sync::Arc;

use serde_json::{Value, json};

use crate::Result;
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::USERGROUPS;
use crate::zbx_client::fields::parse_id;
use crate::zbx_client::session::Session;

use super::deref_resource;

/// Read-only access, the permission granted when none is given.
pub const PERMISSION_READ: u8 = 2;

#[derive(Clone)]
pub struct UserGroups(Resource);

deref_resource!(UserGroups);

impl UserGroups {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, USERGROUPS))
    }

    /// Replace the host group rights of a user group.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn set_permissions(
        &self,
        usrgrp_id: u64,
        hostgroup_ids: &[u64],
        permission: Option<u8>,
    ) -> Result<Option<u64>> {
        let permission = permission.unwrap_or(PERMISSION_READ);
        let rights: Vec<Value> = hostgroup_ids
            .iter()
            .map(|id| json!({ "permission": permission, "id": id.to_string() }))
            .collect();
        let result = self
            .session()
            .call(
                "usergroup.update",
                json!({ "usrgrpid": usrgrp_id.to_string(), "rights": rights }),
            )
            .await?;
        Ok(self.parse_mutation(result)?.id())
    }

    /// Set the members of each listed user group to `user_ids`.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn update_users(&self, usrgrp_ids: &[u64], user_ids: &[u64]) -> Result<Option<u64>> {
        let users: Vec<Value> = user_ids
            .iter()
            .map(|id| json!({ "userid": id.to_string() }))
            .collect();
        let groups: Vec<Value> = usrgrp_ids
            .iter()
            .map(|id| json!({ "usrgrpid": id.to_string(), "users": users }))
            .collect();
        let result: Value = self.session().call("usergroup.update", Value::Array(groups)).await?;
        Ok(result
            .get("usrgrpids")
            .and_then(Value::as_array)
            .and_then(|ids| ids.first())
            .and_then(parse_id))
    }
}
