use std::sync::Arc;

use serde_json::json;

use crate::Result;
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::HOSTS;
use crate::zbx_client::fields::{Fields, parse_id};
use crate::zbx_client::resource::id_list;
use crate::zbx_client::session::Session;

use super::deref_resource;

#[derive(Clone)]
pub struct Hosts(Resource);

deref_resource!(Hosts);

impl Hosts {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, HOSTS))
    }

    /// Unlink templates from hosts without clearing the items they brought.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn unlink_templates(&self, host_ids: &[u64], template_ids: &[u64]) -> Result<bool> {
        let result: Fields = self
            .session()
            .call(
                "host.massRemove",
                json!({
                    "hostids": id_list(host_ids),
                    "templateids": id_list(template_ids),
                }),
            )
            .await?;
        Ok(result
            .get("hostids")
            .and_then(|ids| ids.as_array())
            .is_some_and(|ids| !ids.is_empty()))
    }

    /// First interface of a host, if it has any.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn get_interface_id(&self, host_id: u64) -> Result<Option<u64>> {
        let rows: Vec<Fields> = self
            .session()
            .call(
                "hostinterface.get",
                json!({
                    "output": ["interfaceid"],
                    "hostids": [host_id.to_string()],
                }),
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("interfaceid"))
            .and_then(parse_id))
    }
}
