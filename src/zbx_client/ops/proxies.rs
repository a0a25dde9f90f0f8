use std::sync::Arc;

use crate::Result;
use crate::zbx_client::Resource;
use crate::zbx_client::descriptor::PROXIES;
use crate::zbx_client::fields::{Fields, parse_id};
use crate::zbx_client::resource::id_list;
use crate::zbx_client::session::Session;

use super::deref_resource;

#[derive(Clone)]
pub struct Proxies(Resource);

deref_resource!(Proxies);

impl Proxies {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self(Resource::new(session, PROXIES))
    }

    /// Delete proxies and return the first deleted id, `None` when the server
    /// reports nothing deleted.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn delete(&self, ids: &[u64]) -> Result<Option<u64>> {
        let result: Fields = self.session().call("proxy.delete", id_list(ids)).await?;
        Ok(result
            .get("proxyids")
            .and_then(|ids| ids.as_array())
            .and_then(|ids| ids.first())
            .and_then(parse_id))
    }
}
