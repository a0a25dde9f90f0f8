use std::sync::Arc;

use serde_json::Value;

use crate::Result;

use super::Resource;
use super::descriptor::{
    ACTIONS, ITEMS, MAINTENANCE, MEDIATYPES, ResourceDescriptor, TEMPLATES, USERS,
};
use super::models::ApiVersion;
use super::ops::{HostGroups, Hosts, Problems, Proxies, Triggers, UserGroups};
use super::options::ConnectOptions;
use super::session::Session;
use super::transport::Transport;

/// Entry point: one logged-in session plus a handle per object type.
///
/// Every handle shares the same session, so cloning the client or any
/// handle is cheap.
#[derive(Clone)]
pub struct ZbxClient {
    session: Arc<Session>,
    actions: Resource,
    hostgroups: HostGroups,
    hosts: Hosts,
    items: Resource,
    maintenance: Resource,
    mediatypes: Resource,
    problems: Problems,
    proxies: Proxies,
    templates: Resource,
    triggers: Triggers,
    usergroups: UserGroups,
    users: Resource,
}

impl ZbxClient {
    /// Connect over HTTP(S), check the API version and log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, the server is
    /// unreachable, the version is unsupported without `ignore_version`, or
    /// the login is refused.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let session = Session::connect(options).await?;
        Ok(Self::from_session(Arc::new(session)))
    }

    /// Like [`ZbxClient::connect`], over any [`Transport`].
    ///
    /// # Errors
    ///
    /// See [`ZbxClient::connect`].
    pub async fn connect_with_transport(
        transport: Arc<dyn Transport>,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let session = Session::connect_with(transport, options).await?;
        Ok(Self::from_session(Arc::new(session)))
    }

    fn from_session(session: Arc<Session>) -> Self {
        let resource = |descriptor| Resource::new(Arc::clone(&session), descriptor);
        Self {
            actions: resource(ACTIONS),
            items: resource(ITEMS),
            maintenance: resource(MAINTENANCE),
            mediatypes: resource(MEDIATYPES),
            templates: resource(TEMPLATES),
            users: resource(USERS),
            hostgroups: HostGroups::new(Arc::clone(&session)),
            hosts: Hosts::new(Arc::clone(&session)),
            problems: Problems::new(Arc::clone(&session)),
            proxies: Proxies::new(Arc::clone(&session)),
            triggers: Triggers::new(Arc::clone(&session)),
            usergroups: UserGroups::new(Arc::clone(&session)),
            session,
        }
    }

    /// Query `apiinfo.version` again.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn api_version(&self) -> Result<String> {
        self.session.api_version().await
    }

    /// Version negotiated at connect time.
    #[must_use]
    pub fn version(&self) -> Option<ApiVersion> {
        self.session.version()
    }

    /// Call any API method with the session token attached.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn query(&self, method: &str, params: Value) -> Result<Value> {
        self.session.query(method, params).await
    }

    /// Generic handle for an object type without a built-in accessor.
    #[must_use]
    pub fn resource(&self, descriptor: ResourceDescriptor) -> Resource {
        Resource::new(Arc::clone(&self.session), descriptor)
    }

    #[must_use]
    pub const fn actions(&self) -> &Resource {
        &self.actions
    }

    #[must_use]
    pub const fn hostgroups(&self) -> &HostGroups {
        &self.hostgroups
    }

    #[must_use]
    pub const fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    #[must_use]
    pub const fn items(&self) -> &Resource {
        &self.items
    }

    #[must_use]
    pub const fn maintenance(&self) -> &Resource {
        &self.maintenance
    }

    #[must_use]
    pub const fn mediatypes(&self) -> &Resource {
        &self.mediatypes
    }

    #[must_use]
    pub const fn problems(&self) -> &Problems {
        &self.problems
    }

    #[must_use]
    pub const fn proxies(&self) -> &Proxies {
        &self.proxies
    }

    #[must_use]
    pub const fn templates(&self) -> &Resource {
        &self.templates
    }

    #[must_use]
    pub const fn triggers(&self) -> &Triggers {
        &self.triggers
    }

    #[must_use]
    pub const fn usergroups(&self) -> &UserGroups {
        &self.usergroups
    }

    #[must_use]
    pub const fn users(&self) -> &Resource {
        &self.users
    }

    /// Invalidate the session token. The client is consumed; handles cloned
    /// from it keep the dead token and fail on their next call.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn logout(self) -> Result<bool> {
        self.session.logout().await
    }
}
