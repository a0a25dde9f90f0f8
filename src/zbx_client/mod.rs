//! JSON-RPC client for the Zabbix API.

mod client;
pub mod descriptor;
pub mod fields;
pub mod models;
pub mod ops;
mod options;
mod resource;
pub(crate) mod rpc;
pub mod session;
mod transport;

pub use client::ZbxClient;
pub use descriptor::ResourceDescriptor;
pub use fields::Fields;
pub use models::{ApiVersion, HostGroupOutcome, HostGroupStatus, Mutation, Problem, SafeUpdate};
pub use ops::{
    HostGroups, Hosts, ProblemFilter, Problems, Proxies, TagFilter, TagOperator, Triggers,
    UserGroups,
};
pub use options::{ConnectOptions, DEFAULT_TIMEOUT};
pub use resource::Resource;
pub use session::Session;
pub use transport::{HttpTransport, Transport};
