//! Object types whose API surface goes beyond the generic protocol.

/// Expose the generic protocol of the wrapped [`Resource`](super::Resource).
macro_rules! deref_resource {
    ($ty:ident) => {
        impl std::ops::Deref for $ty {
            type Target = $crate::zbx_client::Resource;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

pub(crate) use deref_resource;

mod hostgroups;
mod hosts;
mod problems;
mod proxies;
mod triggers;
mod usergroups;

pub use hostgroups::HostGroups;
pub use hosts::Hosts;
pub use problems::{ProblemFilter, Problems, TagFilter, TagOperator};
pub use proxies::Proxies;
pub use triggers::Triggers;
pub use usergroups::{PERMISSION_READ, UserGroups};
