use std::time::Duration;

use crate::zbx_client::DEFAULT_TIMEOUT;

pub(super) const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

pub(super) const fn default_tls_verify() -> bool {
    false
}
