use std::time::Duration;

use anyhow::anyhow;

use crate::api::SortMode;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    /// Number of top-level comments per page, fixed for the whole session
    pub page_size: u32,

    /// Bound on each page fetch, after which the pager errors out
    pub request_timeout: Duration,

    pub initial_sort: SortMode,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            page_size: 10,
            request_timeout: Duration::from_secs(10),
            initial_sort: SortMode::Newest,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 {
            return Err(anyhow!("page size must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must not be zero"));
        }
        Ok(())
    }
}
