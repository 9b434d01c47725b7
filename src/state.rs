use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Request-independent context, built once in `main` and cloned cheaply into
/// each handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: UpstreamClient,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(config.upstream_url.clone(), config.upstream_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            upstream,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
