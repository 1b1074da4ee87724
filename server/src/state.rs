use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::store::Store;

/// Shared by every handler: the store picked at startup, the configuration
/// and the HTTP client used by the external users passthrough.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.external_timeout_secs))
            .build()?;

        Ok(AppState {
            store,
            config: Arc::new(config),
            http,
        })
    }
}
