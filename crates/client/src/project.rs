use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{Error, PowermemoClient};

impl PowermemoClient {
    /// Check that the service is reachable and the key is accepted.
    ///
    /// Never fails: any error is logged and reported as `false`.
    pub async fn ping(&self) -> bool {
        match self.get("/healthcheck").await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "healthcheck failed");
                false
            }
        }
    }

    /// Fetch the project's profile configuration (YAML text).
    pub async fn get_config(&self) -> Result<String, Error> {
        let data = self.get("/project/profile_config").await?;
        Ok(data.str_field("profile_config")?.to_owned())
    }

    /// Replace the project's profile configuration.
    pub async fn update_config(&self, config: &str) -> Result<(), Error> {
        self.post_json("/project/profile_config", &json!({ "profile_config": config }))
            .await?;
        Ok(())
    }

    /// Fetch the project's billing and usage counters as returned by the
    /// service.
    pub async fn get_usage(&self) -> Result<Map<String, Value>, Error> {
        self.get("/project/billing").await?.into_map()
    }
}
