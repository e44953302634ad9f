pub mod account;
pub mod gate;
pub mod http;
pub mod profile;
pub mod tasks;

pub use account::AccountClient;
pub use gate::AuthGate;
pub use http::{HttpClient, RequestOptions, ResponseBody};
pub use profile::ProfileClient;
pub use tasks::TasksClient;

use crate::config::TaskboardConfig;
use crate::error::ApiError;

/// Every resource client over one shared [`HttpClient`], built once at startup
/// and lent to the views.
#[derive(Clone)]
pub struct Api {
    pub http: HttpClient,
    pub account: AccountClient,
    pub tasks: TasksClient,
    pub profile: ProfileClient,
}

impl Api {
    pub fn new(config: &TaskboardConfig) -> Result<Self, ApiError> {
        let http = HttpClient::from_config(config)?;
        Ok(Self {
            account: AccountClient::new(http.clone())
                .with_reset_placement(config.reset_token_placement),
            tasks: TasksClient::new(http.clone()),
            profile: ProfileClient::new(http.clone()),
            http,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use wiremock::MockServer;

    /// A mock backend and an [`Api`] pointed at its `/api/v1`.
    pub async fn mock_api() -> (MockServer, Api) {
        let server = MockServer::start().await;
        let config = TaskboardConfig::with_base_url(format!("{}/api/v1", server.uri()));
        let api = Api::new(&config).unwrap();
        (server, api)
    }

    /// Requests the mock server saw for `method path`.
    pub async fn hits(server: &MockServer, method: &str, path: &str) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == method && r.url.path() == path)
            .count()
    }
}
