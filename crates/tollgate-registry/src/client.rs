use std::time::Duration;

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tollgate_config::RegistryConfig;
use url::Url;

use crate::error::RegistryError;
use crate::types::{CheckoutSession, CheckoutSessionRequest, ConnectionPage, ConnectionRecord, ConnectionSubscription, SubscriptionConfig};

/// Fixed page size for `GET /connections`
pub const PAGE_LIMIT: u32 = 100;

/// Async HTTP client for the connection registry
///
/// Every call is made exactly once. Failures carry the registry's status
/// and body text unchanged.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
    secret_key: SecretString,
}

impl RegistryClient {
    /// Create a new registry client
    ///
    /// Only the connect phase is bounded by `connect_timeout`; streamed
    /// forward responses may stay open for as long as the upstream sends.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: Url, secret_key: SecretString, connect_timeout: Duration) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(RegistryError::Request)?;

        Ok(Self {
            http,
            base_url,
            secret_key,
        })
    }

    /// Create a client from the `[registry]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::new(
            config.base_url.clone(),
            config.secret_key.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch one connection
    ///
    /// GET `/connections/:id`
    pub async fn get_connection(&self, connection_id: &str) -> Result<ConnectionRecord, RegistryError> {
        let url = self.endpoint(&["connections", connection_id])?;
        self.get_json(url).await
    }

    /// Fetch the subscription attached to a connection
    ///
    /// GET `/connections/:id/subscription`
    pub async fn get_connection_subscription(
        &self,
        connection_id: &str,
    ) -> Result<ConnectionSubscription, RegistryError> {
        let url = self.endpoint(&["connections", connection_id, "subscription"])?;
        self.get_json(url).await
    }

    /// Fetch a subscription configuration
    ///
    /// GET `/subscription_configs/:id`
    pub async fn get_subscription_config(
        &self,
        subscription_config_id: &str,
    ) -> Result<SubscriptionConfig, RegistryError> {
        let url = self.endpoint(&["subscription_configs", subscription_config_id])?;
        self.get_json(url).await
    }

    /// Fetch one page of connections, newest pages first
    ///
    /// GET `/connections?limit=100&cursor=:cursor`
    pub async fn list_connections(&self, cursor: Option<&str>) -> Result<ConnectionPage, RegistryError> {
        let mut url = self.endpoint(&["connections"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_LIMIT.to_string());
            if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
                query.append_pair("cursor", cursor);
            }
        }

        self.get_json(url).await
    }

    /// Create a hosted checkout session
    ///
    /// POST `/checkout_sessions`
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, RegistryError> {
        let url = self.endpoint(&["checkout_sessions"])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(request)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Send a metered request through the registry's forward endpoint
    ///
    /// POST `/forward?u=:target` with `bearer` as the credential. The
    /// response is returned whatever its status so the caller can relay it.
    pub async fn forward(&self, bearer: &str, target: &str, body: Bytes) -> Result<reqwest::Response, RegistryError> {
        let mut url = self.endpoint(&["forward"])?;
        url.query_pairs_mut().append_pair("u", target);

        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        Ok(response)
    }

    /// Build a URL under the base URL, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .header(http::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RegistryError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
