//! Session-aware client for the temperature backend
//!
//! Every request carries `Authorization: Bearer <token>` when the session
//! store holds a token at the moment the request is issued. A `401` from the
//! backend ends the local session before the caller sees
//! [`WoodstoveError::SessionExpired`]; every other failure leaves the session
//! alone.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Result, WoodstoveError};
use crate::session::SessionStore;

pub mod types;

pub use types::{
    ReadingQuery, Sensor, StatsPeriod, StatsQuery, TemperatureReading, TemperatureRequest,
    TemperatureStats,
};

/// Message carried by [`WoodstoveError::SessionExpired`].
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP client bound to a base URL and a session store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use url::Url;
/// use woodstove::api::ApiClient;
/// use woodstove::session::SessionStore;
/// use woodstove::storage::MemoryStorage;
///
/// let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
/// let client = ApiClient::new(Url::parse("http://localhost:8080/api").unwrap(), session);
/// assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/");
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: Arc<SessionStore>,
    sensor_api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Url, session: Arc<SessionStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: with_trailing_slash(base_url),
            session,
            sensor_api_key: None,
        }
    }

    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::Config`] for an unparsable base URL or if
    /// the HTTP client cannot be constructed.
    pub fn from_config(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            WoodstoveError::Config(format!("Invalid api.base_url {}: {}", config.base_url, e))
        })?;

        let mut builder =
            Client::builder().user_agent(concat!("woodstove/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let http = builder
            .build()
            .map_err(|e| WoodstoveError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(base_url = %base_url, "initialized api client");

        let mut client = Self::new(base_url, session).with_http_client(http);
        client.sensor_api_key = config.sensor_api_key.clone();
        Ok(client)
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Sends `key` as `X-API-Key` on [`post_temperature`](Self::post_temperature).
    pub fn with_sensor_api_key(mut self, key: impl Into<String>) -> Self {
        self.sensor_api_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /temperatures`
    pub async fn post_temperature(
        &self,
        request: &TemperatureRequest,
    ) -> std::result::Result<TemperatureReading, WoodstoveError> {
        let mut builder = self.request(Method::POST, "temperatures")?.json(request);
        if let Some(key) = &self.sensor_api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        self.execute(builder).await
    }

    /// `GET /temperatures`
    pub async fn list_temperatures(
        &self,
        query: &ReadingQuery,
    ) -> std::result::Result<Vec<TemperatureReading>, WoodstoveError> {
        let builder = self.request(Method::GET, "temperatures")?.query(query);
        self.execute(builder).await
    }

    /// `GET /temperatures/stats`
    pub async fn get_stats(
        &self,
        query: &StatsQuery,
    ) -> std::result::Result<TemperatureStats, WoodstoveError> {
        let builder = self.request(Method::GET, "temperatures/stats")?.query(query);
        self.execute(builder).await
    }

    /// `GET /sensors`
    pub async fn list_sensors(&self) -> std::result::Result<Vec<Sensor>, WoodstoveError> {
        let builder = self.request(Method::GET, "sensors")?;
        self.execute(builder).await
    }

    /// Starts a request, attaching the bearer token held right now.
    fn request(
        &self,
        method: Method,
        path: &str,
    ) -> std::result::Result<RequestBuilder, WoodstoveError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| WoodstoveError::Config(format!("Invalid endpoint {}: {}", path, e)))?;

        let token = self.session.get_token().filter(|token| !token.is_empty());
        tracing::debug!(%method, %url, authenticated = token.is_some(), "api request");

        let builder = self.http.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> std::result::Result<T, WoodstoveError> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("api request failed: {}", e);
            WoodstoveError::Http(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected credentials; signing out");
            self.session.logout();
            return Err(WoodstoveError::SessionExpired(
                SESSION_EXPIRED_MESSAGE.to_string(),
            ));
        }
        if !status.is_success() {
            tracing::error!("backend returned {}", status);
            return Err(WoodstoveError::RequestFailed {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn client(base: &str) -> ApiClient {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        ApiClient::new(Url::parse(base).unwrap(), session)
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        assert_eq!(
            client("http://localhost:8080/api").base_url().as_str(),
            "http://localhost:8080/api/"
        );
        assert_eq!(
            client("http://localhost:8080/api/").base_url().as_str(),
            "http://localhost:8080/api/"
        );
    }

    #[test]
    fn test_endpoints_resolve_under_base_path() {
        let client = client("http://localhost:8080/api");
        let request = client
            .request(Method::GET, "temperatures/stats")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/api/temperatures/stats"
        );
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_from_config_rejects_bad_base_url() {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        let config = ApiConfig {
            base_url: "::nope".to_string(),
            ..ApiConfig::default()
        };
        assert!(ApiClient::from_config(&config, session).is_err());
    }

    #[test]
    fn test_from_config_carries_api_key() {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        let config = ApiConfig {
            sensor_api_key: Some("k".to_string()),
            timeout_seconds: Some(5),
            ..ApiConfig::default()
        };
        let client = ApiClient::from_config(&config, session).unwrap();
        assert_eq!(client.sensor_api_key.as_deref(), Some("k"));
    }
}
