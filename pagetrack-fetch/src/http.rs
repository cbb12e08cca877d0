//! HTTP fetcher implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use pagetrack_core::constants::{DEFAULT_FETCH_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use pagetrack_core::env;
use pagetrack_core::error::{FetchErrorKind, Result, TrackerError};
use pagetrack_core::traits::Fetcher;
use pagetrack_core::types::{AccessKey, Content};

/// HTTP fetcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Fail on non-2xx responses instead of returning their body
    pub strict_http_errors: bool,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
            strict_http_errors: true,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl FetchConfig {
    /// Reads `PAGETRACK_TIMEOUT_SECONDS`, `PAGETRACK_STRICT_HTTP` and
    /// `PAGETRACK_USER_AGENT`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        env::load_dotenv();
        let defaults = Self::default();

        Ok(Self {
            timeout_seconds: env::var("PAGETRACK_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.timeout_seconds),
            strict_http_errors: env::flag("PAGETRACK_STRICT_HTTP")?
                .unwrap_or(defaults.strict_http_errors),
            user_agent: env::var("PAGETRACK_USER_AGENT")?.unwrap_or(defaults.user_agent),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Returns non-2xx bodies instead of failing.
    pub fn lenient(mut self) -> Self {
        self.strict_http_errors = false;
        self
    }
}

/// [`Fetcher`] that GETs the access key as a URL.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Creates a fetcher with the given config.
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        if config.timeout_seconds == 0 {
            return Err(TrackerError::ConfigError(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TrackerError::ConfigError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn parse_locator(&self, key: &AccessKey) -> Result<Url> {
        let url = Url::parse(key.as_str())
            .map_err(|e| TrackerError::fetch_failed(key.as_str(), FetchErrorKind::InvalidLocator, e))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(TrackerError::fetch_failed(
                key.as_str(),
                FetchErrorKind::InvalidLocator,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, key), fields(key = %key))]
    async fn fetch(&self, key: &AccessKey) -> Result<Content> {
        let url = self.parse_locator(key)?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(key, e))?;

        let status = response.status();
        if !status.is_success() {
            if self.config.strict_http_errors {
                return Err(TrackerError::fetch_failed(
                    key.as_str(),
                    FetchErrorKind::Status(status.as_u16()),
                    status.canonical_reason().unwrap_or("non-success status"),
                ));
            }
            warn!(status = status.as_u16(), "Returning body of non-success response");
        }

        let body = response.bytes().await.map_err(|e| {
            let kind = if e.is_timeout() {
                FetchErrorKind::Timeout
            } else {
                FetchErrorKind::Body
            };
            TrackerError::fetch_failed(key.as_str(), kind, e)
        })?;

        debug!(status = status.as_u16(), len = body.len(), "Fetched page");
        Ok(Content::from(body))
    }
}

fn classify(key: &AccessKey, e: reqwest::Error) -> TrackerError {
    let kind = if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_builder() {
        FetchErrorKind::InvalidLocator
    } else {
        FetchErrorKind::Transport
    };
    TrackerError::fetch_failed(key.as_str(), kind, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(url: String) -> AccessKey {
        AccessKey::new(url).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let content = fetcher.fetch(&key(format!("{}/page", server.uri()))).await.unwrap();
        assert_eq!(content.as_str().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let content = fetcher.fetch(&key(server.uri())).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_strict_mode_fails_on_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&key(server.uri())).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Status(404)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_strict_mode_server_error_is_recoverable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&key(server.uri())).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Status(503)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_lenient_mode_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops page"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_config(FetchConfig::default().lenient()).unwrap();
        let content = fetcher.fetch(&key(server.uri())).await.unwrap();
        assert_eq!(content.as_str().unwrap(), "oops page");
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = FetchConfig::default().with_timeout_seconds(1);
        let fetcher = HttpFetcher::with_config(config).unwrap();
        let err = fetcher.fetch(&key(server.uri())).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&key("http://127.0.0.1:1/".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Transport));
    }

    #[tokio::test]
    async fn test_invalid_locator() {
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&key("not a url".to_string())).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::InvalidLocator));

        let err = fetcher.fetch(&key("ftp://example.com/f".to_string())).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::InvalidLocator));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FetchConfig::default().with_timeout_seconds(0);
        assert!(matches!(
            HttpFetcher::with_config(config),
            Err(TrackerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = FetchConfig::default();
        assert!(config.strict_http_errors);
        assert_eq!(config.timeout_seconds, DEFAULT_FETCH_TIMEOUT_SECONDS);
        assert!(!config.lenient().strict_http_errors);
    }
}
