//! HTTP client construction and API error type

use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout (a stalled search counts as a failed query)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Endpoint and timeout settings for the API client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and host, without trailing slash
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.api_base.trim_end_matches('/'))
    }

    pub fn search_url(&self) -> String {
        format!(
            "{}/1.1/search/tweets.json",
            self.api_base.trim_end_matches('/')
        )
    }

    /// Build the pooled async client shared by all workers
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(8)
            .user_agent(concat!("tweetline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::from_reqwest(&e))
    }
}

/// Error from one API call
#[derive(Debug)]
pub enum ApiError {
    /// Transport failure or non-success status
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Body did not match the expected shape
    Decode(String),
    /// Request could not be built (bad base URL, ...)
    Request(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode(msg) => write!(f, "invalid response: {msg}"),
            Self::Request(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped so bearer-authenticated endpoints never reach logs.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: strip_url(e),
        }
    }

    /// 429: the window's rate limit is used up
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: Some(429),
                ..
            }
        )
    }

    /// 401/403: credentials rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: Some(401 | 403),
                ..
            }
        )
    }
}

fn strip_url(e: &reqwest::Error) -> String {
    let msg = e.to_string();
    match e.url() {
        Some(url) => msg.replace(url.as_str(), "<url>"),
        None => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> ApiError {
        ApiError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn endpoint_urls() {
        let config = ClientConfig {
            api_base: "http://localhost:8080/".into(),
            ..Default::default()
        };
        assert_eq!(config.token_url(), "http://localhost:8080/oauth2/token");
        assert_eq!(
            config.search_url(),
            "http://localhost:8080/1.1/search/tweets.json"
        );
    }

    #[test]
    fn default_points_at_twitter() {
        let config = ClientConfig::default();
        assert_eq!(config.token_url(), "https://api.twitter.com/oauth2/token");
    }

    #[test]
    fn rate_limit_classification() {
        assert!(http_err(429).is_rate_limited());
        assert!(!http_err(500).is_rate_limited());
        assert!(!ApiError::Decode("x".into()).is_rate_limited());
    }

    #[test]
    fn unauthorized_classification() {
        assert!(http_err(401).is_unauthorized());
        assert!(http_err(403).is_unauthorized());
        assert!(!http_err(404).is_unauthorized());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(429)), "HTTP 429: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = ApiError::Http {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: timeout");
    }

    #[test]
    fn display_decode() {
        let err = ApiError::Decode("missing field `statuses`".into());
        assert_eq!(format!("{err}"), "invalid response: missing field `statuses`");
    }
}
