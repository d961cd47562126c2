//! Twitter search client (app-only auth)

use reqwest::Url;
use serde::Deserialize;
use tweetline_core::{RawItem, SearchQuery, SearchSource};

use crate::credentials::Credentials;
use crate::http::{ApiError, ClientConfig};
use crate::schema;

/// `oauth2/token` response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

/// Search source shared by every worker (wrap in `Arc`)
pub struct TwitterSearch {
    http: reqwest::Client,
    bearer: String,
    search_url: String,
}

impl std::fmt::Debug for TwitterSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSearch")
            .field("search_url", &self.search_url)
            .finish_non_exhaustive()
    }
}

impl TwitterSearch {
    /// Exchange the consumer credentials for a bearer token.
    ///
    /// Called once at startup; a failure here is fatal to the run.
    pub async fn connect(creds: &Credentials, config: &ClientConfig) -> Result<Self, ApiError> {
        let http = config.build_client()?;
        log::debug!("Requesting bearer token");

        let body = http
            .post(config.token_url())
            .basic_auth(&creds.consumer_key, Some(&creds.consumer_secret))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body("grant_type=client_credentials")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::from_reqwest(&e))?
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        let bearer = parse_token(&body)?;
        log::debug!("Bearer token acquired");
        Ok(Self::with_token(http, bearer, config))
    }

    /// Build a client around an already issued bearer token
    pub fn with_token(http: reqwest::Client, bearer: String, config: &ClientConfig) -> Self {
        Self {
            http,
            bearer,
            search_url: config.search_url(),
        }
    }

    /// Full search URL for one query
    pub fn search_request_url(&self, query: &SearchQuery) -> Result<Url, ApiError> {
        let mut params = vec![
            ("q", query.term.clone()),
            ("count", query.batch_size.to_string()),
            ("until", query.until.format("%Y-%m-%d").to_string()),
        ];
        if let Some(max_id) = query.max_id {
            params.push(("max_id", max_id.to_string()));
        }
        Url::parse_with_params(&self.search_url, &params)
            .map_err(|e| ApiError::Request(format!("{}: {e}", self.search_url)))
    }
}

impl SearchSource for TwitterSearch {
    type Error = ApiError;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>, ApiError> {
        let url = self.search_request_url(query)?;
        log::trace!("GET {url}");

        let body = self
            .http
            .get(url)
            .bearer_auth(&self.bearer)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                let err = ApiError::from_reqwest(&e);
                if err.is_rate_limited() {
                    log::warn!("Rate limit reached (until {})", query.until);
                } else if err.is_unauthorized() {
                    log::warn!("Bearer token rejected");
                }
                err
            })?
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        schema::parse_search(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn parse_token(body: &str) -> Result<String, ApiError> {
    let token: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("token response: {e}")))?;
    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Decode(format!(
            "unexpected token type {:?}",
            token.token_type
        )));
    }
    Ok(token.access_token)
}
