use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::RedditError;
use super::types::{
    ApiJsonResponse, Item, Listing, MeResponse, RawListing, RawThing, TokenResponse,
    VoteDirection,
};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Tokens are refreshed this long before Reddit says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The social-platform operations the bot loop depends on.
pub trait Platform {
    /// Fetch up to `limit` candidate items from a subreddit listing.
    async fn fetch(
        &self,
        subreddit: &str,
        listing: Listing,
        limit: u32,
    ) -> Result<Vec<Item>, RedditError>;

    /// Post `body` as a reply to `item`.
    async fn reply(&self, item: &Item, body: &str) -> Result<(), RedditError>;

    /// Cast a vote on `item`.
    async fn vote(&self, item: &Item, direction: VoteDirection) -> Result<(), RedditError>;
}

/// Script-app credentials for the password grant.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    credentials: RedditCredentials,
    client: Client,
    auth_url: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, RedditError> {
        Self::with_base_urls(credentials, AUTH_URL.to_string(), API_BASE.to_string())
    }

    /// Create a client pointing at custom endpoints (useful for testing).
    pub fn with_base_urls(
        credentials: RedditCredentials,
        auth_url: String,
        api_base: String,
    ) -> Result<Self, RedditError> {
        let client = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            credentials,
            client,
            auth_url,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Name of the authenticated account. Used to verify login at startup.
    pub async fn whoami(&self) -> Result<String, RedditError> {
        let req = self.client.get(format!("{}/api/v1/me", self.api_base));
        let me = self.send(req).await?.json::<MeResponse>().await?;
        Ok(me.name)
    }

    async fn access_token(&self) -> Result<String, RedditError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("requesting reddit access token");
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RedditError::RateLimited {
                retry_after_secs: retry_after_secs(&response),
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RedditError::Auth(format!("HTTP {}: {message}", status.as_u16())));
        }

        // Bad credentials come back as 200 with an "error" field.
        let body: serde_json::Value = response.json().await?;
        if let Some(error) = body.get("error") {
            return Err(RedditError::Auth(error.to_string()));
        }
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| RedditError::Auth(format!("malformed token response: {e}")))?;

        let value = token.access_token.clone();
        *guard = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    /// Authenticate and send `req`, mapping error statuses.
    async fn send(&self, req: RequestBuilder) -> Result<Response, RedditError> {
        let token = self.access_token().await?;
        let response = req.bearer_auth(token).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RedditError::RateLimited {
                retry_after_secs: retry_after_secs(&response),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RedditError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    ["retry-after", "x-ratelimit-reset"]
        .iter()
        .find_map(|name| {
            response
                .headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
        })
        .map(|secs| secs.ceil() as u64)
        .unwrap_or(60)
}

impl Platform for RedditClient {
    async fn fetch(
        &self,
        subreddit: &str,
        listing: Listing,
        limit: u32,
    ) -> Result<Vec<Item>, RedditError> {
        let req = self
            .client
            .get(format!(
                "{}/r/{subreddit}/{}",
                self.api_base,
                listing.path_segment()
            ))
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())]);
        let listing = self.send(req).await?.json::<RawListing>().await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(RawThing::into_item)
            .take(limit as usize)
            .collect())
    }

    async fn reply(&self, item: &Item, body: &str) -> Result<(), RedditError> {
        let fullname = item.fullname();
        let req = self
            .client
            .post(format!("{}/api/comment", self.api_base))
            .form(&[
                ("api_type", "json"),
                ("thing_id", fullname.as_str()),
                ("text", body),
            ]);
        let response = self.send(req).await?.json::<ApiJsonResponse>().await?;

        let errors = response.json.error_entries();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RedditError::Api { errors })
        }
    }

    async fn vote(&self, item: &Item, direction: VoteDirection) -> Result<(), RedditError> {
        let fullname = item.fullname();
        let req = self
            .client
            .post(format!("{}/api/vote", self.api_base))
            .form(&[("id", fullname.as_str()), ("dir", direction.as_param())]);
        self.send(req).await?;
        Ok(())
    }
}
